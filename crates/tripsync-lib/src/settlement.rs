//! Settlement support: vendor receiving identity and USD → SOL conversion.
//!
//! The receiving address is bootstrapped once at process start and served
//! read-only; signing happens entirely in the external wallet collaborator.

use serde::Serialize;
use tracing::warn;

/// Used when the live price feed is unavailable.
pub const FALLBACK_SOL_PRICE_USD: f64 = 200.0;

/// Placeholder devnet receiving address used when none is configured.
pub const DEFAULT_SETTLEMENT_ADDRESS: &str = "TripSyncDemoVendor1111111111111111111111111";

const PRICE_FEED_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const PRICE_FEED_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// The vendor's receiving identity for settlement requests.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementIdentity {
    address: String,
}

impl SettlementIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Read the address from `SETTLEMENT_ADDRESS`, falling back to the
    /// documented devnet placeholder.
    pub fn from_env() -> Self {
        match std::env::var("SETTLEMENT_ADDRESS") {
            Ok(address) if !address.trim().is_empty() => Self::new(address),
            _ => {
                warn!("SETTLEMENT_ADDRESS not set, using devnet placeholder address");
                Self::new(DEFAULT_SETTLEMENT_ADDRESS)
            }
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Fetch the current SOL price in USD.
///
/// Single attempt with a bounded timeout; any failure returns the documented
/// fallback price so settlement display never blocks on the feed.
pub async fn sol_price_usd(client: &reqwest::Client) -> f64 {
    let request = client
        .get(PRICE_FEED_URL)
        .query(&[("ids", "solana"), ("vs_currencies", "usd")])
        .timeout(PRICE_FEED_TIMEOUT);

    let price = async {
        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;
        body.get("solana")?.get("usd")?.as_f64()
    }
    .await;

    match price {
        Some(price) if price > 0.0 => price,
        _ => {
            warn!(
                fallback_usd = FALLBACK_SOL_PRICE_USD,
                "SOL price feed unavailable, using fallback price"
            );
            FALLBACK_SOL_PRICE_USD
        }
    }
}

/// Convert a USD amount to SOL at the given price.
pub fn usd_to_sol(amount_usd: f64, sol_price_usd: f64) -> f64 {
    if sol_price_usd <= 0.0 {
        return 0.0;
    }
    amount_usd / sol_price_usd
}
