//! Deterministic per-item cost estimation.
//!
//! Prices are simulated: a base range keyed by `(category, tier)` is sampled
//! with a generator seeded from a hash of the item identity, so the same item
//! always prices the same within a process. A location multiplier nudges
//! well-known high-cost and budget markets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Markets priced above baseline, matched by substring on the lowercased
/// location.
const HIGH_COST_LOCATIONS: &[&str] = &[
    "san francisco",
    "sf",
    "new york",
    "nyc",
    "los angeles",
    "la",
    "seattle",
    "boston",
    "miami",
    "chicago",
    "washington dc",
    "hawaii",
];

/// Markets priced below baseline.
const BUDGET_LOCATIONS: &[&str] = &["austin", "denver", "portland", "phoenix", "dallas", "atlanta"];

const HIGH_COST_MULTIPLIER: f64 = 1.15;
const BUDGET_MULTIPLIER: f64 = 0.90;

/// Category of a priced item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Restaurant,
    Hotel,
    Activity,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ItemCategory::Restaurant => "restaurant",
            ItemCategory::Hotel => "hotel",
            ItemCategory::Activity => "activity",
        };
        f.write_str(value)
    }
}

impl std::str::FromStr for ItemCategory {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "restaurant" => Ok(ItemCategory::Restaurant),
            "hotel" => Ok(ItemCategory::Hotel),
            "activity" => Ok(ItemCategory::Activity),
            other => Err(crate::Error::invalid_argument(
                "category",
                format!("unknown category '{other}', expected restaurant, hotel, or activity"),
            )),
        }
    }
}

/// Coarse price indicator parsed from a `$`-symbol tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    /// Only meaningful for activities.
    Free,
    One,
    Two,
    Three,
    Four,
}

impl PriceTier {
    /// Parse a tier symbol. Unrecognized symbols default to the mid tier;
    /// `Free` is honored for activities only.
    pub fn parse(symbol: &str, category: ItemCategory) -> Self {
        match symbol.trim() {
            "$" => PriceTier::One,
            "$$" => PriceTier::Two,
            "$$$" => PriceTier::Three,
            "$$$$" => PriceTier::Four,
            s if s.eq_ignore_ascii_case("free") && category == ItemCategory::Activity => {
                PriceTier::Free
            }
            _ => PriceTier::Two,
        }
    }
}

/// Result of a cost estimation, in whole US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub per_unit: u32,
    pub total: u32,
}

/// Deterministic pricing simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostEstimator;

impl CostEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate a per-unit and total cost for an item.
    ///
    /// `quantity` is the guest count for restaurants and activities, or
    /// `rooms * nights` for hotels. Repeated calls with the same identity
    /// return the same per-unit price.
    pub fn estimate(
        &self,
        identity: &str,
        category: ItemCategory,
        tier_symbol: &str,
        location: &str,
        quantity: u32,
    ) -> CostEstimate {
        let tier = PriceTier::parse(tier_symbol, category);
        let (min, max) = tier_range(category, tier);

        let base = if min == max {
            min
        } else {
            let mut rng = StdRng::seed_from_u64(seed_from_identity(identity));
            rng.gen_range(min..=max)
        };

        let per_unit = (base as f64 * location_multiplier(location)).round() as u32;

        CostEstimate {
            per_unit,
            total: per_unit * quantity,
        }
    }
}

/// Per-tier base ranges in USD: per person for restaurants and activities,
/// per night per room for hotels.
fn tier_range(category: ItemCategory, tier: PriceTier) -> (u32, u32) {
    match category {
        ItemCategory::Restaurant => match tier {
            PriceTier::Free | PriceTier::One => (8, 15),
            PriceTier::Two => (16, 30),
            PriceTier::Three => (31, 60),
            PriceTier::Four => (61, 150),
        },
        ItemCategory::Hotel => match tier {
            PriceTier::Free | PriceTier::One => (60, 120),
            PriceTier::Two => (121, 250),
            PriceTier::Three => (251, 450),
            PriceTier::Four => (451, 800),
        },
        ItemCategory::Activity => match tier {
            PriceTier::Free => (0, 0),
            PriceTier::One => (10, 25),
            PriceTier::Two => (26, 75),
            PriceTier::Three => (76, 200),
            PriceTier::Four => (150, 350),
        },
    }
}

fn location_multiplier(location: &str) -> f64 {
    let needle = location.trim().to_lowercase();
    if needle.is_empty() {
        return 1.0;
    }
    if HIGH_COST_LOCATIONS.iter().any(|city| needle.contains(city)) {
        HIGH_COST_MULTIPLIER
    } else if BUDGET_LOCATIONS.iter().any(|city| needle.contains(city)) {
        BUDGET_MULTIPLIER
    } else {
        1.0
    }
}

/// Derive an RNG seed from the first eight bytes of SHA-256(identity).
fn seed_from_identity(identity: &str) -> u64 {
    let digest = Sha256::digest(identity.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
