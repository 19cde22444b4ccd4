//! Payment quote/confirm state machine.
//!
//! A quote splits costs into paid-now (hotels + activities, settled through
//! the external wallet) and pay-later (restaurants, settled at the venue).
//! The settlement amount is a fixed demo unit independent of the estimated
//! USD total. Confirmation publishes a bare `PAYMENT_EXECUTE` trigger; this
//! module never custodies end-user funds or signs anything.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::broadcast::{Envelope, SyncBroadcaster};
use crate::error::{Error, Result};

/// Fixed demo settlement amount in SOL, independent of the quoted total.
pub const SETTLEMENT_AMOUNT_SOL: f64 = 0.1;

/// Lifecycle of a payment session. Transitions move forward only, except
/// that a new quote overwrites any prior quote and returns to `Quoted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    None,
    Quoted,
    Confirmed,
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PaymentState::None => "none",
            PaymentState::Quoted => "quoted",
            PaymentState::Confirmed => "confirmed",
        };
        f.write_str(value)
    }
}

/// Per-category USD breakdown of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub hotels: f64,
    pub activities: f64,
    pub restaurants: f64,
}

/// A computed, unsettled cost breakdown awaiting confirmation.
///
/// Serialized as the `PAYMENT_QUOTE` envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub paid_now_usd: f64,
    pub pay_later_usd: f64,
    pub estimated_total_usd: f64,
    pub breakdown: QuoteBreakdown,
    pub amount_sol: f64,
    pub item_description: String,
    pub is_demo: bool,
}

#[derive(Debug, Default)]
struct PaymentSession {
    state: PaymentState,
    quote: Option<Quote>,
}

/// Quote/confirm coordinator, one per conversation session.
///
/// State is guarded by a mutex: concurrent `confirm` calls racing a
/// transition are not linearizable but can not corrupt the session.
pub struct PaymentCoordinator {
    session: Mutex<PaymentSession>,
    broadcaster: Arc<SyncBroadcaster>,
}

impl PaymentCoordinator {
    pub fn new(broadcaster: Arc<SyncBroadcaster>) -> Self {
        Self {
            session: Mutex::new(PaymentSession::default()),
            broadcaster,
        }
    }

    /// Compute a quote and transition to `Quoted`.
    ///
    /// Valid from any state; an existing quote is overwritten with no
    /// history kept. Publishes a `PAYMENT_QUOTE` envelope best-effort.
    pub async fn quote(
        &self,
        hotel_cost: f64,
        activities_cost: f64,
        restaurant_cost: f64,
        description: &str,
    ) -> Quote {
        let paid_now = hotel_cost + activities_cost;
        let pay_later = restaurant_cost;

        let quote = Quote {
            paid_now_usd: paid_now,
            pay_later_usd: pay_later,
            estimated_total_usd: paid_now + pay_later,
            breakdown: QuoteBreakdown {
                hotels: hotel_cost,
                activities: activities_cost,
                restaurants: restaurant_cost,
            },
            amount_sol: SETTLEMENT_AMOUNT_SOL,
            item_description: description.to_string(),
            is_demo: true,
        };

        {
            let mut session = self.lock_session();
            session.state = PaymentState::Quoted;
            session.quote = Some(quote.clone());
        }

        info!(
            paid_now_usd = paid_now,
            pay_later_usd = pay_later,
            amount_sol = SETTLEMENT_AMOUNT_SOL,
            "payment quoted"
        );

        self.broadcaster
            .publish(Envelope::PaymentQuote {
                quote: quote.clone(),
            })
            .await;

        quote
    }

    /// Confirm the pending quote and transition to `Confirmed`.
    ///
    /// Valid only from `Quoted`; any other state returns a payment-state
    /// error with no state change and no broadcast. On success a bare
    /// `PAYMENT_EXECUTE` envelope asks the external signer to settle.
    pub async fn confirm(&self) -> Result<Quote> {
        let quote = {
            let mut session = self.lock_session();
            match session.state {
                PaymentState::Quoted => {
                    session.state = PaymentState::Confirmed;
                    session.quote.clone()
                }
                state => {
                    return Err(Error::PaymentState {
                        state,
                        reason: "confirm requires a pending quote".to_string(),
                    });
                }
            }
        };

        info!("payment confirmed, requesting settlement");
        self.broadcaster.publish(Envelope::PaymentExecute).await;

        // The quote is always present in the Quoted state; fall back to a
        // zero quote rather than panicking if the invariant is ever broken.
        Ok(quote.unwrap_or_else(|| Quote {
            paid_now_usd: 0.0,
            pay_later_usd: 0.0,
            estimated_total_usd: 0.0,
            breakdown: QuoteBreakdown {
                hotels: 0.0,
                activities: 0.0,
                restaurants: 0.0,
            },
            amount_sol: SETTLEMENT_AMOUNT_SOL,
            item_description: String::new(),
            is_demo: true,
        }))
    }

    /// Current session state.
    pub fn state(&self) -> PaymentState {
        self.lock_session().state
    }

    /// The pending or confirmed quote, if any.
    pub fn current_quote(&self) -> Option<Quote> {
        self.lock_session().quote.clone()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, PaymentSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PaymentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCoordinator")
            .field("state", &self.state())
            .finish()
    }
}
