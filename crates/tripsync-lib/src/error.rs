use thiserror::Error;

use crate::payment::PaymentState;

/// Convenient result alias for the TripSync library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Provider faults (geocoding, directions) are recoverable by design: callers
/// fall back to a degraded-but-valid result instead of surfacing these to the
/// conversation. Validation and payment-state errors are returned to the tool
/// boundary as structured results.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was missing or malformed.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Raised when a payment transition is attempted from the wrong state.
    #[error("invalid payment transition from {state}: {reason}")]
    PaymentState {
        state: PaymentState,
        reason: String,
    },

    /// The directions provider returned an error status or unusable geometry.
    #[error("directions provider failed: {message}")]
    DirectionsProvider { message: String },

    /// The geocoding provider returned an error status or unusable body.
    #[error("geocoding provider failed: {message}")]
    GeocodingProvider { message: String },

    /// An external provider call exceeded its deadline.
    #[error("provider call timed out after {timeout_ms}ms")]
    ProviderTimeout { timeout_ms: u64 },

    /// The broadcast transport rejected an envelope. Callers log and continue.
    #[error("broadcast transport failed: {message}")]
    BroadcastTransport { message: String },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a missing-or-malformed argument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
