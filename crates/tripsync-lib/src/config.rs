//! Engine configuration, read once at startup and passed into
//! [`crate::TripContext`]. No component reads the environment after
//! construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::geocode::FALLBACK_COORDINATE;

/// Configuration for the trip-planning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Forward-geocoding endpoint. `None` selects the built-in gazetteer.
    pub geocoder_url: Option<String>,

    /// Directions API base URL. `None` disables the provider, so every
    /// route uses the interpolation fallback.
    pub directions_url: Option<String>,

    /// Access token appended to directions requests, if the provider
    /// requires one.
    pub directions_token: Option<String>,

    /// Deadline for each external provider call.
    #[serde(with = "duration_ms")]
    pub provider_timeout: Duration,

    /// Coordinate returned for unresolvable place names.
    pub fallback_coordinate: Coordinate,

    /// Capacity of the in-process broadcast channel.
    pub broadcast_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geocoder_url: None,
            directions_url: None,
            directions_token: None,
            provider_timeout: Duration::from_millis(5000),
            fallback_coordinate: FALLBACK_COORDINATE,
            broadcast_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// - `GEOCODER_URL`: forward geocoding endpoint (optional)
    /// - `DIRECTIONS_URL`: directions API base URL (optional)
    /// - `DIRECTIONS_TOKEN`: directions API access token (optional)
    /// - `PROVIDER_TIMEOUT_MS`: provider deadline in milliseconds (default: 5000)
    /// - `BROADCAST_CAPACITY`: broadcast channel capacity (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_ms = std::env::var("PROVIDER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.provider_timeout.as_millis() as u64);

        let broadcast_capacity = std::env::var("BROADCAST_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&capacity| capacity > 0)
            .unwrap_or(defaults.broadcast_capacity);

        Self {
            geocoder_url: non_empty_var("GEOCODER_URL"),
            directions_url: non_empty_var("DIRECTIONS_URL"),
            directions_token: non_empty_var("DIRECTIONS_TOKEN"),
            provider_timeout: Duration::from_millis(timeout_ms),
            fallback_coordinate: defaults.fallback_coordinate,
            broadcast_capacity,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
