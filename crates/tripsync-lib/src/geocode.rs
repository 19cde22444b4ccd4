//! Location resolution with a shared cache and degraded fallback.
//!
//! [`LocationResolver`] turns free-text place names into coordinates. Cache
//! hits return immediately; misses call the configured [`Geocoder`] under a
//! bounded timeout. Any provider failure (timeout, error status, empty result
//! set) yields the documented fallback coordinate with `degraded = true` —
//! resolution never errors, so a bad place name can not abort a tool call.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Documented fallback coordinate (San Francisco) returned when a name can
/// not be resolved.
pub const FALLBACK_COORDINATE: Coordinate = Coordinate {
    lat: 37.7749,
    lng: -122.4194,
};

/// Outcome of a resolution attempt. Always carries a usable coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub coordinate: Coordinate,
    /// True when the coordinate is the fallback rather than a provider match.
    pub degraded: bool,
}

/// External geocoding collaborator: free text in, best-match coordinate out.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up the best match for `name`. `Ok(None)` means the provider
    /// answered but had no match.
    async fn lookup(&self, name: &str) -> Result<Option<Coordinate>>;
}

/// Built-in gazetteer of well-known cities.
///
/// Serves as the offline default and as a deterministic test double. Matching
/// is case-insensitive and substring-tolerant, so "downtown san francisco"
/// resolves to San Francisco.
#[derive(Debug, Clone, Default)]
pub struct StaticGazetteer;

const GAZETTEER: &[(&str, Coordinate)] = &[
    ("san francisco", Coordinate { lat: 37.7749, lng: -122.4194 }),
    ("oakland", Coordinate { lat: 37.8044, lng: -122.2712 }),
    ("berkeley", Coordinate { lat: 37.8715, lng: -122.2730 }),
    ("new york", Coordinate { lat: 40.7128, lng: -74.0060 }),
    ("los angeles", Coordinate { lat: 34.0522, lng: -118.2437 }),
    ("chicago", Coordinate { lat: 41.8781, lng: -87.6298 }),
    ("miami", Coordinate { lat: 25.7617, lng: -80.1918 }),
    ("seattle", Coordinate { lat: 47.6062, lng: -122.3321 }),
    ("paris", Coordinate { lat: 48.8566, lng: 2.3522 }),
    ("london", Coordinate { lat: 51.5074, lng: -0.1278 }),
    ("tokyo", Coordinate { lat: 35.6762, lng: 139.6503 }),
];

#[async_trait]
impl Geocoder for StaticGazetteer {
    async fn lookup(&self, name: &str) -> Result<Option<Coordinate>> {
        let needle = name.trim().to_lowercase();
        Ok(GAZETTEER
            .iter()
            .find(|(city, _)| needle.contains(city))
            .map(|(_, coordinate)| *coordinate))
    }
}

/// Forward geocoder speaking a Nominatim-style search API.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

impl HttpGeocoder {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn lookup(&self, name: &str) -> Result<Option<Coordinate>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::GeocodingProvider {
                message: format!("unexpected status {}", response.status()),
            });
        }

        let hits: Vec<GeocodeHit> = response.json().await?;
        let Some(hit) = hits.first() else {
            return Ok(None);
        };

        let (Ok(lat), Ok(lng)) = (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) else {
            return Err(Error::GeocodingProvider {
                message: "non-numeric coordinates in response".to_string(),
            });
        };

        let coordinate = Coordinate::new(lat, lng);
        if !coordinate.is_valid() {
            return Err(Error::GeocodingProvider {
                message: format!("coordinate out of domain: [{lat}, {lng}]"),
            });
        }

        Ok(Some(coordinate))
    }
}

/// Geocoding front-end owning the shared name → coordinate cache.
///
/// The cache key is the trimmed, lowercased name, so one key maps to exactly
/// one coordinate pair. Concurrent writers may race but all writes for the
/// same key are equal-valued; last-writer-wins is safe.
pub struct LocationResolver {
    geocoder: Box<dyn Geocoder>,
    cache: RwLock<HashMap<String, Coordinate>>,
    timeout: Duration,
    fallback: Coordinate,
}

impl LocationResolver {
    pub fn new(geocoder: Box<dyn Geocoder>, timeout: Duration, fallback: Coordinate) -> Self {
        Self {
            geocoder,
            cache: RwLock::new(HashMap::new()),
            timeout,
            fallback,
        }
    }

    /// Resolve a place name to a coordinate.
    ///
    /// Single provider attempt under the configured timeout; no retry. A
    /// failed or empty lookup returns the fallback coordinate with
    /// `degraded = true` instead of an error.
    pub async fn resolve(&self, name: &str) -> Resolution {
        let key = name.trim().to_lowercase();

        if let Some(coordinate) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
        {
            debug!(name = %key, "geocode cache hit");
            return Resolution {
                coordinate,
                degraded: false,
            };
        }

        match tokio::time::timeout(self.timeout, self.geocoder.lookup(&key)).await {
            Ok(Ok(Some(coordinate))) => {
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, coordinate);
                Resolution {
                    coordinate,
                    degraded: false,
                }
            }
            Ok(Ok(None)) => {
                warn!(name = %key, "geocoder returned no match, using fallback coordinate");
                self.fallback_resolution()
            }
            Ok(Err(err)) => {
                warn!(name = %key, error = %err, "geocoder failed, using fallback coordinate");
                self.fallback_resolution()
            }
            Err(_) => {
                warn!(
                    name = %key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "geocoder timed out, using fallback coordinate"
                );
                self.fallback_resolution()
            }
        }
    }

    fn fallback_resolution(&self) -> Resolution {
        Resolution {
            coordinate: self.fallback,
            degraded: true,
        }
    }

    /// Number of cached resolutions.
    pub fn cache_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("cached", &self.cache_len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CountingGeocoder, FailingGeocoder};

    fn resolver_with(geocoder: Box<dyn Geocoder>) -> LocationResolver {
        LocationResolver::new(geocoder, Duration::from_millis(500), FALLBACK_COORDINATE)
    }

    #[tokio::test]
    async fn known_name_resolves() {
        let resolver = resolver_with(Box::new(StaticGazetteer));
        let resolution = resolver.resolve("Oakland").await;

        assert!(!resolution.degraded);
        assert!((resolution.coordinate.lat - 37.8044).abs() < 0.01);
        assert!((resolution.coordinate.lng - (-122.2712)).abs() < 0.01);
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let resolver = resolver_with(Box::new(StaticGazetteer));
        let upper = resolver.resolve("SAN FRANCISCO").await;
        let lower = resolver.resolve("san francisco").await;
        assert_eq!(upper.coordinate, lower.coordinate);
    }

    #[tokio::test]
    async fn partial_names_match() {
        let resolver = resolver_with(Box::new(StaticGazetteer));
        let resolution = resolver.resolve("downtown san francisco").await;
        assert!(!resolution.degraded);
        assert!((resolution.coordinate.lat - 37.7749).abs() < 0.01);
    }

    #[tokio::test]
    async fn unknown_name_falls_back_degraded() {
        let resolver = resolver_with(Box::new(StaticGazetteer));
        let resolution = resolver.resolve("Unknown City XYZ").await;

        assert!(resolution.degraded);
        assert_eq!(resolution.coordinate, FALLBACK_COORDINATE);
    }

    #[tokio::test]
    async fn second_resolution_hits_cache() {
        let counting = CountingGeocoder::new(StaticGazetteer);
        let calls = counting.calls();
        let resolver = resolver_with(Box::new(counting));

        let first = resolver.resolve("Berkeley").await;
        let second = resolver.resolve("berkeley  ").await;

        assert_eq!(first.coordinate, second.coordinate);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(resolver.cache_len(), 1);
    }

    #[tokio::test]
    async fn provider_error_is_not_cached() {
        let failing = FailingGeocoder::default();
        let calls = failing.calls();
        let resolver = resolver_with(Box::new(failing));

        let first = resolver.resolve("Oakland").await;
        let second = resolver.resolve("Oakland").await;

        assert!(first.degraded);
        assert!(second.degraded);
        // Fallbacks are not cached, so the provider is consulted each time.
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(resolver.cache_len(), 0);
    }
}
