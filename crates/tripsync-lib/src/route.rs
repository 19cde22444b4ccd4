//! Route computation with provider-failure fallback.
//!
//! [`RouteEngine`] resolves an ordered waypoint list, asks the external
//! directions provider for a polyline, and falls back to a deterministic
//! straight-line interpolation when the provider is unavailable. Provider
//! geometry arrives in a provider-specific axis order and is normalized to
//! `(lat, lng)` at the boundary; out-of-domain points are discarded.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geo::{compute_bounds, Bounds, Coordinate, ROUTE_PADDING_FRACTION};
use crate::geocode::LocationResolver;

/// Number of evenly spaced points inserted between each waypoint pair by the
/// fallback interpolation.
const FALLBACK_POINTS_PER_SEGMENT: usize = 5;

/// Travel mode requested for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Driving,
    Walking,
    Transit,
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteMode::Driving => "driving",
            RouteMode::Walking => "walking",
            RouteMode::Transit => "transit",
        };
        f.write_str(value)
    }
}

/// A waypoint as supplied by the caller: either a place name to resolve or a
/// pre-resolved coordinate pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WaypointSpec {
    Name(String),
    Pinned {
        #[serde(default)]
        location: Option<String>,
        coordinates: Coordinate,
    },
}

/// A resolved stop in an ordered route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: String,
    pub coordinates: Coordinate,
}

/// Axis order of geometry returned by a directions provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    LatLng,
    LngLat,
}

/// Raw directions as returned by a provider, before normalization.
#[derive(Debug, Clone)]
pub struct RawDirections {
    pub geometry: Vec<[f64; 2]>,
    pub axis_order: AxisOrder,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// External directions collaborator: ordered coordinates + mode in, polyline
/// with distance and duration out.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn directions(&self, waypoints: &[Coordinate], mode: RouteMode) -> Result<RawDirections>;
}

/// Directions provider speaking a Mapbox-style directions API.
///
/// The API has no transit profile, so transit requests are issued as driving.
/// Returned geometry is GeoJSON and therefore lng,lat ordered.
#[derive(Debug, Clone)]
pub struct HttpDirections {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpDirections {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_token,
        }
    }

    fn profile(mode: RouteMode) -> &'static str {
        match mode {
            RouteMode::Driving | RouteMode::Transit => "driving",
            RouteMode::Walking => "walking",
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsBody {
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: DirectionsGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[async_trait]
impl DirectionsProvider for HttpDirections {
    async fn directions(&self, waypoints: &[Coordinate], mode: RouteMode) -> Result<RawDirections> {
        let coords = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!("{}/{}/{}", self.base_url, Self::profile(mode), coords);

        let mut request = self.client.get(&url).query(&[
            ("geometries", "geojson"),
            ("overview", "full"),
        ]);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::DirectionsProvider {
                message: format!("unexpected status {}", response.status()),
            });
        }

        let body: DirectionsBody = response.json().await?;
        let Some(route) = body.routes.into_iter().next() else {
            return Err(Error::DirectionsProvider {
                message: "no routes in response".to_string(),
            });
        };

        Ok(RawDirections {
            geometry: route.geometry.coordinates,
            axis_order: AxisOrder::LngLat,
            distance_m: route.distance,
            duration_s: route.duration,
        })
    }
}

/// A computed route, created per tool call and handed to the broadcaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "route_type")]
    pub mode: RouteMode,
    pub waypoints: Vec<Waypoint>,
    pub path: Vec<Coordinate>,
    pub bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    /// True when the path came from the interpolation fallback.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Orchestrates resolution, the directions provider, and bounds computation.
pub struct RouteEngine {
    resolver: Arc<LocationResolver>,
    provider: Box<dyn DirectionsProvider>,
    timeout: Duration,
}

impl RouteEngine {
    pub fn new(
        resolver: Arc<LocationResolver>,
        provider: Box<dyn DirectionsProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            provider,
            timeout,
        }
    }

    /// Compute a route through the given waypoints.
    ///
    /// Waypoints resolve concurrently but the output order always matches
    /// the input order. Fewer than two waypoints is a normal outcome that
    /// yields an empty path, not an error.
    pub async fn compute_route(&self, specs: &[WaypointSpec], mode: RouteMode) -> Route {
        let resolutions = futures::future::join_all(specs.iter().map(|spec| async move {
            match spec {
                WaypointSpec::Name(name) => {
                    let resolution = self.resolver.resolve(name).await;
                    if resolution.degraded {
                        warn!(location = %name, "waypoint resolved via fallback coordinate");
                    }
                    Waypoint {
                        location: name.clone(),
                        coordinates: resolution.coordinate,
                    }
                }
                WaypointSpec::Pinned {
                    location,
                    coordinates,
                } => Waypoint {
                    location: location.clone().unwrap_or_else(|| {
                        format!("{:.4},{:.4}", coordinates.lat, coordinates.lng)
                    }),
                    coordinates: *coordinates,
                },
            }
        }))
        .await;

        if resolutions.len() < 2 {
            return Route {
                mode,
                waypoints: resolutions,
                path: Vec::new(),
                bounds: None,
                distance_m: None,
                duration_s: None,
                degraded: false,
                message: Some("At least two waypoints are required to compute a route".to_string()),
            };
        }

        let coords: Vec<Coordinate> = resolutions.iter().map(|w| w.coordinates).collect();

        let (path, distance_m, duration_s, degraded) =
            match tokio::time::timeout(self.timeout, self.provider.directions(&coords, mode)).await
            {
                Ok(Ok(raw)) => {
                    let normalized = normalize_geometry(&raw);
                    if normalized.len() >= 2 {
                        (normalized, Some(raw.distance_m), Some(raw.duration_s), false)
                    } else {
                        warn!(
                            points = normalized.len(),
                            "directions geometry unusable, interpolating fallback path"
                        );
                        (interpolate_path(&coords), None, None, true)
                    }
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "directions provider failed, interpolating fallback path");
                    (interpolate_path(&coords), None, None, true)
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "directions provider timed out, interpolating fallback path"
                    );
                    (interpolate_path(&coords), None, None, true)
                }
            };

        let bounds = compute_bounds(&path, ROUTE_PADDING_FRACTION);

        info!(
            waypoints = resolutions.len(),
            path_points = path.len(),
            mode = %mode,
            degraded,
            "route computed"
        );

        Route {
            mode,
            waypoints: resolutions,
            path,
            bounds,
            distance_m,
            duration_s,
            degraded,
            message: None,
        }
    }
}

impl std::fmt::Debug for RouteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEngine")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Normalize provider geometry to `(lat, lng)`, discarding points outside
/// the valid latitude/longitude domains.
fn normalize_geometry(raw: &RawDirections) -> Vec<Coordinate> {
    raw.geometry
        .iter()
        .map(|pair| match raw.axis_order {
            AxisOrder::LatLng => Coordinate::new(pair[0], pair[1]),
            AxisOrder::LngLat => Coordinate::new(pair[1], pair[0]),
        })
        .filter(Coordinate::is_valid)
        .collect()
}

/// Deterministic straight-line interpolation between consecutive waypoints.
///
/// Each segment contributes its start waypoint plus five evenly spaced
/// intermediate points (`ratio = j/6`); the final waypoint is emitted once at
/// the end. For `n` waypoints this yields exactly `n + 5 * (n - 1)` points.
pub fn interpolate_path(waypoints: &[Coordinate]) -> Vec<Coordinate> {
    let mut path = Vec::with_capacity(
        waypoints.len() + FALLBACK_POINTS_PER_SEGMENT * waypoints.len().saturating_sub(1),
    );

    for pair in waypoints.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        path.push(start);
        for j in 1..=FALLBACK_POINTS_PER_SEGMENT {
            let t = j as f64 / (FALLBACK_POINTS_PER_SEGMENT + 1) as f64;
            path.push(Coordinate::new(
                start.lat + (end.lat - start.lat) * t,
                start.lng + (end.lng - start.lng) * t,
            ));
        }
    }

    if let Some(last) = waypoints.last() {
        path.push(*last);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{StaticGazetteer, FALLBACK_COORDINATE};
    use crate::test_helpers::{FailingDirections, StaticDirections};

    fn engine_with(provider: Box<dyn DirectionsProvider>) -> RouteEngine {
        let resolver = Arc::new(LocationResolver::new(
            Box::new(StaticGazetteer),
            Duration::from_millis(500),
            FALLBACK_COORDINATE,
        ));
        RouteEngine::new(resolver, provider, Duration::from_millis(500))
    }

    fn names(names: &[&str]) -> Vec<WaypointSpec> {
        names
            .iter()
            .map(|n| WaypointSpec::Name(n.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn provider_path_is_used_when_available() {
        let leg = vec![
            [-122.2712, 37.8044],
            [-122.2721, 37.8380],
            [-122.2730, 37.8715],
        ];
        let engine = engine_with(Box::new(StaticDirections::lng_lat(leg, 9300.0, 780.0)));

        let route = engine
            .compute_route(&names(&["Oakland", "Berkeley"]), RouteMode::Driving)
            .await;

        assert!(!route.degraded);
        assert_eq!(route.waypoints.len(), 2);
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.distance_m, Some(9300.0));
        assert_eq!(route.duration_s, Some(780.0));

        let bounds = route.bounds.expect("bounds present");
        assert!(bounds.north > bounds.south);
        assert!(bounds.east > bounds.west);

        // Geometry arrived lng,lat and must come out lat,lng.
        assert!((route.path[0].lat - 37.8044).abs() < 1e-9);
        assert!((route.path[0].lng - (-122.2712)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn provider_failure_interpolates_fallback() {
        let engine = engine_with(Box::new(FailingDirections));

        let route = engine
            .compute_route(&names(&["Oakland", "Berkeley"]), RouteMode::Driving)
            .await;

        assert!(route.degraded);
        // 2 waypoints: 2 + 5 * 1 = 7 path points.
        assert_eq!(route.path.len(), 7);
        assert_eq!(route.path[0], route.waypoints[0].coordinates);
        assert_eq!(route.path[6], route.waypoints[1].coordinates);
        assert!(route.distance_m.is_none());
        assert!(route.bounds.is_some());
    }

    #[tokio::test]
    async fn fallback_point_count_scales_with_waypoints() {
        let engine = engine_with(Box::new(FailingDirections));

        let route = engine
            .compute_route(
                &names(&["San Francisco", "Oakland", "Berkeley"]),
                RouteMode::Driving,
            )
            .await;

        // 3 waypoints: 3 + 5 * 2 = 13 path points.
        assert_eq!(route.path.len(), 13);
        assert!(route.degraded);
    }

    #[tokio::test]
    async fn out_of_domain_points_are_discarded() {
        // Only one point survives normalization, forcing the fallback.
        let leg = vec![[-122.2712, 37.8044], [-500.0, 95.0], [181.0, -91.0]];
        let engine = engine_with(Box::new(StaticDirections::lng_lat(leg, 100.0, 10.0)));

        let route = engine
            .compute_route(&names(&["Oakland", "Berkeley"]), RouteMode::Driving)
            .await;

        assert!(route.degraded);
        assert_eq!(route.path.len(), 7);
    }

    #[tokio::test]
    async fn empty_waypoints_is_a_normal_outcome() {
        let engine = engine_with(Box::new(FailingDirections));
        let route = engine.compute_route(&[], RouteMode::Driving).await;

        assert!(route.path.is_empty());
        assert!(route.waypoints.is_empty());
        assert!(route.bounds.is_none());
        assert!(!route.degraded);
        assert!(route.message.is_some());
    }

    #[tokio::test]
    async fn single_waypoint_yields_empty_path() {
        let engine = engine_with(Box::new(FailingDirections));
        let route = engine
            .compute_route(&names(&["Oakland"]), RouteMode::Walking)
            .await;

        assert!(route.path.is_empty());
        assert_eq!(route.waypoints.len(), 1);
        assert!(route.bounds.is_none());
    }

    #[tokio::test]
    async fn output_order_matches_input_order() {
        let engine = engine_with(Box::new(FailingDirections));
        let route = engine
            .compute_route(
                &names(&["Berkeley", "San Francisco", "Oakland"]),
                RouteMode::Driving,
            )
            .await;

        assert_eq!(route.waypoints[0].location, "Berkeley");
        assert_eq!(route.waypoints[1].location, "San Francisco");
        assert_eq!(route.waypoints[2].location, "Oakland");
    }

    #[tokio::test]
    async fn pinned_coordinates_skip_resolution() {
        let engine = engine_with(Box::new(FailingDirections));
        let specs = vec![
            WaypointSpec::Pinned {
                location: Some("Start".to_string()),
                coordinates: Coordinate::new(37.0, -122.0),
            },
            WaypointSpec::Pinned {
                location: None,
                coordinates: Coordinate::new(38.0, -121.0),
            },
        ];

        let route = engine.compute_route(&specs, RouteMode::Driving).await;

        assert_eq!(route.waypoints[0].location, "Start");
        assert_eq!(route.waypoints[1].location, "38.0000,-121.0000");
        assert_eq!(route.path.len(), 7);
    }

    #[test]
    fn interpolation_ratios_are_even() {
        let path = interpolate_path(&[Coordinate::new(0.0, 0.0), Coordinate::new(6.0, 12.0)]);

        assert_eq!(path.len(), 7);
        for (i, point) in path.iter().enumerate() {
            assert!((point.lat - i as f64).abs() < 1e-9);
            assert!((point.lng - 2.0 * i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn route_serializes_wire_field_names() {
        let route = Route {
            mode: RouteMode::Driving,
            waypoints: vec![],
            path: vec![],
            bounds: None,
            distance_m: None,
            duration_s: None,
            degraded: false,
            message: None,
        };
        let json = serde_json::to_value(&route).expect("serialize");

        assert_eq!(json["route_type"], "driving");
        assert!(json.get("distance_m").is_none());
    }
}
