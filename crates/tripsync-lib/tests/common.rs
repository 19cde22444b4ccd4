//! Shared fixtures for integration tests.

use async_trait::async_trait;

use tripsync_lib::geo::Coordinate;
use tripsync_lib::route::{AxisOrder, DirectionsProvider, RawDirections, RouteMode};
use tripsync_lib::Result;

/// Directions provider returning a fixed lng,lat-ordered leg.
pub struct FixedDirections {
    geometry: Vec<[f64; 2]>,
    distance_m: f64,
    duration_s: f64,
}

impl FixedDirections {
    pub fn new(geometry: Vec<[f64; 2]>, distance_m: f64, duration_s: f64) -> Self {
        Self {
            geometry,
            distance_m,
            duration_s,
        }
    }
}

#[async_trait]
impl DirectionsProvider for FixedDirections {
    async fn directions(
        &self,
        _waypoints: &[Coordinate],
        _mode: RouteMode,
    ) -> Result<RawDirections> {
        Ok(RawDirections {
            geometry: self.geometry.clone(),
            axis_order: AxisOrder::LngLat,
            distance_m: self.distance_m,
            duration_s: self.duration_s,
        })
    }
}
