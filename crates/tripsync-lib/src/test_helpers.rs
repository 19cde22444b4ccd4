//! Mock collaborators for tests.
//!
//! Enabled for this crate's own tests and, via the `test-helpers` feature,
//! for dependent crates' test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::broadcast::{BroadcastTransport, Envelope};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::geocode::Geocoder;
use crate::route::{AxisOrder, DirectionsProvider, RawDirections, RouteMode};

/// Shared envelope log captured by [`RecordingTransport`].
pub type EnvelopeLog = Arc<Mutex<Vec<Envelope>>>;

/// Wraps a geocoder and counts provider invocations.
pub struct CountingGeocoder<G> {
    inner: G,
    calls: Arc<AtomicUsize>,
}

impl<G> CountingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle onto the call counter, valid after the geocoder is moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CountingGeocoder<G> {
    async fn lookup(&self, name: &str) -> Result<Option<Coordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(name).await
    }
}

/// Geocoder that always fails, counting attempts.
#[derive(Default)]
pub struct FailingGeocoder {
    calls: Arc<AtomicUsize>,
}

impl FailingGeocoder {
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn lookup(&self, _name: &str) -> Result<Option<Coordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::GeocodingProvider {
            message: "mock geocoder failure".to_string(),
        })
    }
}

/// Directions provider returning a fixed leg.
pub struct StaticDirections {
    geometry: Vec<[f64; 2]>,
    axis_order: AxisOrder,
    distance_m: f64,
    duration_s: f64,
}

impl StaticDirections {
    /// A leg whose geometry is lng,lat ordered, like GeoJSON providers.
    pub fn lng_lat(geometry: Vec<[f64; 2]>, distance_m: f64, duration_s: f64) -> Self {
        Self {
            geometry,
            axis_order: AxisOrder::LngLat,
            distance_m,
            duration_s,
        }
    }
}

#[async_trait]
impl DirectionsProvider for StaticDirections {
    async fn directions(
        &self,
        _waypoints: &[Coordinate],
        _mode: RouteMode,
    ) -> Result<RawDirections> {
        Ok(RawDirections {
            geometry: self.geometry.clone(),
            axis_order: self.axis_order,
            distance_m: self.distance_m,
            duration_s: self.duration_s,
        })
    }
}

/// Directions provider that always fails, forcing the fallback path.
pub struct FailingDirections;

#[async_trait]
impl DirectionsProvider for FailingDirections {
    async fn directions(
        &self,
        _waypoints: &[Coordinate],
        _mode: RouteMode,
    ) -> Result<RawDirections> {
        Err(Error::DirectionsProvider {
            message: "mock directions failure".to_string(),
        })
    }
}

/// Transport that records published envelopes.
#[derive(Default)]
pub struct RecordingTransport {
    log: EnvelopeLog,
}

impl RecordingTransport {
    /// Handle onto the log, valid after the transport is moved.
    pub fn log(&self) -> EnvelopeLog {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl BroadcastTransport for RecordingTransport {
    async fn publish(&self, envelope: &Envelope) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(envelope.clone());
        Ok(())
    }
}

/// Transport that always fails.
pub struct FailingTransport;

#[async_trait]
impl BroadcastTransport for FailingTransport {
    async fn publish(&self, _envelope: &Envelope) -> Result<()> {
        Err(Error::BroadcastTransport {
            message: "mock transport failure".to_string(),
        })
    }
}
