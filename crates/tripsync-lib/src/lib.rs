//! TripSync library entry points.
//!
//! This crate exposes the trip-planning synchronization engine: location
//! resolution with caching, route computation with provider-failure fallback,
//! bounding-box geometry, deterministic cost estimation, the typed broadcast
//! protocol, and the payment quote/confirm state machine. Higher-level
//! consumers (tool registry, HTTP service) should only depend on the types
//! exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod broadcast;
pub mod config;
pub mod context;
pub mod cost;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod payment;
pub mod route;
pub mod search;
pub mod settlement;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use broadcast::{BroadcastTransport, ChannelTransport, Envelope, ItineraryItem, SyncBroadcaster};
pub use config::EngineConfig;
pub use context::TripContext;
pub use cost::{CostEstimate, CostEstimator, ItemCategory, PriceTier};
pub use error::{Error, Result};
pub use geo::{compute_bounds, Bounds, Coordinate};
pub use geocode::{Geocoder, HttpGeocoder, LocationResolver, Resolution, StaticGazetteer};
pub use payment::{PaymentCoordinator, PaymentState, Quote, QuoteBreakdown};
pub use route::{
    DirectionsProvider, Route, RouteEngine, RouteMode, Waypoint, WaypointSpec,
};
pub use search::{SearchCatalog, SearchResult};
pub use settlement::SettlementIdentity;
