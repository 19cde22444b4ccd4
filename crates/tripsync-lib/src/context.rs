//! Explicitly constructed engine context.
//!
//! [`TripContext`] owns every stateful component of the engine: the
//! location resolver (and thus the geocode cache), the route engine, the
//! cost estimator, the search catalog, the broadcaster, the payment
//! coordinator, and the settlement identity. It is created once at process
//! start from an [`EngineConfig`] and passed by reference into each caller;
//! there is no ambient or static mutable state anywhere in the engine.

use std::sync::Arc;

use crate::broadcast::{ChannelTransport, Envelope, SyncBroadcaster};
use crate::config::EngineConfig;
use crate::cost::CostEstimator;
use crate::geocode::{Geocoder, HttpGeocoder, LocationResolver, StaticGazetteer};
use crate::payment::PaymentCoordinator;
use crate::route::{DirectionsProvider, HttpDirections, RawDirections, RouteEngine, RouteMode};
use crate::search::SearchCatalog;
use crate::settlement::SettlementIdentity;

/// Shared engine context for tool handlers and the HTTP service.
///
/// Cheaply cloneable (`Arc` internally); clone freely across handlers.
#[derive(Clone)]
pub struct TripContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    resolver: Arc<LocationResolver>,
    routes: RouteEngine,
    estimator: CostEstimator,
    catalog: SearchCatalog,
    broadcaster: Arc<SyncBroadcaster>,
    payments: PaymentCoordinator,
    settlement: SettlementIdentity,
    events: ChannelTransport,
}

impl TripContext {
    /// Build a context from configuration.
    ///
    /// Without a configured geocoder the built-in gazetteer answers lookups;
    /// without a configured directions provider every route takes the
    /// interpolation fallback.
    pub fn from_config(config: &EngineConfig, settlement: SettlementIdentity) -> Self {
        let client = reqwest::Client::new();

        let geocoder: Box<dyn Geocoder> = match &config.geocoder_url {
            Some(url) => Box::new(HttpGeocoder::new(client.clone(), url.clone())),
            None => Box::new(StaticGazetteer),
        };

        let provider: Box<dyn DirectionsProvider> = match &config.directions_url {
            Some(url) => Box::new(HttpDirections::new(
                client,
                url.clone(),
                config.directions_token.clone(),
            )),
            None => Box::new(DisabledDirections),
        };

        Self::from_parts(config, geocoder, provider, settlement)
    }

    /// Build a context from explicit collaborators. Useful for tests that
    /// substitute mock providers.
    pub fn from_parts(
        config: &EngineConfig,
        geocoder: Box<dyn Geocoder>,
        provider: Box<dyn DirectionsProvider>,
        settlement: SettlementIdentity,
    ) -> Self {
        let resolver = Arc::new(LocationResolver::new(
            geocoder,
            config.provider_timeout,
            config.fallback_coordinate,
        ));

        let events = ChannelTransport::new(config.broadcast_capacity);
        let broadcaster = Arc::new(SyncBroadcaster::new(Box::new(events.clone())));

        let estimator = CostEstimator::new();

        Self {
            inner: Arc::new(ContextInner {
                routes: RouteEngine::new(
                    Arc::clone(&resolver),
                    provider,
                    config.provider_timeout,
                ),
                catalog: SearchCatalog::new(Arc::clone(&resolver), estimator),
                payments: PaymentCoordinator::new(Arc::clone(&broadcaster)),
                resolver,
                estimator,
                broadcaster,
                settlement,
                events,
            }),
        }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.inner.resolver
    }

    pub fn routes(&self) -> &RouteEngine {
        &self.inner.routes
    }

    pub fn costs(&self) -> &CostEstimator {
        &self.inner.estimator
    }

    pub fn search(&self) -> &SearchCatalog {
        &self.inner.catalog
    }

    pub fn broadcaster(&self) -> &SyncBroadcaster {
        &self.inner.broadcaster
    }

    pub fn payments(&self) -> &PaymentCoordinator {
        &self.inner.payments
    }

    pub fn settlement(&self) -> &SettlementIdentity {
        &self.inner.settlement
    }

    /// Subscribe to the broadcast envelope stream.
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<Envelope> {
        self.inner.events.subscribe()
    }
}

impl std::fmt::Debug for TripContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripContext")
            .field("cached_locations", &self.inner.resolver.cache_len())
            .field("payment_state", &self.inner.payments.state())
            .finish()
    }
}

/// Stand-in provider used when no directions URL is configured; the engine
/// treats the error as a provider failure and interpolates.
struct DisabledDirections;

#[async_trait::async_trait]
impl DirectionsProvider for DisabledDirections {
    async fn directions(
        &self,
        _waypoints: &[crate::geo::Coordinate],
        _mode: RouteMode,
    ) -> crate::Result<RawDirections> {
        Err(crate::Error::DirectionsProvider {
            message: "no directions provider configured".to_string(),
        })
    }
}
