//! Typed broadcast protocol for the remote display surface.
//!
//! [`Envelope`] is the closed set of messages published to the display
//! collaborator. Delivery is best-effort: [`SyncBroadcaster::publish`]
//! catches and logs transport failures without propagating them, so a
//! broadcast fault can never fail the originating tool call. No ordering
//! guarantee is provided beyond the transport's own FIFO per sender;
//! receivers must tolerate reordering and duplicates.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::geo::{Bounds, Coordinate};
use crate::payment::Quote;
use crate::route::{Route, Waypoint};

/// An item added to the trip itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "estimatedCost")]
    pub estimated_cost: f64,
    #[serde(rename = "costLabel")]
    pub cost_label: String,
    pub location: String,
}

/// A typed, discriminated message published to the display surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// Agent activity indicator shown while a tool runs.
    #[serde(rename = "AGENT_STATE")]
    AgentState {
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thinking_message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
    },

    /// Search results to drop onto the map, centered on `coordinates`.
    #[serde(rename = "MAP_UPDATE")]
    MapUpdate {
        coordinates: Coordinate,
        data: serde_json::Value,
    },

    /// A computed route. Route fields are duplicated at the top level for
    /// consumer convenience.
    #[serde(rename = "ROUTE_UPDATE")]
    RouteUpdate {
        route: Route,
        waypoints: Vec<Waypoint>,
        path: Vec<Coordinate>,
        bounds: Option<Bounds>,
    },

    #[serde(rename = "ITINERARY_ADD")]
    ItineraryAdd { item: ItineraryItem },

    #[serde(rename = "ITINERARY_REMOVE")]
    ItineraryRemove { item_name: String },

    #[serde(rename = "ITINERARY_CLEAR")]
    ItineraryClear,

    /// A pending payment quote awaiting confirmation.
    #[serde(rename = "PAYMENT_QUOTE")]
    PaymentQuote {
        #[serde(flatten)]
        quote: Quote,
    },

    /// Bare trigger asking the external signer to complete settlement.
    #[serde(rename = "PAYMENT_EXECUTE")]
    PaymentExecute,
}

impl Envelope {
    /// The wire discriminant of this envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::AgentState { .. } => "AGENT_STATE",
            Envelope::MapUpdate { .. } => "MAP_UPDATE",
            Envelope::RouteUpdate { .. } => "ROUTE_UPDATE",
            Envelope::ItineraryAdd { .. } => "ITINERARY_ADD",
            Envelope::ItineraryRemove { .. } => "ITINERARY_REMOVE",
            Envelope::ItineraryClear => "ITINERARY_CLEAR",
            Envelope::PaymentQuote { .. } => "PAYMENT_QUOTE",
            Envelope::PaymentExecute => "PAYMENT_EXECUTE",
        }
    }

    /// Build a `ROUTE_UPDATE` with the route fields mirrored at top level.
    pub fn route_update(route: Route) -> Self {
        Envelope::RouteUpdate {
            waypoints: route.waypoints.clone(),
            path: route.path.clone(),
            bounds: route.bounds,
            route,
        }
    }
}

/// Outbound transport for broadcast envelopes.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn publish(&self, envelope: &Envelope) -> Result<()>;
}

/// In-process fan-out transport over a tokio broadcast channel.
///
/// Subscribers that lag past the channel capacity lose messages; that is the
/// documented best-effort delivery contract.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: tokio::sync::broadcast::Sender<Envelope>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the envelope stream.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl BroadcastTransport for ChannelTransport {
    async fn publish(&self, envelope: &Envelope) -> Result<()> {
        // A send with no subscribers is not a failure for a fire-and-forget
        // display stream.
        let _ = self.sender.send(envelope.clone());
        Ok(())
    }
}

/// Best-effort publisher wrapping a transport.
pub struct SyncBroadcaster {
    transport: Box<dyn BroadcastTransport>,
    failures: AtomicU64,
}

impl SyncBroadcaster {
    pub fn new(transport: Box<dyn BroadcastTransport>) -> Self {
        Self {
            transport,
            failures: AtomicU64::new(0),
        }
    }

    /// Publish an envelope. Failures are logged and counted, never returned.
    pub async fn publish(&self, envelope: Envelope) {
        let kind = envelope.kind();
        if let Err(err) = self.transport.publish(&envelope).await {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!(envelope = kind, error = %err, "broadcast publish failed, continuing");
        }
    }

    /// Number of publish failures since startup.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SyncBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBroadcaster")
            .field("failures", &self.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingTransport, RecordingTransport};

    #[tokio::test]
    async fn envelopes_serialize_with_type_discriminant() {
        let clear = serde_json::to_value(Envelope::ItineraryClear).expect("serialize");
        assert_eq!(clear, serde_json::json!({"type": "ITINERARY_CLEAR"}));

        let execute = serde_json::to_value(Envelope::PaymentExecute).expect("serialize");
        assert_eq!(execute, serde_json::json!({"type": "PAYMENT_EXECUTE"}));
    }

    #[test]
    fn itinerary_item_uses_camel_case_keys() {
        let item = ItineraryItem {
            id: "restaurant-chez-panisse".to_string(),
            name: "Chez Panisse".to_string(),
            kind: "restaurant".to_string(),
            estimated_cost: 110.0,
            cost_label: "$55/person".to_string(),
            location: "Berkeley".to_string(),
        };
        let json = serde_json::to_value(Envelope::ItineraryAdd { item }).expect("serialize");

        assert_eq!(json["type"], "ITINERARY_ADD");
        assert_eq!(json["item"]["estimatedCost"], 110.0);
        assert_eq!(json["item"]["costLabel"], "$55/person");
        assert_eq!(json["item"]["type"], "restaurant");
    }

    #[tokio::test]
    async fn channel_transport_fans_out_to_subscribers() {
        let transport = ChannelTransport::new(16);
        let mut receiver = transport.subscribe();
        let broadcaster = SyncBroadcaster::new(Box::new(transport));

        broadcaster.publish(Envelope::ItineraryClear).await;

        let received = receiver.recv().await.expect("envelope delivered");
        assert_eq!(received.kind(), "ITINERARY_CLEAR");
        assert_eq!(broadcaster.failure_count(), 0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_a_failure() {
        let broadcaster = SyncBroadcaster::new(Box::new(ChannelTransport::new(16)));
        broadcaster.publish(Envelope::PaymentExecute).await;
        assert_eq!(broadcaster.failure_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_and_counted() {
        let broadcaster = SyncBroadcaster::new(Box::new(FailingTransport));

        broadcaster.publish(Envelope::ItineraryClear).await;
        broadcaster.publish(Envelope::PaymentExecute).await;

        assert_eq!(broadcaster.failure_count(), 2);
    }

    #[tokio::test]
    async fn recording_transport_captures_payloads() {
        let transport = RecordingTransport::default();
        let log = transport.log();
        let broadcaster = SyncBroadcaster::new(Box::new(transport));

        broadcaster
            .publish(Envelope::ItineraryRemove {
                item_name: "Gather".to_string(),
            })
            .await;

        let seen = log.lock().expect("log lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind(), "ITINERARY_REMOVE");
    }
}
