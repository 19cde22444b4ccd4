//! Registry-level integration tests: dispatch through the full engine with
//! mock providers.

use serde_json::json;

use tripsync_lib::test_helpers::{CountingGeocoder, FailingDirections};
use tripsync_lib::{EngineConfig, SettlementIdentity, StaticGazetteer, TripContext};
use tripsync_tools::ToolRegistry;

fn registry_with_counting_geocoder() -> (ToolRegistry, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let geocoder = CountingGeocoder::new(StaticGazetteer);
    let calls = geocoder.calls();
    let context = TripContext::from_parts(
        &EngineConfig::default(),
        Box::new(geocoder),
        Box::new(FailingDirections),
        SettlementIdentity::new("IntegrationVendor"),
    );
    (ToolRegistry::new(context), calls)
}

#[tokio::test]
async fn repeated_searches_reuse_the_geocode_cache() {
    let (registry, calls) = registry_with_counting_geocoder();

    registry
        .dispatch("search_restaurants", json!({"location": "Berkeley"}))
        .await
        .expect("first search");
    registry
        .dispatch("get_activities", json!({"location": "berkeley"}))
        .await
        .expect("second search");

    // Both searches hit the same normalized cache key.
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn route_and_payment_flow_end_to_end() {
    let (registry, _calls) = registry_with_counting_geocoder();
    let mut events = registry.context().subscribe_events();

    let route = registry
        .dispatch(
            "update_map",
            json!({"waypoints": ["Oakland", "Berkeley"], "route_type": "driving"}),
        )
        .await
        .expect("route computed");
    assert_eq!(route["degraded"], true);
    assert_eq!(route["path"].as_array().expect("path").len(), 7);

    let quote = registry
        .dispatch(
            "generate_booking_payment",
            json!({"hotel_cost": 300.0, "activities_cost": 100.0, "restaurant_cost": 50.0}),
        )
        .await
        .expect("quote");
    assert_eq!(quote["paid_now_usd"], 400.0);

    registry
        .dispatch("confirm_payment", json!({}))
        .await
        .expect("confirm");

    let mut kinds = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        kinds.push(envelope.kind().to_string());
    }

    assert!(kinds.contains(&"AGENT_STATE".to_string()));
    assert!(kinds.contains(&"ROUTE_UPDATE".to_string()));
    assert!(kinds.contains(&"PAYMENT_QUOTE".to_string()));
    assert!(kinds.contains(&"PAYMENT_EXECUTE".to_string()));
}

#[tokio::test]
async fn tool_errors_do_not_poison_later_dispatches() {
    let (registry, _calls) = registry_with_counting_geocoder();

    let err = registry
        .dispatch("confirm_payment", json!({}))
        .await
        .expect_err("no quote yet");
    assert_eq!(err.kind, "payment_state_error");

    // The failed confirm left the session untouched; a quote still works.
    registry
        .dispatch("generate_booking_payment", json!({"hotel_cost": 10.0}))
        .await
        .expect("quote after failed confirm");
    registry
        .dispatch("confirm_payment", json!({}))
        .await
        .expect("confirm after quote");
}
