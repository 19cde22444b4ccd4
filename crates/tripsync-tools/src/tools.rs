//! Tool handler implementations.
//!
//! Each handler validates its input, drives the engine, and publishes the
//! matching broadcast envelope before returning a structured result. The
//! thinking-state envelope goes out first so the display surface can show
//! activity while providers are consulted. Broadcast faults are swallowed by
//! the broadcaster and never fail the tool.

use serde_json::{json, Value};
use tracing::info;

use tripsync_lib::route::WaypointSpec;
use tripsync_lib::search::{
    default_rooms, ActivityQuery, HotelQuery, RestaurantQuery, SearchResult,
};
use tripsync_lib::{Envelope, ItemCategory, ItineraryItem, RouteMode, TripContext};

use crate::error::{ToolError, ToolResult};
use crate::types::*;

fn to_value<T: serde::Serialize>(value: &T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::new("internal_error", e.to_string()))
}

fn parse_route_type(value: &str) -> ToolResult<RouteMode> {
    match value.trim().to_lowercase().as_str() {
        "driving" => Ok(RouteMode::Driving),
        "walking" => Ok(RouteMode::Walking),
        "transit" => Ok(RouteMode::Transit),
        other => Err(ToolError::validation(
            "route_type",
            format!("unknown route type '{other}', expected driving, walking, or transit"),
        )),
    }
}

fn require_location(location: &str) -> ToolResult<()> {
    if location.trim().is_empty() {
        return Err(ToolError::validation("location", "cannot be empty"));
    }
    Ok(())
}

async fn publish_thinking(ctx: &TripContext, message: String, tool_name: &str) {
    ctx.broadcaster()
        .publish(Envelope::AgentState {
            state: "thinking".to_string(),
            thinking_message: Some(message),
            tool_name: Some(tool_name.to_string()),
        })
        .await;
}

async fn publish_map_update(ctx: &TripContext, result: &SearchResult) -> ToolResult<Value> {
    let data = to_value(result)?;
    ctx.broadcaster()
        .publish(Envelope::MapUpdate {
            coordinates: result.coordinates,
            data: data.clone(),
        })
        .await;
    Ok(data)
}

fn describe_waypoint(arg: &WaypointArg) -> String {
    match arg {
        WaypointArg::Name(name) => name.clone(),
        WaypointArg::Pinned {
            location: Some(location),
            ..
        } => location.clone(),
        WaypointArg::Pinned {
            location: None,
            coordinates,
        } => format!("{:.4},{:.4}", coordinates[0], coordinates[1]),
    }
}

/// Route computation and map synchronization tool.
pub struct UpdateMapTool;

impl UpdateMapTool {
    pub async fn execute(ctx: &TripContext, input: UpdateMapInput) -> ToolResult<Value> {
        let mode = parse_route_type(&input.route_type)?;
        let waypoints = input.waypoints.unwrap_or_default();

        if waypoints.is_empty() {
            let description = input
                .route_description
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| {
                    ToolError::validation(
                        "waypoints",
                        "either waypoints or route_description is required",
                    )
                })?;

            info!(description = %description, "route description received without waypoints");
            return Ok(json!({
                "route_type": mode.to_string(),
                "waypoints": [],
                "path": [],
                "bounds": null,
                "message": "Route description received, processing...",
            }));
        }

        let thinking = if waypoints.len() >= 2 {
            format!(
                "Planning route from {} to {}...",
                describe_waypoint(&waypoints[0]),
                describe_waypoint(&waypoints[waypoints.len() - 1]),
            )
        } else {
            "Calculating route and updating map...".to_string()
        };
        publish_thinking(ctx, thinking, "update_map").await;

        let specs: Vec<WaypointSpec> = waypoints.into_iter().map(WaypointSpec::from).collect();
        let mut route = ctx.routes().compute_route(&specs, mode).await;
        if route.message.is_none() {
            route.message = Some(format!(
                "Route updated with {} waypoints",
                route.waypoints.len()
            ));
        }

        ctx.broadcaster()
            .publish(Envelope::route_update(route.clone()))
            .await;

        to_value(&route)
    }
}

/// Restaurant search tool.
pub struct SearchRestaurantsTool;

impl SearchRestaurantsTool {
    pub async fn execute(ctx: &TripContext, input: SearchRestaurantsInput) -> ToolResult<Value> {
        require_location(&input.location)?;
        let num_guests = input.num_guests.unwrap_or(1).max(1);

        publish_thinking(
            ctx,
            format!(
                "Searching for restaurants in {} for {} guests...",
                input.location, num_guests
            ),
            "search_restaurants",
        )
        .await;

        let result = ctx
            .search()
            .restaurants(&RestaurantQuery {
                location: input.location,
                food_type: input.food_type,
                num_guests,
                max_price_per_person: input.max_price_per_person,
                min_rating: input.min_rating,
            })
            .await;

        publish_map_update(ctx, &result).await
    }
}

/// Activity search tool.
pub struct GetActivitiesTool;

impl GetActivitiesTool {
    pub async fn execute(ctx: &TripContext, input: GetActivitiesInput) -> ToolResult<Value> {
        require_location(&input.location)?;
        let num_guests = input.num_guests.unwrap_or(1).max(1);

        publish_thinking(
            ctx,
            format!(
                "Finding activities in {} for {} guests...",
                input.location, num_guests
            ),
            "get_activities",
        )
        .await;

        let result = ctx
            .search()
            .activities(&ActivityQuery {
                location: input.location,
                num_guests,
                max_price_per_person: input.max_price_per_person,
                min_rating: input.min_rating,
            })
            .await;

        publish_map_update(ctx, &result).await
    }
}

/// Hotel search tool.
pub struct SearchHotelsTool;

impl SearchHotelsTool {
    pub async fn execute(ctx: &TripContext, input: SearchHotelsInput) -> ToolResult<Value> {
        require_location(&input.location)?;
        let num_guests = input.num_guests.unwrap_or(1).max(1);
        let num_rooms = input
            .num_rooms
            .filter(|&rooms| rooms > 0)
            .unwrap_or_else(|| default_rooms(num_guests));
        let nights = input.nights.filter(|&nights| nights > 0).unwrap_or(1);

        publish_thinking(
            ctx,
            format!(
                "Searching hotels in {} ({} rooms, {} nights)...",
                input.location, num_rooms, nights
            ),
            "search_hotels",
        )
        .await;

        let result = ctx
            .search()
            .hotels(&HotelQuery {
                location: input.location,
                num_guests,
                num_rooms,
                nights,
                max_price_per_night: input.max_price_per_night,
                min_rating: input.min_rating,
            })
            .await;

        publish_map_update(ctx, &result).await
    }
}

/// Itinerary add tool.
pub struct AddToItineraryTool;

impl AddToItineraryTool {
    pub async fn execute(ctx: &TripContext, input: AddToItineraryInput) -> ToolResult<Value> {
        if input.item_name.trim().is_empty() {
            return Err(ToolError::validation("item_name", "cannot be empty"));
        }
        let category: ItemCategory = input.item_type.parse().map_err(|_| {
            ToolError::validation(
                "item_type",
                format!(
                    "unknown item type '{}', expected restaurant, hotel, or activity",
                    input.item_type
                ),
            )
        })?;
        if input.estimated_cost < 0.0 {
            return Err(ToolError::validation(
                "estimated_cost",
                "must not be negative",
            ));
        }

        let item = ItineraryItem {
            id: format!(
                "{}-{}",
                category,
                input.item_name.trim().to_lowercase().replace(' ', "-")
            ),
            name: input.item_name.clone(),
            kind: category.to_string(),
            estimated_cost: input.estimated_cost,
            cost_label: input
                .cost_label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| format!("${}", input.estimated_cost.round() as i64)),
            location: input.location.unwrap_or_default(),
        };

        ctx.broadcaster()
            .publish(Envelope::ItineraryAdd { item })
            .await;

        to_value(&ItineraryOutput {
            status: "added".to_string(),
            item: Some(input.item_name),
        })
    }
}

/// Itinerary remove tool.
pub struct RemoveFromItineraryTool;

impl RemoveFromItineraryTool {
    pub async fn execute(ctx: &TripContext, input: RemoveFromItineraryInput) -> ToolResult<Value> {
        if input.item_name.trim().is_empty() {
            return Err(ToolError::validation("item_name", "cannot be empty"));
        }

        ctx.broadcaster()
            .publish(Envelope::ItineraryRemove {
                item_name: input.item_name.clone(),
            })
            .await;

        to_value(&ItineraryOutput {
            status: "removed".to_string(),
            item: Some(input.item_name),
        })
    }
}

/// Itinerary clear tool.
pub struct ClearItineraryTool;

impl ClearItineraryTool {
    pub async fn execute(ctx: &TripContext, _input: ClearItineraryInput) -> ToolResult<Value> {
        ctx.broadcaster().publish(Envelope::ItineraryClear).await;

        to_value(&ItineraryOutput {
            status: "cleared".to_string(),
            item: None,
        })
    }
}

/// Payment quote tool.
pub struct GenerateBookingPaymentTool;

impl GenerateBookingPaymentTool {
    pub async fn execute(
        ctx: &TripContext,
        input: GenerateBookingPaymentInput,
    ) -> ToolResult<Value> {
        for (name, value) in [
            ("hotel_cost", input.hotel_cost),
            ("activities_cost", input.activities_cost),
            ("restaurant_cost", input.restaurant_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ToolError::validation(name, "must be a non-negative number"));
            }
        }

        let quote = ctx
            .payments()
            .quote(
                input.hotel_cost,
                input.activities_cost,
                input.restaurant_cost,
                &input.item_description,
            )
            .await;

        to_value(&BookingPaymentOutput {
            status: "pending_confirmation".to_string(),
            message: format!(
                "Booking ${:.2} now (hotels + activities). Restaurants ${:.2} pay at venue. Total trip: ${:.2}",
                quote.paid_now_usd, quote.pay_later_usd, quote.estimated_total_usd
            ),
            paid_now_usd: quote.paid_now_usd,
            pay_later_usd: quote.pay_later_usd,
            estimated_total_usd: quote.estimated_total_usd,
            amount_sol: quote.amount_sol,
            item_description: quote.item_description,
        })
    }
}

/// Payment confirmation tool.
pub struct ConfirmPaymentTool;

impl ConfirmPaymentTool {
    pub async fn execute(ctx: &TripContext, _input: ConfirmPaymentInput) -> ToolResult<Value> {
        ctx.payments().confirm().await.map_err(ToolError::from)?;

        to_value(&ConfirmPaymentOutput {
            status: "payment_execution_triggered".to_string(),
            message: "Settlement requested from the wallet integration".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripsync_lib::{EngineConfig, SettlementIdentity};

    fn context() -> TripContext {
        TripContext::from_config(
            &EngineConfig::default(),
            SettlementIdentity::new("ToolVendor"),
        )
    }

    #[tokio::test]
    async fn update_map_returns_route_and_broadcasts() {
        let ctx = context();
        let mut events = ctx.subscribe_events();

        let input = UpdateMapInput {
            waypoints: Some(vec![
                WaypointArg::Name("Oakland".to_string()),
                WaypointArg::Name("Berkeley".to_string()),
            ]),
            route_description: None,
            route_type: "driving".to_string(),
        };
        let value = UpdateMapTool::execute(&ctx, input).await.expect("route");

        assert_eq!(value["route_type"], "driving");
        assert_eq!(value["waypoints"].as_array().expect("waypoints").len(), 2);
        // Offline context falls back to interpolation: 2 + 5 points.
        assert_eq!(value["path"].as_array().expect("path").len(), 7);
        assert_eq!(value["degraded"], true);

        let first = events.recv().await.expect("agent state envelope");
        assert_eq!(first.kind(), "AGENT_STATE");
        let second = events.recv().await.expect("route envelope");
        assert_eq!(second.kind(), "ROUTE_UPDATE");
    }

    #[tokio::test]
    async fn update_map_without_waypoints_or_description_fails() {
        let ctx = context();
        let input = UpdateMapInput {
            waypoints: None,
            route_description: None,
            route_type: "driving".to_string(),
        };

        let err = UpdateMapTool::execute(&ctx, input)
            .await
            .expect_err("validation error");
        assert_eq!(err.kind, "validation_error");
    }

    #[tokio::test]
    async fn update_map_description_only_is_accepted() {
        let ctx = context();
        let input = UpdateMapInput {
            waypoints: None,
            route_description: Some("scenic drive up the coast".to_string()),
            route_type: "driving".to_string(),
        };

        let value = UpdateMapTool::execute(&ctx, input).await.expect("result");
        assert_eq!(value["waypoints"].as_array().expect("waypoints").len(), 0);
        assert!(value["message"]
            .as_str()
            .expect("message")
            .contains("processing"));
    }

    #[tokio::test]
    async fn update_map_rejects_unknown_route_type() {
        let ctx = context();
        let input = UpdateMapInput {
            waypoints: Some(vec![WaypointArg::Name("Oakland".to_string())]),
            route_description: None,
            route_type: "flying".to_string(),
        };

        let err = UpdateMapTool::execute(&ctx, input)
            .await
            .expect_err("validation error");
        assert_eq!(err.kind, "validation_error");
    }

    #[tokio::test]
    async fn search_restaurants_broadcasts_map_update() {
        let ctx = context();
        let mut events = ctx.subscribe_events();

        let input = SearchRestaurantsInput {
            location: "Berkeley".to_string(),
            food_type: Some("Thai".to_string()),
            num_guests: Some(2),
            max_price_per_person: None,
            min_rating: None,
        };
        let value = SearchRestaurantsTool::execute(&ctx, input)
            .await
            .expect("result");

        assert_eq!(value["count"], 3);
        assert_eq!(value["num_guests"], 2);

        let first = events.recv().await.expect("agent state");
        assert_eq!(first.kind(), "AGENT_STATE");
        let second = events.recv().await.expect("map update");
        match second {
            Envelope::MapUpdate { data, .. } => {
                assert_eq!(data["location"], "Berkeley");
            }
            other => panic!("expected MAP_UPDATE, got {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn search_hotels_defaults_rooms_from_guests() {
        let ctx = context();
        let input = SearchHotelsInput {
            location: "Miami".to_string(),
            num_guests: Some(5),
            num_rooms: None,
            nights: Some(2),
            max_price_per_night: None,
            min_rating: None,
        };

        let value = SearchHotelsTool::execute(&ctx, input).await.expect("result");
        assert_eq!(value["num_rooms"], 3);
        assert_eq!(value["nights"], 2);
    }

    #[tokio::test]
    async fn add_to_itinerary_slugs_the_id() {
        let ctx = context();
        let mut events = ctx.subscribe_events();

        let input = AddToItineraryInput {
            item_name: "Chez Panisse".to_string(),
            item_type: "restaurant".to_string(),
            estimated_cost: 110.0,
            cost_label: None,
            location: Some("Berkeley".to_string()),
        };
        let value = AddToItineraryTool::execute(&ctx, input).await.expect("added");
        assert_eq!(value["status"], "added");

        match events.recv().await.expect("envelope") {
            Envelope::ItineraryAdd { item } => {
                assert_eq!(item.id, "restaurant-chez-panisse");
                assert_eq!(item.cost_label, "$110");
            }
            other => panic!("expected ITINERARY_ADD, got {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn add_to_itinerary_rejects_unknown_category() {
        let ctx = context();
        let input = AddToItineraryInput {
            item_name: "Louvre".to_string(),
            item_type: "museum".to_string(),
            estimated_cost: 20.0,
            cost_label: None,
            location: None,
        };

        let err = AddToItineraryTool::execute(&ctx, input)
            .await
            .expect_err("validation error");
        assert_eq!(err.kind, "validation_error");
    }

    #[tokio::test]
    async fn confirm_without_quote_is_a_payment_state_error() {
        let ctx = context();
        let err = ConfirmPaymentTool::execute(&ctx, ConfirmPaymentInput::default())
            .await
            .expect_err("no quote yet");
        assert_eq!(err.kind, "payment_state_error");
    }

    #[tokio::test]
    async fn booking_then_confirm_round_trip() {
        let ctx = context();

        let input = GenerateBookingPaymentInput {
            hotel_cost: 300.0,
            activities_cost: 100.0,
            restaurant_cost: 50.0,
            item_description: "bay area weekend".to_string(),
        };
        let value = GenerateBookingPaymentTool::execute(&ctx, input)
            .await
            .expect("quote");

        assert_eq!(value["status"], "pending_confirmation");
        assert_eq!(value["paid_now_usd"], 400.0);
        assert_eq!(value["pay_later_usd"], 50.0);
        assert_eq!(value["estimated_total_usd"], 450.0);
        assert_eq!(value["amount_sol"], 0.1);

        let confirmed = ConfirmPaymentTool::execute(&ctx, ConfirmPaymentInput::default())
            .await
            .expect("confirm");
        assert_eq!(confirmed["status"], "payment_execution_triggered");
    }

    #[tokio::test]
    async fn booking_rejects_negative_costs() {
        let ctx = context();
        let input = GenerateBookingPaymentInput {
            hotel_cost: -1.0,
            activities_cost: 0.0,
            restaurant_cost: 0.0,
            item_description: "booking".to_string(),
        };

        let err = GenerateBookingPaymentTool::execute(&ctx, input)
            .await
            .expect_err("validation error");
        assert_eq!(err.kind, "validation_error");
    }
}
