//! Explicit tool registry.
//!
//! The registry is the single dispatch point for the orchestrator: a fixed
//! mapping from tool name to typed handler plus a declared parameter schema,
//! built once at startup. Nothing here is discovered at runtime.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use tripsync_lib::TripContext;

use crate::error::{ToolError, ToolResult};
use crate::tools::*;
use crate::types::*;

/// Names of every registered tool, in registration order.
pub const TOOL_NAMES: &[&str] = &[
    "update_map",
    "search_restaurants",
    "get_activities",
    "search_hotels",
    "add_to_itinerary",
    "remove_from_itinerary",
    "clear_itinerary",
    "generate_booking_payment",
    "confirm_payment",
];

/// Descriptor advertised for a registered tool.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the tool's parameters.
    pub parameters: Value,
}

fn descriptor<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolDescriptor {
    let schema = schemars::schema_for!(T);
    ToolDescriptor {
        name,
        description,
        parameters: serde_json::to_value(schema).unwrap_or(Value::Null),
    }
}

/// The tool name → handler mapping over a shared [`TripContext`].
pub struct ToolRegistry {
    context: TripContext,
}

impl ToolRegistry {
    pub fn new(context: TripContext) -> Self {
        info!(tools = TOOL_NAMES.len(), "tool registry built");
        Self { context }
    }

    /// Declared descriptors for every registered tool.
    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            descriptor::<UpdateMapInput>(
                "update_map",
                "Update the map with a route through the given waypoints, \
                 computing the path and framing bounds",
            ),
            descriptor::<SearchRestaurantsInput>(
                "search_restaurants",
                "Search for restaurants in a location with per-person cost estimates",
            ),
            descriptor::<GetActivitiesInput>(
                "get_activities",
                "Find top-rated activities and attractions with per-person cost estimates",
            ),
            descriptor::<SearchHotelsInput>(
                "search_hotels",
                "Search for hotels and accommodations with per-night cost estimates",
            ),
            descriptor::<AddToItineraryInput>(
                "add_to_itinerary",
                "Add a restaurant, hotel, or activity to the trip itinerary",
            ),
            descriptor::<RemoveFromItineraryInput>(
                "remove_from_itinerary",
                "Remove an item from the trip itinerary by name",
            ),
            descriptor::<ClearItineraryInput>(
                "clear_itinerary",
                "Remove every item from the trip itinerary",
            ),
            descriptor::<GenerateBookingPaymentInput>(
                "generate_booking_payment",
                "Quote a booking: hotels and activities paid now, restaurants \
                 paid later at the venue",
            ),
            descriptor::<ConfirmPaymentInput>(
                "confirm_payment",
                "Execute the pending payment quote after the user confirms",
            ),
        ]
    }

    /// Whether a tool with this name is registered.
    pub fn contains(name: &str) -> bool {
        TOOL_NAMES.contains(&name)
    }

    /// Dispatch a tool call by name.
    ///
    /// Unknown names yield an `unknown_tool` error; malformed arguments a
    /// `validation_error`. Handler failures come back as structured errors
    /// for the caller to embed in its result.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolResult<Value> {
        info!(tool = name, "dispatching tool call");
        let ctx = &self.context;

        match name {
            "update_map" => UpdateMapTool::execute(ctx, parse(args)?).await,
            "search_restaurants" => SearchRestaurantsTool::execute(ctx, parse(args)?).await,
            "get_activities" => GetActivitiesTool::execute(ctx, parse(args)?).await,
            "search_hotels" => SearchHotelsTool::execute(ctx, parse(args)?).await,
            "add_to_itinerary" => AddToItineraryTool::execute(ctx, parse(args)?).await,
            "remove_from_itinerary" => RemoveFromItineraryTool::execute(ctx, parse(args)?).await,
            "clear_itinerary" => ClearItineraryTool::execute(ctx, parse(args)?).await,
            "generate_booking_payment" => {
                GenerateBookingPaymentTool::execute(ctx, parse(args)?).await
            }
            "confirm_payment" => ConfirmPaymentTool::execute(ctx, parse(args)?).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }

    /// The shared engine context backing this registry.
    pub fn context(&self) -> &TripContext {
        &self.context
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| ToolError::validation("arguments", e.to_string()))
}
