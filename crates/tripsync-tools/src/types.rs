//! Type definitions for tool inputs and outputs.
//!
//! Inputs derive `JsonSchema` so the registry can declare each tool's
//! parameter schema at startup. Field names and defaults match the wire
//! contract the orchestrator speaks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use tripsync_lib::route::WaypointSpec;
use tripsync_lib::Coordinate;

// ============================================================================
// TOOL INPUTS
// ============================================================================

/// A waypoint argument: a place name or a pre-resolved coordinate pair.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WaypointArg {
    /// Place name to resolve (e.g., "Oakland").
    Name(String),
    /// Pre-resolved waypoint with `[lat, lng]` coordinates.
    Pinned {
        #[serde(default)]
        location: Option<String>,
        coordinates: [f64; 2],
    },
}

impl From<WaypointArg> for WaypointSpec {
    fn from(arg: WaypointArg) -> Self {
        match arg {
            WaypointArg::Name(name) => WaypointSpec::Name(name),
            WaypointArg::Pinned {
                location,
                coordinates,
            } => WaypointSpec::Pinned {
                location,
                coordinates: Coordinate::from(coordinates),
            },
        }
    }
}

/// Input for the update_map tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateMapInput {
    /// Locations to visit in order (names or `[lat, lng]` waypoints).
    #[serde(default)]
    pub waypoints: Option<Vec<WaypointArg>>,

    /// Free-text description of the route, used when waypoints are unclear.
    #[serde(default)]
    pub route_description: Option<String>,

    /// Travel mode: "driving", "walking", or "transit" (default: "driving").
    #[serde(default = "default_route_type")]
    pub route_type: String,
}

fn default_route_type() -> String {
    "driving".to_string()
}

/// Input for the search_restaurants tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchRestaurantsInput {
    /// City or location name (required).
    pub location: String,

    /// Cuisine or food type filter (optional).
    #[serde(default)]
    pub food_type: Option<String>,

    /// Number of diners (default: 1).
    #[serde(default)]
    pub num_guests: Option<u32>,

    /// Maximum estimated price per person in USD (optional filter).
    #[serde(default)]
    pub max_price_per_person: Option<f64>,

    /// Minimum star rating (optional filter).
    #[serde(default)]
    pub min_rating: Option<f64>,
}

/// Input for the get_activities tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetActivitiesInput {
    /// City or location name (required).
    pub location: String,

    /// Number of participants (default: 1).
    #[serde(default)]
    pub num_guests: Option<u32>,

    /// Maximum estimated price per person in USD (optional filter).
    #[serde(default)]
    pub max_price_per_person: Option<f64>,

    /// Minimum star rating (optional filter).
    #[serde(default)]
    pub min_rating: Option<f64>,
}

/// Input for the search_hotels tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchHotelsInput {
    /// City or location name (required).
    pub location: String,

    /// Number of guests (default: 1).
    #[serde(default)]
    pub num_guests: Option<u32>,

    /// Number of rooms (default: two guests per room, rounded up).
    #[serde(default)]
    pub num_rooms: Option<u32>,

    /// Number of nights (default: 1).
    #[serde(default)]
    pub nights: Option<u32>,

    /// Maximum estimated price per room-night in USD (optional filter).
    #[serde(default)]
    pub max_price_per_night: Option<f64>,

    /// Minimum star rating (optional filter).
    #[serde(default)]
    pub min_rating: Option<f64>,
}

/// Input for the add_to_itinerary tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddToItineraryInput {
    /// Name of the restaurant, hotel, or activity (required).
    pub item_name: String,

    /// Item category: "restaurant", "hotel", or "activity" (required).
    pub item_type: String,

    /// Total estimated cost in USD (required).
    pub estimated_cost: f64,

    /// Cost description (e.g., "$35/person"); defaults to the dollar total.
    #[serde(default)]
    pub cost_label: Option<String>,

    /// Location or address of the item.
    #[serde(default)]
    pub location: Option<String>,
}

/// Input for the remove_from_itinerary tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveFromItineraryInput {
    /// Name of the item to remove (required).
    pub item_name: String,
}

/// Input for the clear_itinerary tool (no parameters).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ClearItineraryInput {}

/// Input for the generate_booking_payment tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateBookingPaymentInput {
    /// Total hotel cost in USD, paid now (default: 0).
    #[serde(default)]
    pub hotel_cost: f64,

    /// Total activities cost in USD, paid now (default: 0).
    #[serde(default)]
    pub activities_cost: f64,

    /// Estimated restaurant cost in USD, paid later at the venue (default: 0).
    #[serde(default)]
    pub restaurant_cost: f64,

    /// Description of the trip or booking.
    #[serde(default = "default_booking_description")]
    pub item_description: String,
}

fn default_booking_description() -> String {
    "booking".to_string()
}

/// Input for the confirm_payment tool (no parameters).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ConfirmPaymentInput {}

// ============================================================================
// TOOL OUTPUTS
// ============================================================================

/// Output from the itinerary tools.
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryOutput {
    /// "added", "removed", or "cleared".
    pub status: String,

    /// Name of the affected item, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

/// Output from the generate_booking_payment tool.
#[derive(Debug, Clone, Serialize)]
pub struct BookingPaymentOutput {
    /// Always "pending_confirmation" until the user confirms.
    pub status: String,

    /// Human-readable summary for the orchestrator to speak.
    pub message: String,

    pub paid_now_usd: f64,
    pub pay_later_usd: f64,
    pub estimated_total_usd: f64,
    pub amount_sol: f64,
    pub item_description: String,
}

/// Output from the confirm_payment tool.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPaymentOutput {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_arg_accepts_names_and_pairs() {
        let args: Vec<WaypointArg> = serde_json::from_str(
            r#"["Oakland", {"location": "Berkeley", "coordinates": [37.8715, -122.273]}]"#,
        )
        .expect("deserialize");

        assert_eq!(args.len(), 2);
        match WaypointSpec::from(args[1].clone()) {
            WaypointSpec::Pinned { coordinates, .. } => {
                assert!((coordinates.lat - 37.8715).abs() < 1e-9);
            }
            WaypointSpec::Name(_) => panic!("expected a pinned waypoint"),
        }
    }

    #[test]
    fn update_map_defaults_to_driving() {
        let input: UpdateMapInput =
            serde_json::from_str(r#"{"waypoints": ["Oakland", "Berkeley"]}"#).expect("deserialize");
        assert_eq!(input.route_type, "driving");
        assert!(input.route_description.is_none());
    }

    #[test]
    fn booking_payment_defaults() {
        let input: GenerateBookingPaymentInput =
            serde_json::from_str(r#"{"hotel_cost": 300.0}"#).expect("deserialize");
        assert_eq!(input.hotel_cost, 300.0);
        assert_eq!(input.activities_cost, 0.0);
        assert_eq!(input.item_description, "booking");
    }

    #[test]
    fn input_schemas_derive() {
        let schema = schemars::schema_for!(SearchHotelsInput);
        let json = serde_json::to_value(&schema).expect("serialize schema");
        assert!(json["properties"].get("location").is_some());
        assert!(json["properties"].get("nights").is_some());
    }
}
