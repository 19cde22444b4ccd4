//! Search-result path: curated place lookups with populated cost estimates.
//!
//! The catalog resolves the query location, produces a small curated result
//! set centered on it, and populates cost estimates on every item before the
//! result is returned or broadcast, so the conversation and the display
//! surface always see the same prices.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cost::{CostEstimator, ItemCategory};
use crate::geo::Coordinate;
use crate::geocode::LocationResolver;

/// Rooms default to two guests per room, rounded up.
pub fn default_rooms(guests: u32) -> u32 {
    guests.div_ceil(2).max(1)
}

/// Query for restaurant searches.
#[derive(Debug, Clone)]
pub struct RestaurantQuery {
    pub location: String,
    pub food_type: Option<String>,
    pub num_guests: u32,
    pub max_price_per_person: Option<f64>,
    pub min_rating: Option<f64>,
}

/// Query for activity searches.
#[derive(Debug, Clone)]
pub struct ActivityQuery {
    pub location: String,
    pub num_guests: u32,
    pub max_price_per_person: Option<f64>,
    pub min_rating: Option<f64>,
}

/// Query for hotel searches.
#[derive(Debug, Clone)]
pub struct HotelQuery {
    pub location: String,
    pub num_guests: u32,
    pub num_rooms: u32,
    pub nights: u32,
    pub max_price_per_night: Option<f64>,
    pub min_rating: Option<f64>,
}

/// A restaurant hit with populated cost fields.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantHit {
    pub name: String,
    pub rating: f64,
    pub price: String,
    pub address: String,
    pub coordinates: Coordinate,
    pub estimated_cost_per_person: u32,
    pub estimated_total: u32,
    pub price_display: String,
}

/// An activity hit with populated cost fields.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityHit {
    pub name: String,
    pub rating: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: String,
    pub address: String,
    pub coordinates: Coordinate,
    pub estimated_cost_per_person: u32,
    pub estimated_total: u32,
    pub price_display: String,
}

/// A hotel hit with populated cost fields.
#[derive(Debug, Clone, Serialize)]
pub struct HotelHit {
    pub name: String,
    pub rating: f64,
    pub price: String,
    pub address: String,
    pub coordinates: Coordinate,
    pub amenities: Vec<&'static str>,
    pub estimated_cost_per_night: u32,
    pub estimated_total: u32,
    pub price_display: String,
}

/// A search result, broadcast to the map as the `data` payload of a
/// `MAP_UPDATE` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub location: String,
    /// Center coordinates for framing the map.
    pub coordinates: Coordinate,
    pub count: usize,
    pub num_guests: u32,
    /// True when the location resolved via the fallback coordinate.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_rooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurants: Option<Vec<RestaurantHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<ActivityHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotels: Option<Vec<HotelHit>>,
}

/// Curated place catalog backed by the location resolver and cost estimator.
pub struct SearchCatalog {
    resolver: Arc<LocationResolver>,
    estimator: CostEstimator,
}

impl SearchCatalog {
    pub fn new(resolver: Arc<LocationResolver>, estimator: CostEstimator) -> Self {
        Self {
            resolver,
            estimator,
        }
    }

    /// Search restaurants near a location.
    pub async fn restaurants(&self, query: &RestaurantQuery) -> SearchResult {
        let resolution = self.resolver.resolve(&query.location).await;
        let center = resolution.coordinate;
        let cuisine = query
            .food_type
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Restaurant".to_string());

        let candidates = [
            (format!("Amazing {cuisine} 1"), 4.5, "$$", "123 Main St", 0.01, 0.01),
            (format!("Delicious {cuisine} 2"), 4.7, "$$$", "456 Oak Ave", 0.02, -0.01),
            (format!("Top Rated {cuisine} 3"), 4.8, "$", "789 Pine St", -0.01, 0.02),
        ];

        let mut hits = Vec::new();
        for (name, rating, tier, street, dlat, dlng) in candidates {
            let estimate = self.estimator.estimate(
                &name,
                ItemCategory::Restaurant,
                tier,
                &query.location,
                query.num_guests,
            );
            hits.push(RestaurantHit {
                address: format!("{street}, {}", query.location),
                coordinates: Coordinate::new(center.lat + dlat, center.lng + dlng),
                estimated_cost_per_person: estimate.per_unit,
                estimated_total: estimate.total,
                price_display: format!("${}/person", estimate.per_unit),
                name,
                rating,
                price: tier.to_string(),
            });
        }

        hits.retain(|hit| {
            within_price(hit.estimated_cost_per_person, query.max_price_per_person)
                && meets_rating(hit.rating, query.min_rating)
        });

        debug!(location = %query.location, count = hits.len(), "restaurant search complete");

        SearchResult {
            location: query.location.clone(),
            coordinates: center,
            count: hits.len(),
            num_guests: query.num_guests,
            degraded: resolution.degraded,
            food_type: query.food_type.clone().filter(|s| !s.trim().is_empty()),
            num_rooms: None,
            nights: None,
            restaurants: Some(hits),
            activities: None,
            hotels: None,
        }
    }

    /// Search activities and attractions near a location.
    pub async fn activities(&self, query: &ActivityQuery) -> SearchResult {
        let resolution = self.resolver.resolve(&query.location).await;
        let center = resolution.coordinate;
        let location = &query.location;

        let candidates = [
            (format!("Historic Landmark in {location}"), 4.6, "Attraction", "$", "100 Heritage Blvd", 0.015, 0.015),
            (format!("Scenic Viewpoint in {location}"), 4.8, "Viewpoint", "Free", "200 Mountain Rd", -0.015, 0.02),
            (format!("Cultural Museum in {location}"), 4.7, "Museum", "$$", "300 Culture Ave", 0.02, -0.015),
        ];

        let mut hits = Vec::new();
        for (name, rating, kind, tier, street, dlat, dlng) in candidates {
            let estimate = self.estimator.estimate(
                &name,
                ItemCategory::Activity,
                tier,
                location,
                query.num_guests,
            );
            hits.push(ActivityHit {
                address: format!("{street}, {location}"),
                coordinates: Coordinate::new(center.lat + dlat, center.lng + dlng),
                estimated_cost_per_person: estimate.per_unit,
                estimated_total: estimate.total,
                price_display: if estimate.per_unit > 0 {
                    format!("${}/person", estimate.per_unit)
                } else {
                    "Free".to_string()
                },
                name,
                rating,
                kind: kind.to_string(),
                price: tier.to_string(),
            });
        }

        hits.retain(|hit| {
            within_price(hit.estimated_cost_per_person, query.max_price_per_person)
                && meets_rating(hit.rating, query.min_rating)
        });

        debug!(location = %query.location, count = hits.len(), "activity search complete");

        SearchResult {
            location: query.location.clone(),
            coordinates: center,
            count: hits.len(),
            num_guests: query.num_guests,
            degraded: resolution.degraded,
            food_type: None,
            num_rooms: None,
            nights: None,
            restaurants: None,
            activities: Some(hits),
            hotels: None,
        }
    }

    /// Search hotels near a location. Totals multiply rooms by nights.
    pub async fn hotels(&self, query: &HotelQuery) -> SearchResult {
        let resolution = self.resolver.resolve(&query.location).await;
        let center = resolution.coordinate;
        let location = &query.location;
        let quantity = query.num_rooms * query.nights;

        let candidates: [(String, f64, &str, &str, Vec<&'static str>, f64, f64); 3] = [
            (
                format!("Luxury Hotel {location}"),
                4.5,
                "$$$",
                "500 Luxury Ln",
                vec!["Pool", "Spa", "Gym", "WiFi"],
                0.01,
                0.01,
            ),
            (
                format!("Budget Inn {location}"),
                4.0,
                "$",
                "600 Budget St",
                vec!["WiFi", "Parking"],
                -0.01,
                0.01,
            ),
            (
                format!("Boutique Hotel {location}"),
                4.7,
                "$$",
                "700 Boutique Ave",
                vec!["WiFi", "Breakfast", "Pet Friendly"],
                0.01,
                -0.01,
            ),
        ];

        let mut hits = Vec::new();
        for (name, rating, tier, street, amenities, dlat, dlng) in candidates {
            let estimate =
                self.estimator
                    .estimate(&name, ItemCategory::Hotel, tier, location, quantity);
            hits.push(HotelHit {
                address: format!("{street}, {location}"),
                coordinates: Coordinate::new(center.lat + dlat, center.lng + dlng),
                amenities,
                estimated_cost_per_night: estimate.per_unit,
                estimated_total: estimate.total,
                price_display: format!("${}/night", estimate.per_unit),
                name,
                rating,
                price: tier.to_string(),
            });
        }

        hits.retain(|hit| {
            within_price(hit.estimated_cost_per_night, query.max_price_per_night)
                && meets_rating(hit.rating, query.min_rating)
        });

        debug!(location = %query.location, count = hits.len(), "hotel search complete");

        SearchResult {
            location: query.location.clone(),
            coordinates: center,
            count: hits.len(),
            num_guests: query.num_guests,
            degraded: resolution.degraded,
            food_type: None,
            num_rooms: Some(query.num_rooms),
            nights: Some(query.nights),
            restaurants: None,
            activities: None,
            hotels: Some(hits),
        }
    }
}

fn within_price(per_unit: u32, limit: Option<f64>) -> bool {
    limit.map_or(true, |max| f64::from(per_unit) <= max)
}

fn meets_rating(rating: f64, minimum: Option<f64>) -> bool {
    minimum.map_or(true, |min| rating >= min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{LocationResolver, StaticGazetteer, FALLBACK_COORDINATE};
    use std::time::Duration;

    fn catalog() -> SearchCatalog {
        let resolver = Arc::new(LocationResolver::new(
            Box::new(StaticGazetteer),
            Duration::from_millis(500),
            FALLBACK_COORDINATE,
        ));
        SearchCatalog::new(resolver, CostEstimator::new())
    }

    #[tokio::test]
    async fn restaurants_are_centered_and_priced() {
        let result = catalog()
            .restaurants(&RestaurantQuery {
                location: "Berkeley".to_string(),
                food_type: Some("Thai".to_string()),
                num_guests: 2,
                max_price_per_person: None,
                min_rating: None,
            })
            .await;

        assert_eq!(result.count, 3);
        assert!(!result.degraded);
        assert!((result.coordinates.lat - 37.8715).abs() < 0.01);

        let hits = result.restaurants.expect("restaurants present");
        for hit in &hits {
            assert!(hit.name.contains("Thai"));
            assert!(hit.estimated_cost_per_person > 0);
            assert_eq!(hit.estimated_total, hit.estimated_cost_per_person * 2);
            assert!(hit.price_display.ends_with("/person"));
        }
    }

    #[tokio::test]
    async fn restaurant_pricing_is_stable_across_searches() {
        let catalog = catalog();
        let query = RestaurantQuery {
            location: "Oakland".to_string(),
            food_type: None,
            num_guests: 1,
            max_price_per_person: None,
            min_rating: None,
        };

        let first = catalog.restaurants(&query).await.restaurants.expect("hits");
        let second = catalog.restaurants(&query).await.restaurants.expect("hits");

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.estimated_cost_per_person, b.estimated_cost_per_person);
        }
    }

    #[tokio::test]
    async fn rating_filter_drops_low_rated_hits() {
        let result = catalog()
            .hotels(&HotelQuery {
                location: "Chicago".to_string(),
                num_guests: 2,
                num_rooms: 1,
                nights: 2,
                max_price_per_night: None,
                min_rating: Some(4.4),
            })
            .await;

        let hits = result.hotels.expect("hotels present");
        // Budget Inn rates 4.0 and is filtered out.
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.rating >= 4.4));
        assert_eq!(result.count, 2);
    }

    #[tokio::test]
    async fn hotel_totals_multiply_rooms_and_nights() {
        let result = catalog()
            .hotels(&HotelQuery {
                location: "Miami".to_string(),
                num_guests: 4,
                num_rooms: 2,
                nights: 3,
                max_price_per_night: None,
                min_rating: None,
            })
            .await;

        let hits = result.hotels.expect("hotels present");
        for hit in &hits {
            assert_eq!(hit.estimated_total, hit.estimated_cost_per_night * 6);
        }
        assert_eq!(result.num_rooms, Some(2));
        assert_eq!(result.nights, Some(3));
    }

    #[tokio::test]
    async fn free_activities_display_free() {
        let result = catalog()
            .activities(&ActivityQuery {
                location: "Paris".to_string(),
                num_guests: 2,
                max_price_per_person: None,
                min_rating: None,
            })
            .await;

        let hits = result.activities.expect("activities present");
        let viewpoint = hits
            .iter()
            .find(|hit| hit.price == "Free")
            .expect("free-tier activity exists");
        assert_eq!(viewpoint.estimated_cost_per_person, 0);
        assert_eq!(viewpoint.price_display, "Free");
    }

    #[tokio::test]
    async fn unknown_location_marks_result_degraded() {
        let result = catalog()
            .restaurants(&RestaurantQuery {
                location: "Atlantis".to_string(),
                food_type: None,
                num_guests: 1,
                max_price_per_person: None,
                min_rating: None,
            })
            .await;

        assert!(result.degraded);
        assert_eq!(result.coordinates, FALLBACK_COORDINATE);
    }

    #[test]
    fn rooms_default_to_two_guests_per_room() {
        assert_eq!(default_rooms(1), 1);
        assert_eq!(default_rooms(2), 1);
        assert_eq!(default_rooms(3), 2);
        assert_eq!(default_rooms(5), 3);
        assert_eq!(default_rooms(0), 1);
    }
}
