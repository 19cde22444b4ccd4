//! Axis-aligned geometry helpers used to frame map views.
//!
//! Coordinates are serialized as `[lat, lng]` pairs on the wire, matching
//! what the display surface expects for path and marker geometry.

use serde::{Deserialize, Serialize};

/// Minimum half-width applied per axis so that coincident or collinear
/// points still produce a positive-area box.
pub const MIN_PADDING_DEG: f64 = 0.01;

/// Padding fraction applied to route bounds before broadcast.
pub const ROUTE_PADDING_FRACTION: f64 = 0.15;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both axes fall inside the valid latitude/longitude domains.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[0],
            lng: pair[1],
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.lat, coordinate.lng]
    }
}

/// An axis-aligned bounding box covering a point set plus padding.
///
/// Invariant: `north >= south` and `east >= west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// Whether the box contains the given point.
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }
}

/// Compute a padded bounding box for a set of points.
///
/// Returns `None` for an empty point set. Padding per axis is
/// `max(axis_range * padding_fraction, MIN_PADDING_DEG)`, applied
/// symmetrically outward, so even a single repeated point yields a
/// positive-area box.
pub fn compute_bounds(points: &[Coordinate], padding_fraction: f64) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut north = f64::NEG_INFINITY;
    let mut south = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut west = f64::INFINITY;

    for point in points {
        north = north.max(point.lat);
        south = south.min(point.lat);
        east = east.max(point.lng);
        west = west.min(point.lng);
    }

    let lat_pad = ((north - south) * padding_fraction).max(MIN_PADDING_DEG);
    let lng_pad = ((east - west) * padding_fraction).max(MIN_PADDING_DEG);

    Some(Bounds {
        north: north + lat_pad,
        south: south - lat_pad,
        east: east + lng_pad,
        west: west - lng_pad,
    })
}
