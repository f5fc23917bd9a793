//! Geospatial value types and helpers.
//!
//! # Responsibility
//! - Model RFC 7946 point feature collections with serde.
//! - Provide great-circle distance, bounding boxes and distance labels.
//!
//! # Invariants
//! - Positions are always `[lon, lat]`.
//! - A feature collection is never absent; "no data" is an empty collection.

mod distance;

pub use distance::{format_distance_km, haversine_km, EARTH_RADIUS_KM};

use serde::{Deserialize, Serialize};

/// GeoJSON point geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct Point {
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

/// GeoJSON feature with typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature<P> {
    pub geometry: Point,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn point(position: [f64; 2], properties: P) -> Self {
        Self {
            geometry: Point {
                coordinates: position,
            },
            properties,
        }
    }
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::empty()
    }
}

/// `[west, south, east, north]` extent of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Bounding box of every point in `collection`, or `None` when it is empty.
pub fn bbox<P>(collection: &FeatureCollection<P>) -> Option<BoundingBox> {
    let mut positions = collection
        .features
        .iter()
        .map(|feature| feature.geometry.coordinates);
    let [lon, lat] = positions.next()?;
    let initial = BoundingBox {
        west: lon,
        south: lat,
        east: lon,
        north: lat,
    };
    Some(positions.fold(initial, |acc, [lon, lat]| BoundingBox {
        west: acc.west.min(lon),
        south: acc.south.min(lat),
        east: acc.east.max(lon),
        north: acc.north.max(lat),
    }))
}
