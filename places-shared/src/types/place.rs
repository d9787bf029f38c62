//! Place document types for the search index.
//!
//! This module defines the document structure that is indexed in the search
//! engine and returned by the directory and recommendation queries.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// Stored in the search index as a geo-point field so distance queries can
/// sort by proximity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geo point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are finite numbers.
    ///
    /// Every indexed place must hold a finite location; `NaN` and infinities
    /// parse as valid `f64`s but cannot be indexed as a geo-point.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Document representation of one place in the directory.
///
/// # Fields
///
/// - `id`: unique identifier, assigned as source row index + 1 (1-based)
/// - `name`: display name of the place
/// - `address`: postal address, may be empty
/// - `phone`: contact phone number, may be empty
/// - `location`: geo coordinates, always finite for indexed places
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub location: GeoPoint,
}

impl Place {
    /// Create a new place document.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            location,
        }
    }

    /// The document ID used in the search index.
    ///
    /// Keyed by the place id so re-ingesting the same source overwrites
    /// documents instead of duplicating them.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id() {
        let place = Place::new(42, "Cafe", "1 Main St", "555-0101", GeoPoint::new(55.75, 37.61));
        assert_eq!(place.document_id(), "42");
    }

    #[test]
    fn test_geo_point_finite() {
        assert!(GeoPoint::new(55.75, 37.61).is_finite());
        assert!(!GeoPoint::new(f64::NAN, 37.61).is_finite());
        assert!(!GeoPoint::new(55.75, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_serialization() {
        let place = Place::new(7, "Bakery", "2 Side St", "", GeoPoint::new(-33.86, 151.2));

        let json = serde_json::to_string(&place).unwrap();
        let deserialized: Place = serde_json::from_str(&json).unwrap();

        assert_eq!(place, deserialized);
    }

    #[test]
    fn test_json_shape() {
        let place = Place::new(1, "Bar", "3 High St", "555-0102", GeoPoint::new(1.0, 2.0));
        let value = serde_json::to_value(&place).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["name"], "Bar");
        assert_eq!(value["address"], "3 High St");
        assert_eq!(value["phone"], "555-0102");
        assert_eq!(value["location"]["lat"], 1.0);
        assert_eq!(value["location"]["lon"], 2.0);
    }
}
