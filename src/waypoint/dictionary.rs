//! Waypoint dictionary — named areas mapped to ordered coordinate triples.
//!
//! Coordinates stay as the strings the placemark source supplied; they are
//! only parsed when a task references the area.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::mission::model::GeoPoint;

/// A `(longitude, latitude, altitude)` triple as supplied by the ingester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWaypoint(pub String, pub String, pub String);

impl RawWaypoint {
    pub fn new(
        longitude: impl Into<String>,
        latitude: impl Into<String>,
        altitude: impl Into<String>,
    ) -> Self {
        Self(longitude.into(), latitude.into(), altitude.into())
    }

    pub fn longitude(&self) -> &str {
        &self.0
    }

    pub fn latitude(&self) -> &str {
        &self.1
    }

    pub fn altitude(&self) -> &str {
        &self.2
    }

    /// Parse into a numeric point. The error names the offending field.
    pub fn to_geo_point(&self) -> Result<GeoPoint, String> {
        let parse = |field: &str, value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("{field} '{value}' is not a number"))
        };
        Ok(GeoPoint {
            longitude: parse("longitude", &self.0)?,
            latitude: parse("latitude", &self.1)?,
            altitude: parse("altitude", &self.2)?,
        })
    }
}

/// Area name → ordered waypoints, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointDictionary {
    areas: IndexMap<String, Vec<RawWaypoint>>,
}

impl WaypointDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an area.
    pub fn insert(&mut self, area: impl Into<String>, points: Vec<RawWaypoint>) {
        self.areas.insert(area.into(), points);
    }

    pub fn get(&self, area: &str) -> Option<&[RawWaypoint]> {
        self.areas.get(area).map(Vec::as_slice)
    }

    pub fn areas(&self) -> impl Iterator<Item = (&str, &[RawWaypoint])> {
        self.areas.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
