//! Waypoints — the area dictionary, placemark ingestion, and vehicle partitioning.

pub mod dictionary;
pub mod kml;
pub mod partition;

pub use dictionary::{RawWaypoint, WaypointDictionary};
pub use partition::{partition_kml, PartitionPlan, PartitionReport, VehicleAssignment};

/// Problems found while ingesting or partitioning placemarks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("malformed placemark document: {message}")]
    MalformedDocument { message: String },

    #[error("placemark #{index} has no name")]
    MissingName { index: usize },

    #[error("area '{area}' has no usable coordinates")]
    MissingCoordinates { area: String },

    #[error("area '{area}' is declared more than once; later copies skipped")]
    DuplicateArea { area: String },

    #[error("no vehicles to partition across")]
    NoVehicles,

    #[error("vehicle '{id}' is listed more than once")]
    DuplicateVehicle { id: String },

    #[error("placemark source contains no usable areas")]
    NoAreas,
}
