//! Crate-level error type for the driver and CLI.

use std::path::PathBuf;

use crate::dsl::CompileError;
use crate::waypoint::PartitionError;

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    /// DSL failure, tagged with the source file and vehicle being compiled.
    #[error("{path}{}: {source}", vehicle_suffix(.vehicle))]
    Compile {
        path: PathBuf,
        vehicle: Option<String>,
        #[source]
        source: CompileError,
    },

    #[error("{path}: {source}")]
    Partition {
        path: PathBuf,
        #[source]
        source: PartitionError,
    },

    #[error("{path}: invalid waypoint dictionary: {source}")]
    Waypoints {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: invalid config: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no vehicles configured")]
    NoVehicles,

    #[error("invalid vehicle id '{id}': use letters, digits, '_' or '-'")]
    InvalidVehicle { id: String },

    #[error("vehicle '{id}' is listed more than once")]
    DuplicateVehicle { id: String },

    #[error("failed to serialise waypoints: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn vehicle_suffix(vehicle: &Option<String>) -> String {
    vehicle
        .as_deref()
        .map(|v| format!(" (vehicle {v})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, MissionError>;
