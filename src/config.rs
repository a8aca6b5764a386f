//! Compiler configuration — defaults, optionally overridden by ~/.missionc/config.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MissionError;

/// Compiler configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Altitude the first vehicle's step is added to.
    #[serde(default = "default_altitude_base")]
    pub altitude_base: f64,
    /// Vertical separation between consecutive vehicles.
    #[serde(default = "default_altitude_step")]
    pub altitude_step: f64,
    #[serde(default = "default_vehicles")]
    pub vehicles: Vec<String>,
    /// Directory that receives one subdirectory per vehicle.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_mission_file_name")]
    pub mission_file_name: String,
    #[serde(default = "default_waypoint_file_name")]
    pub waypoint_file_name: String,
}

fn default_altitude_base() -> f64 {
    15.0
}

fn default_altitude_step() -> f64 {
    crate::waypoint::partition::ALTITUDE_STEP
}

fn default_vehicles() -> Vec<String> {
    vec!["drone1".to_string()]
}

fn default_output_root() -> PathBuf {
    PathBuf::from("generated")
}

fn default_mission_file_name() -> String {
    "mission.py".to_string()
}

fn default_waypoint_file_name() -> String {
    "waypoints.json".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            altitude_base: default_altitude_base(),
            altitude_step: default_altitude_step(),
            vehicles: default_vehicles(),
            output_root: default_output_root(),
            mission_file_name: default_mission_file_name(),
            waypoint_file_name: default_waypoint_file_name(),
        }
    }
}

/// Standard config path (~/.missionc/config.yaml).
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".missionc").join("config.yaml"))
}

impl CompilerConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from an explicit file. The file must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self, MissionError> {
        let content = std::fs::read_to_string(path).map_err(|source| MissionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| MissionError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` when given, else from the standard path, else defaults.
    ///
    /// A missing standard file falls back to defaults; an unreadable or
    /// invalid one is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, MissionError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }
}
