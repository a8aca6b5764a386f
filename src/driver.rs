//! File-level orchestration: read inputs, compile per vehicle, write outputs.
//!
//! Every compile finishes before the first file is written, so a failing
//! mission never leaves a partial output tree behind.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::dsl::{CompiledMission, Compiler};
use crate::error::{MissionError, Result};
use crate::mission::Mission;
use crate::waypoint::partition::first_duplicate;
use crate::waypoint::{partition_kml, PartitionPlan, PartitionReport, WaypointDictionary};

/// Where a compile gets its waypoint areas from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaypointSource {
    /// No areas; only inline waypoints resolve.
    None,
    /// A ready-made dictionary shared by every vehicle.
    Dictionary(PathBuf),
    /// A placemark document partitioned across the vehicles.
    Kml(PathBuf),
}

/// One vehicle's compiled mission and the dictionary it was compiled against.
#[derive(Debug, Clone)]
pub struct VehicleOutput {
    pub vehicle: String,
    pub compiled: CompiledMission,
    pub waypoints: WaypointDictionary,
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| MissionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a waypoint dictionary from JSON.
pub fn load_waypoints(path: &Path) -> Result<WaypointDictionary> {
    let json = read_text(path)?;
    WaypointDictionary::from_json(&json).map_err(|source| MissionError::Waypoints {
        path: path.to_path_buf(),
        source,
    })
}

/// Partition a placemark file. Per-area problems are logged and skipped.
pub fn partition_file(path: &Path, plan: &PartitionPlan) -> Result<PartitionReport> {
    let xml = read_text(path)?;
    let report = partition_kml(&xml, plan).map_err(|source| MissionError::Partition {
        path: path.to_path_buf(),
        source,
    })?;
    for issue in &report.issues {
        warn!(path = %path.display(), "{issue}");
    }
    Ok(report)
}

fn plan_for(config: &CompilerConfig) -> PartitionPlan {
    PartitionPlan {
        vehicles: config.vehicles.clone(),
        altitude_base: config.altitude_base,
        altitude_step: config.altitude_step,
    }
}

/// Vehicle IDs name output directories: non-empty, `[A-Za-z0-9_-]` only,
/// and unique.
pub fn check_vehicles(ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(MissionError::NoVehicles);
    }
    let valid = |id: &str| {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    if let Some(id) = ids.iter().find(|id| !valid(id)) {
        return Err(MissionError::InvalidVehicle { id: id.clone() });
    }
    if let Some(id) = first_duplicate(ids) {
        return Err(MissionError::DuplicateVehicle { id: id.to_string() });
    }
    Ok(())
}

/// Resolve the per-vehicle dictionaries for `source`, in vehicle order.
pub fn vehicle_dictionaries(
    source: &WaypointSource,
    config: &CompilerConfig,
) -> Result<Vec<(String, WaypointDictionary)>> {
    check_vehicles(&config.vehicles)?;
    match source {
        WaypointSource::Kml(path) => {
            let report = partition_file(path, &plan_for(config))?;
            Ok(report.assignment.into_iter().collect())
        }
        WaypointSource::Dictionary(path) => {
            let dict = load_waypoints(path)?;
            Ok(config
                .vehicles
                .iter()
                .map(|v| (v.clone(), dict.clone()))
                .collect())
        }
        WaypointSource::None => Ok(config
            .vehicles
            .iter()
            .map(|v| (v.clone(), WaypointDictionary::new()))
            .collect()),
    }
}

/// Compile `dsl` once per vehicle. Nothing is written.
pub fn compile_all(
    dsl: &Path,
    source: &WaypointSource,
    config: &CompilerConfig,
) -> Result<Vec<VehicleOutput>> {
    let text = read_text(dsl)?;
    let dictionaries = vehicle_dictionaries(source, config)?;

    dictionaries
        .into_iter()
        .map(|(vehicle, waypoints)| {
            let compiled =
                Compiler::compile(&text, &waypoints).map_err(|source| MissionError::Compile {
                    path: dsl.to_path_buf(),
                    vehicle: Some(vehicle.clone()),
                    source,
                })?;
            debug!(vehicle = %vehicle, tasks = compiled.mission.tasks.len(), "vehicle compiled");
            Ok(VehicleOutput {
                vehicle,
                compiled,
                waypoints,
            })
        })
        .collect()
}

/// Write `<root>/<vehicle>/<mission file>` and the vehicle's waypoint dictionary.
///
/// Files are staged in a scratch directory inside the output root and only
/// moved into place once every vehicle's files exist. A failure before that
/// point leaves the root as it was. Returns the written paths in order.
pub fn write_outputs(outputs: &[VehicleOutput], config: &CompilerConfig) -> Result<Vec<PathBuf>> {
    let ids: Vec<String> = outputs.iter().map(|o| o.vehicle.clone()).collect();
    check_vehicles(&ids)?;

    let root = &config.output_root;
    let file_names = [&config.mission_file_name, &config.waypoint_file_name];
    for out in outputs {
        let dir = root.join(&out.vehicle);
        if dir.exists() && !dir.is_dir() {
            return Err(blocked(dir));
        }
        for name in file_names {
            let path = dir.join(name);
            if path.is_dir() {
                return Err(blocked(path));
            }
        }
    }

    let root_existed = root.exists();
    let staging = match stage(outputs, config) {
        Ok(staging) => staging,
        Err(e) => {
            if !root_existed {
                let _ = fs::remove_dir_all(root);
            }
            return Err(e);
        }
    };

    let mut written = Vec::new();
    for out in outputs {
        let target = root.join(&out.vehicle);
        fs::create_dir_all(&target).map_err(|source| MissionError::Io {
            path: target.clone(),
            source,
        })?;
        for name in file_names {
            let from = staging.path().join(&out.vehicle).join(name);
            let to = target.join(name);
            fs::rename(&from, &to).map_err(|source| MissionError::Io {
                path: to.clone(),
                source,
            })?;
            written.push(to);
        }
    }

    info!(files = written.len(), root = %root.display(), "outputs written");
    Ok(written)
}

fn blocked(path: PathBuf) -> MissionError {
    MissionError::Io {
        path,
        source: io::Error::new(io::ErrorKind::AlreadyExists, "in the way of generated output"),
    }
}

/// Write every vehicle's files under a fresh scratch directory in the output root.
fn stage(outputs: &[VehicleOutput], config: &CompilerConfig) -> Result<TempDir> {
    let root = &config.output_root;
    fs::create_dir_all(root).map_err(|source| MissionError::Io {
        path: root.clone(),
        source,
    })?;
    let staging = tempfile::Builder::new()
        .prefix(".missionc-staging-")
        .tempdir_in(root)
        .map_err(|source| MissionError::Io {
            path: root.clone(),
            source,
        })?;

    for out in outputs {
        let dir = staging.path().join(&out.vehicle);
        fs::create_dir(&dir).map_err(|source| MissionError::Io {
            path: dir.clone(),
            source,
        })?;
        write_file(&dir.join(&config.mission_file_name), &out.compiled.source)?;
        let json = out.waypoints.to_json()?;
        write_file(&dir.join(&config.waypoint_file_name), &json)?;
        debug!(vehicle = %out.vehicle, "staged outputs");
    }
    Ok(staging)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| MissionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile for every vehicle, then write all outputs.
pub fn compile_to_disk(
    dsl: &Path,
    source: &WaypointSource,
    config: &CompilerConfig,
) -> Result<Vec<PathBuf>> {
    let outputs = compile_all(dsl, source, config)?;
    write_outputs(&outputs, config)
}

/// Parse, resolve and validate `dsl` without generating anything.
pub fn check(dsl: &Path, waypoints: Option<&Path>) -> Result<Mission> {
    let text = read_text(dsl)?;
    let dict = match waypoints {
        Some(path) => load_waypoints(path)?,
        None => WaypointDictionary::new(),
    };
    Compiler::analyze(&text, &dict).map_err(|source| MissionError::Compile {
        path: dsl.to_path_buf(),
        vehicle: None,
        source,
    })
}

/// Human-readable task and transition listing.
pub fn summarize(mission: &Mission) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "start: {} ({} task(s), {} transition(s))",
        mission.start,
        mission.tasks.len(),
        mission.transition_count()
    );
    for task in mission.tasks.values() {
        let _ = writeln!(out, "  {} {}", task.kind.name(), task.id);
        for t in &task.transitions {
            let marker = if t.implicit { " (default)" } else { "" };
            let _ = writeln!(out, "    {} -> {}{marker}", t.condition, t.destination);
        }
    }
    out
}
