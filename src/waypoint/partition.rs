//! Per-vehicle partitioning of survey areas.
//!
//! Each area's polyline is cut into one contiguous slice per vehicle. Slices
//! cover ⌈(len − 1) / N⌉ edges and share their boundary point with the next
//! slice; the last vehicle always runs to the end of the list. Within an area
//! every vehicle flies one altitude step above the previous one.

use indexmap::IndexMap;
use tracing::{debug, info};

use super::dictionary::{RawWaypoint, WaypointDictionary};
use super::kml::{collect_areas, read_placemarks, Area};
use super::PartitionError;

/// Vehicle ID → that vehicle's waypoint dictionary, in vehicle-list order.
pub type VehicleAssignment = IndexMap<String, WaypointDictionary>;

/// Default vertical separation between consecutive vehicles.
pub const ALTITUDE_STEP: f64 = 3.0;

/// Inputs that shape a partition besides the areas themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPlan {
    pub vehicles: Vec<String>,
    pub altitude_base: f64,
    pub altitude_step: f64,
}

impl PartitionPlan {
    pub fn new(vehicles: Vec<String>, altitude_base: f64) -> Self {
        Self {
            vehicles,
            altitude_base,
            altitude_step: ALTITUDE_STEP,
        }
    }
}

/// A finished partition plus the per-area problems that were skipped over.
#[derive(Debug, Clone)]
pub struct PartitionReport {
    pub assignment: VehicleAssignment,
    pub issues: Vec<PartitionError>,
}

/// Inclusive `(start, end)` index ranges, one per vehicle, over a list of `len` points.
pub fn slice_bounds(len: usize, vehicles: usize) -> Vec<(usize, usize)> {
    if len == 0 || vehicles == 0 {
        return Vec::new();
    }
    let last = len - 1;
    let size = last.div_ceil(vehicles);

    (0..vehicles)
        .map(|i| {
            let start = (i * size).min(last);
            let end = if i + 1 == vehicles {
                last
            } else {
                (i * size + size).min(last)
            };
            (start, end)
        })
        .collect()
}

/// Split every area across the plan's vehicles.
pub fn partition(areas: &[Area], plan: &PartitionPlan) -> Result<VehicleAssignment, PartitionError> {
    if plan.vehicles.is_empty() {
        return Err(PartitionError::NoVehicles);
    }
    if let Some(id) = first_duplicate(&plan.vehicles) {
        return Err(PartitionError::DuplicateVehicle { id: id.to_string() });
    }
    if areas.is_empty() {
        return Err(PartitionError::NoAreas);
    }

    let mut assignment: VehicleAssignment = plan
        .vehicles
        .iter()
        .map(|v| (v.clone(), WaypointDictionary::new()))
        .collect();

    for area in areas {
        let bounds = slice_bounds(area.points.len(), plan.vehicles.len());
        let mut altitude = plan.altitude_base;

        for (vehicle, (start, end)) in plan.vehicles.iter().zip(bounds) {
            altitude += plan.altitude_step;
            let alt = format_altitude(altitude);
            let slice = area.points[start..=end]
                .iter()
                .map(|(lon, lat)| RawWaypoint::new(lon.as_str(), lat.as_str(), alt.as_str()))
                .collect();

            debug!(
                area = %area.name,
                vehicle = %vehicle,
                start,
                end,
                altitude = %alt,
                "assigned slice"
            );
            if let Some(dict) = assignment.get_mut(vehicle) {
                dict.insert(area.name.clone(), slice);
            }
        }
    }

    Ok(assignment)
}

/// Ingest a placemark document and partition its areas.
///
/// Per-area problems are collected in the report; the call only fails when
/// the document is unreadable or nothing usable remains.
pub fn partition_kml(xml: &str, plan: &PartitionPlan) -> Result<PartitionReport, PartitionError> {
    let placemarks = read_placemarks(xml)?;
    let (areas, issues) = collect_areas(&placemarks);
    let assignment = partition(&areas, plan)?;

    info!(
        areas = areas.len(),
        vehicles = plan.vehicles.len(),
        skipped = issues.len(),
        "partitioned placemark areas"
    );
    Ok(PartitionReport { assignment, issues })
}

/// First ID that repeats an earlier one.
pub fn first_duplicate(ids: &[String]) -> Option<&str> {
    ids.iter()
        .enumerate()
        .find(|(i, id)| ids[..*i].contains(*id))
        .map(|(_, id)| id.as_str())
}

fn format_altitude(altitude: f64) -> String {
    format!("{altitude}")
}
