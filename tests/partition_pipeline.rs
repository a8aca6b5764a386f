//! Partition pipeline integration tests — placemarks → per-vehicle dictionaries → per-vehicle missions.

use assert_approx_eq::assert_approx_eq;

use missionc::dsl::Compiler;
use missionc::mission::model::TaskKind;
use missionc::waypoint::partition::slice_bounds;
use missionc::waypoint::{partition_kml, PartitionError, PartitionPlan};

/// Ten-point line plus the launch point and one unusable placemark.
fn survey_kml() -> String {
    let coords: Vec<String> = (0..10)
        .map(|i| format!("-79.9{i},40.4{i},0"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
  <Placemark><name>takeoff</name><Point><coordinates>-79.9,40.4,0</coordinates></Point></Placemark>
  <Placemark><name>field</name><LineString><coordinates>{}</coordinates></LineString></Placemark>
  <Placemark><name>lake</name><Polygon><outerBoundaryIs><LinearRing>
    <coordinates>-80.0,40.0 -80.1,40.1 -80.2,40.2 -80.0,40.0</coordinates>
  </LinearRing></outerBoundaryIs></Polygon></Placemark>
  <Placemark><name>broken</name><LineString><coordinates>nonsense</coordinates></LineString></Placemark>
</Document></kml>"#,
        coords.join(" ")
    )
}

fn plan(n: usize) -> PartitionPlan {
    PartitionPlan::new((1..=n).map(|i| format!("drone{i}")).collect(), 15.0)
}

const MISSION: &str = "task { detect sweep { way_points: <field>, gimbal_pitch: -90, \
    drone_rotation: 0, sample_rate: 1, hover_delay: 2, model: coco } } \
    mission { start: sweep }";

#[test]
fn ten_points_three_vehicles_contiguous_with_stepped_altitude() {
    let report = partition_kml(&survey_kml(), &plan(3)).expect("partition failed");
    assert_eq!(report.assignment.len(), 3);

    let slices: Vec<_> = report
        .assignment
        .values()
        .map(|dict| dict.get("field").unwrap().to_vec())
        .collect();

    for pair in slices.windows(2) {
        let end = pair[0].last().unwrap();
        let start = pair[1].first().unwrap();
        assert_eq!(
            (end.longitude(), end.latitude()),
            (start.longitude(), start.latitude())
        );
    }
    let covered: usize = slices.iter().map(|s| s.len() - 1).sum();
    assert_eq!(covered, 9);
    assert_eq!(slices[0][0].longitude(), "-79.90");
    assert_eq!(slices[2].last().unwrap().longitude(), "-79.99");

    for (k, slice) in slices.iter().enumerate() {
        for point in slice {
            let alt: f64 = point.altitude().parse().unwrap();
            assert_approx_eq!(alt, 15.0 + 3.0 * (k as f64 + 1.0));
        }
    }
}

#[test]
fn bounds_match_slices() {
    assert_eq!(slice_bounds(10, 3), vec![(0, 3), (3, 6), (6, 9)]);
}

#[test]
fn unusable_areas_are_reported_not_fatal() {
    let report = partition_kml(&survey_kml(), &plan(2)).unwrap();
    assert_eq!(
        report.issues,
        vec![PartitionError::MissingCoordinates {
            area: "broken".into()
        }]
    );
    let areas: Vec<_> = report.assignment["drone1"]
        .areas()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(areas, vec!["field", "lake"]);
}

#[test]
fn each_vehicle_compiles_against_its_own_slice() {
    let report = partition_kml(&survey_kml(), &plan(3)).unwrap();

    let mut starts = Vec::new();
    for (vehicle, dict) in &report.assignment {
        let compiled = Compiler::compile(MISSION, dict)
            .unwrap_or_else(|e| panic!("{vehicle}: {e}"));
        let TaskKind::Detect(survey) = &compiled.mission.task("sweep").unwrap().kind else {
            panic!("sweep should be a detect task");
        };
        starts.push(survey.way_points[0].longitude);
    }
    assert_approx_eq!(starts[0], -79.90);
    assert_approx_eq!(starts[1], -79.93);
    assert_approx_eq!(starts[2], -79.96);
}

#[test]
fn malformed_document_aborts() {
    let err = partition_kml("<kml><Placemark><name>x</kml>", &plan(1)).unwrap_err();
    assert!(matches!(err, PartitionError::MalformedDocument { .. }));
}
