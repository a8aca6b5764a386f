//! Placemark ingestion from KML-style XML.
//!
//! Only two things are read from each `<Placemark>`: its direct `<name>` child
//! and the text of every `<coordinates>` element beneath it, in document order.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use super::PartitionError;

/// A raw placemark as it appears in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    pub name: Option<String>,
    /// Whitespace-separated `lon,lat[,alt]` tokens.
    pub coordinates: Option<String>,
}

/// A named area with its parsed `(longitude, latitude)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub name: String,
    pub points: Vec<(String, String)>,
}

#[derive(Clone, Copy)]
enum Field {
    Name,
    Coordinates,
}

/// Read every placemark in `xml`, in document order.
pub fn read_placemarks(xml: &str) -> Result<Vec<Placemark>, PartitionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut placemarks = Vec::new();
    let mut current: Option<(usize, Placemark)> = None;
    let mut field: Option<Field> = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| PartitionError::MalformedDocument {
            message: format!("at byte {}: {e}", reader.buffer_position()),
        })?;

        match event {
            Event::Start(e) => {
                depth += 1;
                let placemark_depth = current.as_ref().map(|(d, _)| *d);
                match (e.local_name().as_ref(), placemark_depth) {
                    (b"Placemark", None) => current = Some((depth, Placemark::default())),
                    (b"name", Some(pm_depth)) if depth == pm_depth + 1 => {
                        field = Some(Field::Name)
                    }
                    (b"coordinates", Some(_)) => field = Some(Field::Coordinates),
                    _ => {}
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"Placemark" => {
                        if let Some((_, pm)) = current.take() {
                            placemarks.push(pm);
                        }
                    }
                    b"name" | b"coordinates" => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let (Some((_, pm)), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape().map_err(|e| PartitionError::MalformedDocument {
                        message: e.to_string(),
                    })?;
                    pm.append(f, &text);
                }
            }
            Event::CData(c) => {
                if let (Some((_, pm)), Some(f)) = (current.as_mut(), field) {
                    let bytes = c.into_inner();
                    pm.append(f, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(PartitionError::MalformedDocument {
            message: "unterminated <Placemark>".to_string(),
        });
    }

    debug!(count = placemarks.len(), "read placemarks");
    Ok(placemarks)
}

impl Placemark {
    fn append(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Coordinates => &mut self.coordinates,
        };
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text.trim());
            }
            None => *slot = Some(text.trim().to_string()),
        }
    }
}

/// Name reserved for the launch point; never partitioned.
pub const TAKEOFF: &str = "takeoff";

/// Turn placemarks into areas, skipping `takeoff` and recording per-area problems.
///
/// Coordinate tokens with fewer than two comma-separated fields are dropped.
/// A placemark without a name, or whose coordinates are all dropped, is
/// reported and skipped. So is any later placemark reusing an area name.
pub fn collect_areas(placemarks: &[Placemark]) -> (Vec<Area>, Vec<PartitionError>) {
    let mut areas: Vec<Area> = Vec::new();
    let mut issues = Vec::new();

    for (index, pm) in placemarks.iter().enumerate() {
        let Some(name) = pm.name.as_deref().filter(|n| !n.is_empty()) else {
            warn!(index, "placemark without a name skipped");
            issues.push(PartitionError::MissingName { index });
            continue;
        };
        if name == TAKEOFF {
            debug!("skipping reserved takeoff placemark");
            continue;
        }
        if areas.iter().any(|a| a.name == name) {
            warn!(area = name, index, "duplicate area skipped; first placemark is kept");
            issues.push(PartitionError::DuplicateArea {
                area: name.to_string(),
            });
            continue;
        }

        let points = parse_coordinates(name, pm.coordinates.as_deref().unwrap_or(""));
        if points.is_empty() {
            warn!(area = name, "area without usable coordinates skipped");
            issues.push(PartitionError::MissingCoordinates {
                area: name.to_string(),
            });
            continue;
        }

        areas.push(Area {
            name: name.to_string(),
            points,
        });
    }

    (areas, issues)
}

fn parse_coordinates(area: &str, text: &str) -> Vec<(String, String)> {
    text.split_whitespace()
        .filter_map(|token| {
            let mut fields = token.split(',');
            match (fields.next(), fields.next()) {
                (Some(lon), Some(lat)) if !lon.is_empty() && !lat.is_empty() => {
                    Some((lon.to_string(), lat.to_string()))
                }
                _ => {
                    warn!(area, token, "malformed coordinate dropped");
                    None
                }
            }
        })
        .collect()
}
