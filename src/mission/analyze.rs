//! Semantic analysis — turns the syntax tree into a [`Mission`].
//!
//! Each task declaration is dispatched on its keyword to a [`TaskKind`]
//! variant whose attributes are pulled out by name. Waypoint references are
//! resolved against the supplied [`WaypointDictionary`]. Transitions are
//! attached to their source task in declaration order, and every task without
//! an explicit `done` transition gets the `done -> terminate` default.

use tracing::{debug, warn};

use crate::dsl::ast::*;
use crate::dsl::error::CompileError;
use crate::waypoint::WaypointDictionary;

use super::model::*;
use super::validate::validate;

const SURVEY_KEYS: &[&str] = &[
    "way_points",
    "gimbal_pitch",
    "drone_rotation",
    "sample_rate",
    "hover_delay",
    "model",
];
const AVOID_KEYS: &[&str] = &["speed"];
const TRACK_KEYS: &[&str] = &["gimbal_pitch", "class", "model", "lower_bound", "upper_bound"];

/// Build and validate a mission from a parsed file.
pub fn analyze(file: &MissionFile, waypoints: &WaypointDictionary) -> Result<Mission, CompileError> {
    let mut tasks = TaskMap::new();

    for decl in &file.tasks {
        if let Some(existing) = tasks.get(&decl.name) {
            return Err(CompileError::validation(
                format!(
                    "duplicate task id '{}' (first declared at {}:{})",
                    decl.name, existing.span.line, existing.span.col
                ),
                decl.span.line,
                decl.span.col,
            ));
        }
        let task = resolve_task(decl, waypoints)?;
        debug!(task = %task.id, kind = task.kind.name(), "resolved task");
        tasks.insert(task.id.clone(), task);
    }

    for decl in &file.mission.transitions {
        let Some(task) = tasks.get_mut(&decl.source) else {
            return Err(CompileError::validation(
                format!(
                    "{}: unknown source task '{}'",
                    describe_transition(decl),
                    decl.source
                ),
                decl.span.line,
                decl.span.col,
            ));
        };
        task.transitions.push(Transition {
            condition: decl.cond.name.clone(),
            argument: decl.cond.arg.as_ref().map(|arg| match arg {
                CondArg::Name(s) => TransitionArg::Str(s.clone()),
                CondArg::Number(v) => TransitionArg::Number(*v),
            }),
            source: decl.source.clone(),
            destination: Destination::from_name(&decl.destination),
            implicit: false,
            span: decl.span,
        });
    }

    for task in tasks.values_mut() {
        if !task.has_explicit_done() {
            task.transitions
                .push(Transition::done_default(&task.id, task.span));
        }
    }

    let mission = Mission {
        start: file.mission.start.clone(),
        start_span: file.mission.start_span,
        tasks,
    };
    validate(&mission)?;

    debug!(
        start = %mission.start,
        tasks = mission.tasks.len(),
        transitions = mission.transition_count(),
        "mission analyzed"
    );
    Ok(mission)
}

fn describe_transition(decl: &TransitionDecl) -> String {
    format!(
        "transition({}) {} -> {}",
        decl.cond.name, decl.source, decl.destination
    )
}

fn resolve_task(decl: &TaskDecl, waypoints: &WaypointDictionary) -> Result<Task, CompileError> {
    let attrs = Attributes::new(decl);

    let kind = match decl.keyword {
        TaskKeyword::Detect => {
            attrs.warn_unknown(SURVEY_KEYS);
            TaskKind::Detect(attrs.survey(waypoints)?)
        }
        TaskKeyword::Avoid => {
            attrs.warn_unknown(&[SURVEY_KEYS, AVOID_KEYS].concat());
            TaskKind::Avoid(AvoidParams {
                survey: attrs.survey(waypoints)?,
                speed: attrs.number("speed")?,
            })
        }
        TaskKeyword::Track => {
            attrs.warn_unknown(TRACK_KEYS);
            TaskKind::Track(TrackParams {
                gimbal_pitch: attrs.number("gimbal_pitch")?,
                class: attrs.text("class")?,
                model: attrs.text("model")?,
                lower_bound: attrs.bounds("lower_bound")?,
                upper_bound: attrs.bounds("upper_bound")?,
            })
        }
        TaskKeyword::Test => {
            attrs.warn_unknown(&[]);
            TaskKind::Test
        }
    };

    Ok(Task::new(decl.name.clone(), kind, decl.span))
}

/// Attribute lookup for one task declaration. The first occurrence of a key wins.
struct Attributes<'a> {
    decl: &'a TaskDecl,
}

impl<'a> Attributes<'a> {
    fn new(decl: &'a TaskDecl) -> Self {
        for (i, attr) in decl.attributes.iter().enumerate() {
            if decl.attributes[..i].iter().any(|a| a.key == attr.key) {
                warn!(
                    task = %decl.name,
                    key = %attr.key,
                    line = attr.span.line,
                    "duplicate attribute ignored; first value is kept"
                );
            }
        }
        Self { decl }
    }

    fn warn_unknown(&self, known: &[&str]) {
        for attr in &self.decl.attributes {
            if !known.contains(&attr.key.as_str()) {
                warn!(
                    task = %self.decl.name,
                    kind = self.decl.keyword.name(),
                    key = %attr.key,
                    line = attr.span.line,
                    "unknown attribute ignored"
                );
            }
        }
    }

    fn find(&self, key: &str) -> Option<&'a Attribute> {
        self.decl.attributes.iter().find(|a| a.key == key)
    }

    fn required(&self, key: &str) -> Result<&'a Attribute, CompileError> {
        self.find(key).ok_or_else(|| {
            CompileError::resolution(
                format!(
                    "{} task '{}' is missing required attribute '{key}'",
                    self.decl.keyword.name(),
                    self.decl.name
                ),
                self.decl.span.line,
                self.decl.span.col,
            )
        })
    }

    fn mismatch(&self, attr: &Attribute, expected: &str) -> CompileError {
        CompileError::resolution(
            format!(
                "attribute '{}' of task '{}' must be {expected}, found {}",
                attr.key,
                self.decl.name,
                attr.value.describe()
            ),
            attr.span.line,
            attr.span.col,
        )
    }

    fn number(&self, key: &str) -> Result<f64, CompileError> {
        let attr = self.required(key)?;
        match &attr.value {
            AttrExpr::Number(v) => Ok(*v),
            AttrExpr::Integer(v) => Ok(*v as f64),
            _ => Err(self.mismatch(attr, "a number")),
        }
    }

    fn count(&self, key: &str) -> Result<u32, CompileError> {
        let attr = self.required(key)?;
        let value = match &attr.value {
            AttrExpr::Integer(v) => u32::try_from(*v).ok(),
            AttrExpr::Number(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64 => {
                Some(*v as u32)
            }
            _ => None,
        };
        value.ok_or_else(|| self.mismatch(attr, "a non-negative integer"))
    }

    fn text(&self, key: &str) -> Result<String, CompileError> {
        let attr = self.required(key)?;
        match &attr.value {
            AttrExpr::Name(s) | AttrExpr::Str(s) => Ok(s.clone()),
            _ => Err(self.mismatch(attr, "a name or string")),
        }
    }

    fn bounds(&self, key: &str) -> Result<Option<[u8; 3]>, CompileError> {
        let Some(attr) = self.find(key) else {
            return Ok(None);
        };
        let AttrExpr::Triple(values) = &attr.value else {
            return Err(self.mismatch(attr, "a 3-tuple of integers in 0..=255"));
        };
        let mut out = [0u8; 3];
        for (slot, v) in out.iter_mut().zip(values) {
            if v.fract() != 0.0 || !(0.0..=255.0).contains(v) {
                return Err(self.mismatch(attr, "a 3-tuple of integers in 0..=255"));
            }
            *slot = *v as u8;
        }
        Ok(Some(out))
    }

    fn survey(&self, waypoints: &WaypointDictionary) -> Result<SurveyParams, CompileError> {
        Ok(SurveyParams {
            way_points: self.way_points(waypoints)?,
            gimbal_pitch: self.number("gimbal_pitch")?,
            drone_rotation: self.number("drone_rotation")?,
            sample_rate: self.count("sample_rate")?,
            hover_delay: self.count("hover_delay")?,
            model: self.text("model")?,
        })
    }

    fn way_points(&self, waypoints: &WaypointDictionary) -> Result<Vec<GeoPoint>, CompileError> {
        let attr = self.required("way_points")?;
        match &attr.value {
            AttrExpr::TupleList(tuples) => tuples
                .iter()
                .map(|t| match t.as_slice() {
                    [lon, lat, alt] => Ok(GeoPoint::new(*lon, *lat, *alt)),
                    _ => Err(self.mismatch(attr, "a list of (longitude, latitude, altitude) tuples")),
                })
                .collect(),
            AttrExpr::Triple([lon, lat, alt]) => Ok(vec![GeoPoint::new(*lon, *lat, *alt)]),
            AttrExpr::VarRef(area) => self.resolve_area(attr, area, waypoints),
            _ => Err(self.mismatch(attr, "a tuple list or <area> reference")),
        }
    }

    fn resolve_area(
        &self,
        attr: &Attribute,
        area: &str,
        waypoints: &WaypointDictionary,
    ) -> Result<Vec<GeoPoint>, CompileError> {
        let at = |message: String| {
            CompileError::resolution(message, attr.span.line, attr.span.col)
        };

        let points = waypoints.get(area).ok_or_else(|| {
            at(format!(
                "task '{}' references unknown waypoint area <{area}>",
                self.decl.name
            ))
        })?;
        if points.is_empty() {
            return Err(at(format!(
                "waypoint area <{area}> referenced by task '{}' has no points",
                self.decl.name
            )));
        }

        points
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                raw.to_geo_point().map_err(|reason| {
                    at(format!("waypoint area <{area}> point {i}: {reason}"))
                })
            })
            .collect()
    }
}
