//! Mission data model — tasks, transitions, and the task map.
//!
//! Built once by the analyzer and never mutated afterwards.

use std::fmt;

use indexmap::IndexMap;

use crate::dsl::ast::Span;

/// Event name signalling that a task finished on its own.
pub const DONE_EVENT: &str = "done";

/// Destination name of the single terminal state.
pub const TERMINATE: &str = "terminate";

/// Task IDs in declaration order.
pub type TaskMap = IndexMap<String, Task>;

/// A geographic point: longitude and latitude in degrees, altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }
}

/// Parameters shared by the path-following task kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyParams {
    pub way_points: Vec<GeoPoint>,
    pub gimbal_pitch: f64,
    pub drone_rotation: f64,
    pub sample_rate: u32,
    pub hover_delay: u32,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvoidParams {
    pub survey: SurveyParams,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackParams {
    pub gimbal_pitch: f64,
    pub class: String,
    pub model: String,
    pub lower_bound: Option<[u8; 3]>,
    pub upper_bound: Option<[u8; 3]>,
}

/// What a task does, with the attributes its kind requires.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    Detect(SurveyParams),
    Track(TrackParams),
    Avoid(AvoidParams),
    Test,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Detect(_) => "detect",
            TaskKind::Track(_) => "track",
            TaskKind::Avoid(_) => "avoid",
            TaskKind::Test => "test",
        }
    }
}

/// Typed argument of a transition condition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionArg {
    Str(String),
    Number(f64),
}

/// Where a transition leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Task(String),
    Terminate,
}

impl Destination {
    /// Map a destination name from source, recognising the `terminate` sentinel.
    pub fn from_name(name: &str) -> Self {
        if name == TERMINATE {
            Destination::Terminate
        } else {
            Destination::Task(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Destination::Task(id) => id,
            Destination::Terminate => TERMINATE,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event-triggered edge leaving a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub condition: String,
    pub argument: Option<TransitionArg>,
    pub source: String,
    pub destination: Destination,
    /// Synthesised `done -> terminate` default rather than written in source.
    pub implicit: bool,
    pub span: Span,
}

impl Transition {
    /// The `done -> terminate` fallback appended to tasks without an explicit `done`.
    pub fn done_default(source: &str, span: Span) -> Self {
        Self {
            condition: DONE_EVENT.to_string(),
            argument: None,
            source: source.to_string(),
            destination: Destination::Terminate,
            implicit: true,
            span,
        }
    }
}

/// One unit of vehicle behaviour and its outgoing transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    /// Declaration order; the implicit done-default, if any, is last.
    pub transitions: Vec<Transition>,
    pub span: Span,
}

impl Task {
    pub fn new(id: impl Into<String>, kind: TaskKind, span: Span) -> Self {
        Self {
            id: id.into(),
            kind,
            transitions: Vec::new(),
            span,
        }
    }

    /// Destination for `event`: the first transition whose condition matches.
    ///
    /// Later transitions with the same condition are shadowed. `None` means
    /// the event falls through to the global default handler.
    pub fn dispatch(&self, event: &str) -> Option<&Destination> {
        self.transitions
            .iter()
            .find(|t| t.condition == event)
            .map(|t| &t.destination)
    }

    /// Transitions written in source, excluding the synthesised default.
    pub fn explicit_transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(|t| !t.implicit)
    }

    pub fn has_explicit_done(&self) -> bool {
        self.explicit_transitions()
            .any(|t| t.condition == DONE_EVENT)
    }
}

/// A start task plus the full task graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    pub start: String,
    pub start_span: Span,
    pub tasks: TaskMap,
}

impl Mission {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn transition_count(&self) -> usize {
        self.tasks.values().map(|t| t.transitions.len()).sum()
    }
}
