//! Render tree for generated missions.
//!
//! Lowering decides *what* is emitted; [`super::render`] decides how it looks.
//! The tree is also executable: [`Module::dispatch`] answers the same
//! question the emitted dispatch functions do.

use crate::mission::model::{Destination, GeoPoint};

/// Name of the global fallback entry in the transition table.
pub const DEFAULT_ENTRY: &str = "default";

/// A literal in an argument dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(u64),
    Str(String),
    Waypoints(Vec<GeoPoint>),
    Triple([u8; 3]),
    Null,
}

/// Runtime class that executes a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskClass {
    Avoid,
    Detect,
    Test,
    Track,
}

impl TaskClass {
    pub fn class_name(&self) -> &'static str {
        match self {
            TaskClass::Avoid => "AvoidTask",
            TaskClass::Detect => "DetectTask",
            TaskClass::Test => "TestTask",
            TaskClass::Track => "TrackTask",
        }
    }
}

/// `if event == <event>: return <target>`
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRule {
    pub event: String,
    pub target: Destination,
    /// The synthesised `done -> terminate` default.
    pub implicit: bool,
}

/// One task's dispatch function: rules tested in order, first match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub task_id: String,
    pub rules: Vec<DispatchRule>,
}

impl TableEntry {
    pub fn dispatch(&self, event: &str) -> Option<&Destination> {
        self.rules
            .iter()
            .find(|r| r.event == event)
            .map(|r| &r.target)
    }
}

/// One task's definition: its argument dictionary and, when the task has
/// non-`done` transitions, the condition → argument dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDict {
    pub task_id: String,
    pub class: TaskClass,
    pub args: Vec<(String, Value)>,
    pub transition_args: Option<Vec<(String, Value)>>,
}

impl ArgDict {
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Mission entry point: the start task and the transition table's keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub start_task: String,
    /// Task IDs in table order; the `default` entry follows them.
    pub table_keys: Vec<String>,
}

/// Everything emitted for one mission.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub entries: Vec<TableEntry>,
    pub definitions: Vec<ArgDict>,
    pub bootstrap: Bootstrap,
}

/// Result of delivering an event to a task's dispatch function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    Next(&'a str),
    Terminate,
    /// Fell through to the global default: no transition.
    Unhandled,
}

impl Module {
    pub fn entry(&self, task_id: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.task_id == task_id)
    }

    pub fn definition(&self, task_id: &str) -> Option<&ArgDict> {
        self.definitions.iter().find(|d| d.task_id == task_id)
    }

    /// Evaluate the dispatch table without side effects.
    pub fn dispatch(&self, task_id: &str, event: &str) -> Dispatch<'_> {
        match self.entry(task_id).and_then(|e| e.dispatch(event)) {
            Some(Destination::Task(next)) => Dispatch::Next(next),
            Some(Destination::Terminate) => Dispatch::Terminate,
            None => Dispatch::Unhandled,
        }
    }

    /// Runtime classes referenced by the definitions, sorted and deduplicated.
    pub fn classes(&self) -> Vec<TaskClass> {
        let mut classes: Vec<_> = self.definitions.iter().map(|d| d.class).collect();
        classes.sort();
        classes.dedup();
        classes
    }
}
