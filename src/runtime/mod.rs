//! Reference executor for generated missions.
//!
//! Runs a lowered [`Module`] the way the external mission host runs the
//! emitted Python: one active task at a time, events routed to the active
//! task's dispatch entry, `terminate` ends the mission for good.

use tracing::{debug, info, warn};

use crate::codegen::ir::{ArgDict, Dispatch, Module};

/// Side effects of a running mission.
pub trait TaskHost {
    /// Instantiate a task from its definition and begin executing it.
    fn start_task(&mut self, definition: &ArgDict);

    /// Stop a running task.
    fn stop_task(&mut self, task_id: &str);

    /// Mission-end action (return to home, land).
    fn end_mission(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("mission already started")]
    AlreadyStarted,

    #[error("no definition for task '{0}'")]
    UnknownTask(String),
}

/// What delivering one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transitioned { from: String, to: String },
    Terminated,
    /// No dispatch rule matched; the active task keeps running.
    Unhandled,
    /// Addressed to a task that is not active, or the mission is not running.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Running(String),
    Halted,
}

/// Single-active-task state machine over a [`Module`].
pub struct MissionMachine<'m, H: TaskHost> {
    module: &'m Module,
    host: H,
    state: State,
}

impl<'m, H: TaskHost> MissionMachine<'m, H> {
    pub fn new(module: &'m Module, host: H) -> Self {
        Self {
            module,
            host,
            state: State::Idle,
        }
    }

    /// Start the mission's start task.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.state != State::Idle {
            return Err(RuntimeError::AlreadyStarted);
        }
        let start = self.module.bootstrap.start_task.clone();
        self.enter(&start)?;
        info!(task = %start, "mission started");
        Ok(())
    }

    /// Deliver `event` raised by `task_id`.
    pub fn deliver(&mut self, task_id: &str, event: &str) -> Result<Outcome, RuntimeError> {
        let active = match &self.state {
            State::Running(active) if active == task_id => active.clone(),
            _ => {
                debug!(task = task_id, event, "event for inactive task ignored");
                return Ok(Outcome::Ignored);
            }
        };

        let module = self.module;
        match module.dispatch(&active, event) {
            Dispatch::Next(next) => {
                self.host.stop_task(&active);
                self.enter(next)?;
                debug!(from = %active, to = next, event, "transition");
                Ok(Outcome::Transitioned {
                    from: active,
                    to: next.to_string(),
                })
            }
            Dispatch::Terminate => {
                self.host.stop_task(&active);
                self.host.end_mission();
                self.state = State::Halted;
                info!(task = %active, event, "mission terminated");
                Ok(Outcome::Terminated)
            }
            Dispatch::Unhandled => {
                warn!(task = %active, event, "no transition for event");
                Ok(Outcome::Unhandled)
            }
        }
    }

    fn enter(&mut self, task_id: &str) -> Result<(), RuntimeError> {
        let module = self.module;
        let definition = module
            .definition(task_id)
            .ok_or_else(|| RuntimeError::UnknownTask(task_id.to_string()))?;
        self.host.start_task(definition);
        self.state = State::Running(task_id.to_string());
        Ok(())
    }

    /// The active task, if the mission is running.
    pub fn active(&self) -> Option<&str> {
        match &self.state {
            State::Running(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}
