//! Mission graph validation.

use crate::dsl::error::CompileError;

use super::model::{Destination, Mission, Transition, TERMINATE};

/// Task IDs that would collide with names the generated runtime reserves.
pub const RESERVED_TASK_IDS: &[&str] = &[TERMINATE, "default"];

/// Check the invariants the code generator relies on.
///
/// Fails on the first violation: a reserved task ID, a start task that is not
/// in the task map, a transition stored under the wrong task, or a
/// destination that is neither a known task nor `terminate`.
pub fn validate(mission: &Mission) -> Result<(), CompileError> {
    for task in mission.tasks.values() {
        if RESERVED_TASK_IDS.contains(&task.id.as_str()) {
            return Err(CompileError::validation(
                format!("task id '{}' is reserved", task.id),
                task.span.line,
                task.span.col,
            ));
        }
    }

    if !mission.tasks.contains_key(&mission.start) {
        return Err(CompileError::validation(
            format!("start task '{}' is not declared", mission.start),
            mission.start_span.line,
            mission.start_span.col,
        ));
    }

    for (id, task) in &mission.tasks {
        for transition in &task.transitions {
            if transition.source != *id {
                return Err(invalid(
                    transition,
                    format!("listed under task '{id}' but its source differs"),
                ));
            }
            if let Destination::Task(dest) = &transition.destination {
                if !mission.tasks.contains_key(dest) {
                    return Err(invalid(
                        transition,
                        format!("unknown destination task '{dest}'"),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn invalid(transition: &Transition, reason: String) -> CompileError {
    CompileError::validation(
        format!(
            "transition({}) {} -> {}: {reason}",
            transition.condition, transition.source, transition.destination
        ),
        transition.span.line,
        transition.span.col,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ast::Span;
    use crate::dsl::error::ErrorKind;
    use crate::mission::model::{Task, TaskKind, TaskMap};

    fn mission(start: &str, ids: &[&str]) -> Mission {
        let mut tasks = TaskMap::new();
        for id in ids {
            tasks.insert(id.to_string(), Task::new(*id, TaskKind::Test, Span::default()));
        }
        Mission {
            start: start.to_string(),
            start_span: Span { line: 4, col: 12 },
            tasks,
        }
    }

    fn edge(source: &str, dest: &str) -> Transition {
        Transition {
            condition: "done".to_string(),
            argument: None,
            source: source.to_string(),
            destination: Destination::from_name(dest),
            implicit: false,
            span: Span { line: 7, col: 5 },
        }
    }

    #[test]
    fn valid_mission_passes() {
        let mut m = mission("A", &["A", "B"]);
        m.tasks["A"].transitions.push(edge("A", "B"));
        m.tasks["B"].transitions.push(edge("B", "terminate"));
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn missing_start_task() {
        let err = validate(&mission("Z", &["A"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!((err.line, err.col), (4, 12));
        assert!(err.message.contains("'Z'"));
    }

    #[test]
    fn dangling_destination_names_transition() {
        let mut m = mission("A", &["A"]);
        m.tasks["A"].transitions.push(edge("A", "T9"));
        let err = validate(&m).unwrap_err();
        assert_eq!(
            err.message,
            "transition(done) A -> T9: unknown destination task 'T9'"
        );
        assert_eq!(err.line, 7);
    }

    #[test]
    fn misfiled_transition_rejected() {
        let mut m = mission("A", &["A", "B"]);
        m.tasks["A"].transitions.push(edge("B", "A"));
        assert!(validate(&m).is_err());
    }

    #[test]
    fn reserved_ids_rejected() {
        let err = validate(&mission("default", &["default"])).unwrap_err();
        assert!(err.message.contains("reserved"));
    }
}
