//! Lowering: [`Mission`] → render tree.

use crate::mission::model::*;

use super::ir::*;

/// Build the render tree for a validated mission. Task order is TaskMap order.
pub fn lower(mission: &Mission) -> Module {
    let entries = mission.tasks.values().map(table_entry).collect();
    let definitions = mission.tasks.values().map(arg_dict).collect();

    Module {
        entries,
        definitions,
        bootstrap: Bootstrap {
            start_task: mission.start.clone(),
            table_keys: mission.tasks.keys().cloned().collect(),
        },
    }
}

fn table_entry(task: &Task) -> TableEntry {
    TableEntry {
        task_id: task.id.clone(),
        rules: task
            .transitions
            .iter()
            .map(|t| DispatchRule {
                event: t.condition.clone(),
                target: t.destination.clone(),
                implicit: t.implicit,
            })
            .collect(),
    }
}

fn arg_dict(task: &Task) -> ArgDict {
    let (class, args) = match &task.kind {
        TaskKind::Detect(survey) => (TaskClass::Detect, survey_args(survey)),
        TaskKind::Avoid(avoid) => {
            let mut args = survey_args(&avoid.survey);
            args.push(("speed".to_string(), Value::Float(avoid.speed)));
            (TaskClass::Avoid, args)
        }
        TaskKind::Track(track) => {
            let mut args = vec![
                ("gimbal_pitch".to_string(), Value::Float(track.gimbal_pitch)),
                ("class".to_string(), Value::Str(track.class.clone())),
                ("model".to_string(), Value::Str(track.model.clone())),
            ];
            if let Some(bound) = track.lower_bound {
                args.push(("lower_bound".to_string(), Value::Triple(bound)));
            }
            if let Some(bound) = track.upper_bound {
                args.push(("upper_bound".to_string(), Value::Triple(bound)));
            }
            (TaskClass::Track, args)
        }
        TaskKind::Test => (TaskClass::Test, Vec::new()),
    };

    ArgDict {
        task_id: task.id.clone(),
        class,
        args,
        transition_args: transition_args(task),
    }
}

fn survey_args(survey: &SurveyParams) -> Vec<(String, Value)> {
    vec![
        (
            "way_points".to_string(),
            Value::Waypoints(survey.way_points.clone()),
        ),
        ("gimbal_pitch".to_string(), Value::Float(survey.gimbal_pitch)),
        (
            "drone_rotation".to_string(),
            Value::Float(survey.drone_rotation),
        ),
        (
            "sample_rate".to_string(),
            Value::Int(u64::from(survey.sample_rate)),
        ),
        (
            "hover_delay".to_string(),
            Value::Int(u64::from(survey.hover_delay)),
        ),
        ("model".to_string(), Value::Str(survey.model.clone())),
    ]
}

/// Condition → argument for the task's explicit transitions, first occurrence
/// per condition. `None` unless some explicit transition is not `done`.
fn transition_args(task: &Task) -> Option<Vec<(String, Value)>> {
    if !task
        .explicit_transitions()
        .any(|t| t.condition != DONE_EVENT)
    {
        return None;
    }

    let mut out: Vec<(String, Value)> = Vec::new();
    for t in task.explicit_transitions() {
        if out.iter().any(|(cond, _)| *cond == t.condition) {
            continue;
        }
        let value = match &t.argument {
            Some(TransitionArg::Str(s)) => Value::Str(s.clone()),
            Some(TransitionArg::Number(v)) => Value::Float(*v),
            None => Value::Null,
        };
        out.push((t.condition.clone(), value));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Compiler;
    use crate::waypoint::WaypointDictionary;

    fn lower_src(src: &str) -> Module {
        let mission = Compiler::analyze(src, &WaypointDictionary::new()).unwrap();
        lower(&mission)
    }

    #[test]
    fn table_follows_declaration_order() {
        let module = lower_src("task { test B { } test A { } } mission { start: A }");
        let ids: Vec<_> = module.entries.iter().map(|e| e.task_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(module.bootstrap.table_keys, vec!["B", "A"]);
        assert_eq!(module.bootstrap.start_task, "A");
    }

    #[test]
    fn implicit_done_rule_is_last() {
        let module = lower_src(
            "task { test A { } test B { } } mission { start: A transition(found) A -> B }",
        );
        let entry = module.entry("A").unwrap();
        assert_eq!(entry.rules.len(), 2);
        assert!(!entry.rules[0].implicit);
        assert!(entry.rules[1].implicit);
        assert_eq!(module.dispatch("A", "done"), Dispatch::Terminate);
        assert_eq!(module.dispatch("A", "found"), Dispatch::Next("B"));
        assert_eq!(module.dispatch("A", "other"), Dispatch::Unhandled);
    }

    #[test]
    fn transition_args_omitted_for_done_only_tasks() {
        let module = lower_src("task { test A { } } mission { start: A transition(done) A -> A }");
        assert_eq!(module.definition("A").unwrap().transition_args, None);

        let module = lower_src("task { test A { } } mission { start: A }");
        assert_eq!(module.definition("A").unwrap().transition_args, None);
    }

    #[test]
    fn transition_args_typed_and_first_wins() {
        let module = lower_src(
            "task { test A { } test B { } } mission { start: A \
             transition(timeout(20)) A -> B \
             transition(detected(person)) A -> B \
             transition(timeout(99)) A -> terminate \
             transition(done) A -> B }",
        );
        let args = module.definition("A").unwrap().transition_args.clone().unwrap();
        assert_eq!(
            args,
            vec![
                ("timeout".to_string(), Value::Float(20.0)),
                ("detected".to_string(), Value::Str("person".into())),
                ("done".to_string(), Value::Null),
            ]
        );
    }

    #[test]
    fn track_bounds_only_when_present() {
        let module = lower_src(
            "task { track T { gimbal_pitch: -10, class: car, model: m, lower_bound: (1, 2, 3) } } \
             mission { start: T }",
        );
        let def = module.definition("T").unwrap();
        assert_eq!(def.class, TaskClass::Track);
        assert_eq!(def.arg("lower_bound"), Some(&Value::Triple([1, 2, 3])));
        assert_eq!(def.arg("upper_bound"), None);
        assert_eq!(def.arg("gimbal_pitch"), Some(&Value::Float(-10.0)));
    }
}
