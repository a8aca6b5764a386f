//! Python source renderer for the mission host.
//!
//! Output layout, top to bottom: header, imports, `START_TASK`, one
//! `_dispatch_<id>` function per task, the global default, the `TRANSITIONS`
//! table, one `_define_<id>` function per task, the `TASKS` table and
//! `bootstrap(controller)`. Rendering is a pure function of the [`Module`].

use std::fmt::{self, Write};

use crate::mission::model::{GeoPoint, TERMINATE};

use super::ir::*;

/// Runtime package the generated module imports task classes from.
pub const RUNTIME_PACKAGE: &str = "mission_runtime.tasks";

/// Render `module` as Python source.
pub fn render(module: &Module) -> String {
    PythonModule(module).to_string()
}

/// [`fmt::Display`] adapter that writes a [`Module`] as Python.
pub struct PythonModule<'a>(pub &'a Module);

impl fmt::Display for PythonModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.0;

        writeln!(f, "# Generated by missionc. Do not edit.")?;
        writeln!(
            f,
            "# Start task: {}; {} task(s).",
            module.bootstrap.start_task,
            module.entries.len()
        )?;
        writeln!(f)?;
        writeln!(f, "import logging")?;
        writeln!(f)?;

        let classes: Vec<_> = module.classes().iter().map(|c| c.class_name()).collect();
        if !classes.is_empty() {
            writeln!(f, "from {RUNTIME_PACKAGE} import {}", classes.join(", "))?;
            writeln!(f)?;
        }

        writeln!(f, "_log = logging.getLogger(__name__)")?;
        writeln!(f)?;
        writeln!(f, "START_TASK = {}", py_str(&module.bootstrap.start_task))?;
        writeln!(f, "TERMINATE = {}", py_str(TERMINATE))?;

        for entry in &module.entries {
            write_dispatch(f, entry)?;
        }

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "def _dispatch_{DEFAULT_ENTRY}(event):")?;
        writeln!(f, "    _log.debug(\"no transition for event %r\", event)")?;
        writeln!(f, "    return None")?;

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "TRANSITIONS = {{")?;
        for key in &module.bootstrap.table_keys {
            writeln!(f, "    {}: _dispatch_{key},", py_str(key))?;
        }
        writeln!(f, "    {}: _dispatch_{DEFAULT_ENTRY},", py_str(DEFAULT_ENTRY))?;
        writeln!(f, "}}")?;

        for def in &module.definitions {
            write_definition(f, def)?;
        }

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "TASKS = {{")?;
        for def in &module.definitions {
            writeln!(f, "    {}: _define_{},", py_str(&def.task_id), def.task_id)?;
        }
        writeln!(f, "}}")?;

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "def bootstrap(controller):")?;
        writeln!(f, "    controller.run(START_TASK, TASKS, TRANSITIONS)")
    }
}

fn write_dispatch(f: &mut impl Write, entry: &TableEntry) -> fmt::Result {
    writeln!(f)?;
    writeln!(f)?;
    writeln!(f, "def _dispatch_{}(event):", entry.task_id)?;
    for rule in &entry.rules {
        writeln!(f, "    if event == {}:", py_str(&rule.event))?;
        writeln!(f, "        return {}", py_str(rule.target.as_str()))?;
    }
    writeln!(f, "    return _dispatch_{DEFAULT_ENTRY}(event)")
}

fn write_definition(f: &mut impl Write, def: &ArgDict) -> fmt::Result {
    writeln!(f)?;
    writeln!(f)?;
    writeln!(f, "def _define_{}():", def.task_id)?;
    write_dict(f, "args", &def.args)?;
    match &def.transition_args {
        Some(transitions) => {
            write_dict(f, "transitions", transitions)?;
            writeln!(
                f,
                "    return {}({}, args, transitions)",
                def.class.class_name(),
                py_str(&def.task_id)
            )
        }
        None => writeln!(
            f,
            "    return {}({}, args)",
            def.class.class_name(),
            py_str(&def.task_id)
        ),
    }
}

fn write_dict(f: &mut impl Write, name: &str, items: &[(String, Value)]) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "    {name} = {{}}");
    }
    writeln!(f, "    {name} = {{")?;
    for (key, value) in items {
        write!(f, "        {}: ", py_str(key))?;
        write_value(f, value)?;
        writeln!(f, ",")?;
    }
    writeln!(f, "    }}")
}

fn write_value(f: &mut impl Write, value: &Value) -> fmt::Result {
    match value {
        Value::Float(v) => f.write_str(&py_float(*v)),
        Value::Int(v) => write!(f, "{v}"),
        Value::Str(s) => f.write_str(&py_str(s)),
        Value::Triple([a, b, c]) => write!(f, "[{a}, {b}, {c}]"),
        Value::Null => f.write_str("None"),
        Value::Waypoints(points) if points.is_empty() => f.write_str("[]"),
        Value::Waypoints(points) => {
            writeln!(f, "[")?;
            for p in points {
                writeln!(f, "            {},", py_point(p))?;
            }
            write!(f, "        ]")
        }
    }
}

fn py_point(p: &GeoPoint) -> String {
    format!(
        "{{\"longitude\": {}, \"latitude\": {}, \"altitude\": {}}}",
        py_float(p.longitude),
        py_float(p.latitude),
        py_float(p.altitude)
    )
}

/// Python float literal. Integral values keep a trailing `.0`.
pub fn py_float(v: f64) -> String {
    if v.is_nan() {
        "float(\"nan\")".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else {
        format!("{v:?}")
    }
}

/// Double-quoted Python string literal.
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::lower;
    use crate::dsl::Compiler;
    use crate::waypoint::{RawWaypoint, WaypointDictionary};

    fn render_src(src: &str, waypoints: &WaypointDictionary) -> String {
        let mission = Compiler::analyze(src, waypoints).unwrap();
        render(&lower(&mission))
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(py_str("plain"), "\"plain\"");
        assert_eq!(py_str("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(py_str("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(py_str("\u{1}"), "\"\\x01\"");
    }

    #[test]
    fn floats_keep_decimal_point() {
        assert_eq!(py_float(-30.0), "-30.0");
        assert_eq!(py_float(0.5), "0.5");
        assert_eq!(py_float(f64::INFINITY), "float(\"inf\")");
    }

    #[test]
    fn dispatch_function_shape() {
        let out = render_src(
            "task { test A { } test B { } } mission { start: A transition(found) A -> B }",
            &WaypointDictionary::new(),
        );
        let expected = "def _dispatch_A(event):\n    \
            if event == \"found\":\n        return \"B\"\n    \
            if event == \"done\":\n        return \"terminate\"\n    \
            return _dispatch_default(event)\n";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn unmatched_events_are_logged() {
        let out = render_src(
            "task { test A { } } mission { start: A }",
            &WaypointDictionary::new(),
        );
        assert!(out.contains("import logging\n"), "{out}");
        assert!(out.contains("_log = logging.getLogger(__name__)\n"));
        assert!(out.contains(
            "def _dispatch_default(event):\n    \
            _log.debug(\"no transition for event %r\", event)\n    \
            return None\n"
        ));
    }

    #[test]
    fn tables_and_bootstrap() {
        let out = render_src(
            "task { test A { } } mission { start: A }",
            &WaypointDictionary::new(),
        );
        assert!(out.starts_with("# Generated by missionc."));
        assert!(out.contains("from mission_runtime.tasks import TestTask\n"));
        assert!(out.contains("START_TASK = \"A\"\n"));
        assert!(out.contains(
            "TRANSITIONS = {\n    \"A\": _dispatch_A,\n    \"default\": _dispatch_default,\n}\n"
        ));
        assert!(out.contains("TASKS = {\n    \"A\": _define_A,\n}\n"));
        assert!(out.contains("    args = {}\n    return TestTask(\"A\", args)\n"));
        assert!(out.ends_with("controller.run(START_TASK, TASKS, TRANSITIONS)\n"));
    }

    #[test]
    fn detect_definition_with_waypoints_and_transitions() {
        let mut dict = WaypointDictionary::new();
        dict.insert(
            "area",
            vec![RawWaypoint::new("1.5", "2", "18"), RawWaypoint::new("3", "4", "18")],
        );
        let out = render_src(
            "task { detect T1 { way_points: <area>, gimbal_pitch: -30, drone_rotation: 0, \
             sample_rate: 2, hover_delay: 1, model: \"yolo\" } } \
             mission { start: T1 transition(timeout(20)) T1 -> terminate }",
            &dict,
        );
        let expected = "def _define_T1():\n    args = {\n        \"way_points\": [\n            \
            {\"longitude\": 1.5, \"latitude\": 2.0, \"altitude\": 18.0},\n            \
            {\"longitude\": 3.0, \"latitude\": 4.0, \"altitude\": 18.0},\n        ],\n        \
            \"gimbal_pitch\": -30.0,\n        \"drone_rotation\": 0.0,\n        \
            \"sample_rate\": 2,\n        \"hover_delay\": 1,\n        \
            \"model\": \"yolo\",\n    }\n    \
            transitions = {\n        \"timeout\": 20.0,\n    }\n    \
            return DetectTask(\"T1\", args, transitions)\n";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn imports_are_sorted_and_deduplicated() {
        let out = render_src(
            "task { test C { } track B { gimbal_pitch: 0, class: x, model: m } test A { } } \
             mission { start: A }",
            &WaypointDictionary::new(),
        );
        assert!(out.contains("from mission_runtime.tasks import TestTask, TrackTask\n"));
    }
}
