//! missionc — a compiler from the mission DSL to mission-host state machines.

pub mod codegen;
pub mod config;
pub mod driver;
pub mod dsl;
pub mod error;
pub mod logging;
pub mod mission;
pub mod runtime;
pub mod waypoint;
