//! Mission DSL compiler — source → tokens → AST → mission model → Python module.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{CompileError, ErrorKind};

use tracing::debug;

use crate::codegen::{self, Module};
use crate::mission::{self, Mission};
use crate::waypoint::WaypointDictionary;
use lexer::Lexer;
use parser::Parser;

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledMission {
    pub mission: Mission,
    pub module: Module,
    /// Rendered Python source.
    pub source: String,
}

/// The DSL compiler.
///
/// Every stage is deterministic: the same source and dictionary always
/// produce the same output. The first error aborts the pipeline.
pub struct Compiler;

impl Compiler {
    /// Parse DSL source into a MissionFile AST.
    pub fn parse(source: &str) -> Result<MissionFile, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    /// Parse, resolve attributes against `waypoints`, and validate.
    pub fn analyze(source: &str, waypoints: &WaypointDictionary) -> Result<Mission, CompileError> {
        let file = Self::parse(source)?;
        mission::analyze(&file, waypoints)
    }

    /// Run the full pipeline through code generation.
    pub fn compile(
        source: &str,
        waypoints: &WaypointDictionary,
    ) -> Result<CompiledMission, CompileError> {
        let mission = Self::analyze(source, waypoints)?;
        let (module, rendered) = codegen::generate(&mission);
        debug!(
            tasks = mission.tasks.len(),
            transitions = mission.transition_count(),
            bytes = rendered.len(),
            "compiled mission"
        );
        Ok(CompiledMission {
            mission,
            module,
            source: rendered,
        })
    }
}
