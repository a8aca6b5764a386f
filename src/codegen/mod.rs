//! Code generation: mission model → render tree → Python source.

pub mod ir;
pub mod lower;
pub mod render;

pub use ir::{Dispatch, Module};
pub use lower::lower;
pub use render::render;

use crate::mission::Mission;

/// Lower and render in one step.
pub fn generate(mission: &Mission) -> (Module, String) {
    let module = lower(mission);
    let source = render(&module);
    (module, source)
}
