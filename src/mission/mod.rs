//! Mission model and semantic analysis.

pub mod analyze;
pub mod model;
pub mod validate;

pub use analyze::analyze;
pub use model::*;
pub use validate::validate;
