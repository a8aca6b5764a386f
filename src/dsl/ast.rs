//! Concrete syntax tree for the mission DSL.
//!
//! The parser produces these types without interpreting attribute names or
//! task kinds beyond the keyword; [`crate::mission::analyze`] gives them meaning.

/// Source position of a construct (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

/// A complete mission source file: one task block and one mission block.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionFile {
    pub tasks: Vec<TaskDecl>,
    pub mission: MissionBlock,
}

/// Task kind keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKeyword {
    Detect,
    Track,
    Avoid,
    Test,
}

impl TaskKeyword {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKeyword::Detect => "detect",
            TaskKeyword::Track => "track",
            TaskKeyword::Avoid => "avoid",
            TaskKeyword::Test => "test",
        }
    }
}

/// `detect T1 { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDecl {
    pub keyword: TaskKeyword,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `key: expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: AttrExpr,
    pub span: Span,
}

/// Right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrExpr {
    Number(f64),
    Integer(u64),
    Name(String),
    Str(String),
    /// `[(a, b, c), (d, e, f)]`
    TupleList(Vec<Vec<f64>>),
    /// `<area>`
    VarRef(String),
    /// `(a, b, c)`
    Triple([f64; 3]),
}

impl AttrExpr {
    /// Short description used in resolution error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            AttrExpr::Number(_) | AttrExpr::Integer(_) => "a number",
            AttrExpr::Name(_) => "a name",
            AttrExpr::Str(_) => "a string",
            AttrExpr::TupleList(_) => "a tuple list",
            AttrExpr::VarRef(_) => "a waypoint reference",
            AttrExpr::Triple(_) => "a 3-tuple",
        }
    }
}

/// `mission { start: T1 transition(...) ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct MissionBlock {
    pub start: String,
    pub start_span: Span,
    pub transitions: Vec<TransitionDecl>,
}

/// `transition(cond) source -> destination`
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionDecl {
    pub cond: CondDecl,
    pub source: String,
    pub destination: String,
    pub span: Span,
}

/// `name` or `name(arg)`
#[derive(Debug, Clone, PartialEq)]
pub struct CondDecl {
    pub name: String,
    pub arg: Option<CondArg>,
}

/// Argument of a transition condition.
#[derive(Debug, Clone, PartialEq)]
pub enum CondArg {
    Name(String),
    Number(f64),
}
