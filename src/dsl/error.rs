//! Error types for the mission compiler front end.

use std::fmt;

/// An error that occurred while compiling mission source.
///
/// Positions are 1-based. Errors raised after parsing carry the position of
/// the declaration they concern.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token stream (lexing or parsing).
    Syntax,
    /// Missing required attribute, bad attribute type, unresolved waypoint reference.
    Resolution,
    /// Dangling start, source or destination task, duplicate task IDs.
    Validation,
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Syntax,
        }
    }

    pub fn resolution(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Resolution,
        }
    }

    pub fn validation(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Validation,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::Validation => "ValidationError",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for CompileError {}
