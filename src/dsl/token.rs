//! Token types for the mission DSL lexer.

use std::fmt;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Task,
    Mission,
    Start,
    Transition,
    Detect,
    Track,
    Avoid,
    Test,

    // Literals
    Ident(String),
    Str(String),
    Number(f64),
    Integer(u64),

    // Delimiters
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LAngle,
    RAngle,
    Colon,
    Comma,
    Arrow, // ->

    // Special
    Eof,
}

impl TokenKind {
    /// The source spelling of a keyword, if this is one.
    pub fn keyword(&self) -> Option<&'static str> {
        let word = match self {
            TokenKind::Task => "task",
            TokenKind::Mission => "mission",
            TokenKind::Start => "start",
            TokenKind::Transition => "transition",
            TokenKind::Detect => "detect",
            TokenKind::Track => "track",
            TokenKind::Avoid => "avoid",
            TokenKind::Test => "test",
            _ => return None,
        };
        Some(word)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier '{s}'"),
            TokenKind::Str(s) => write!(f, "string \"{s}\""),
            TokenKind::Number(v) => write!(f, "number {v}"),
            TokenKind::Integer(v) => write!(f, "number {v}"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LAngle => f.write_str("'<'"),
            TokenKind::RAngle => f.write_str("'>'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Arrow => f.write_str("'->'"),
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Task
            | TokenKind::Mission
            | TokenKind::Start
            | TokenKind::Transition
            | TokenKind::Detect
            | TokenKind::Track
            | TokenKind::Avoid
            | TokenKind::Test => write!(f, "keyword '{}'", self.keyword().unwrap_or_default()),
        }
    }
}
