//! Lexer for the mission DSL.
//!
//! Converts source text into a stream of [`Token`]s. Whitespace, including
//! newlines, is insignificant; `//` starts a comment that runs to end of line.

use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '<' => self.single_char(TokenKind::LAngle),
                '>' => self.single_char(TokenKind::RAngle),
                ':' => self.single_char(TokenKind::Colon),
                ',' => self.single_char(TokenKind::Comma),
                '"' => self.lex_string()?,
                '-' => self.lex_arrow_or_number()?,
                '+' if self.peek_next().is_some_and(|c| c.is_ascii_digit() || c == '.') => {
                    self.lex_number()?
                }
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(CompileError::syntax(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip whitespace and comments until the next significant character.
    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    fn lex_string(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                return Err(CompileError::syntax("unclosed string literal", line, col));
            }
            s.push(self.advance());
        }
        if self.is_at_end() {
            return Err(CompileError::syntax("unclosed string literal", line, col));
        }
        self.advance(); // consume closing '"'
        Ok(Token {
            kind: TokenKind::Str(s),
            line,
            col,
        })
    }

    fn lex_arrow_or_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;

        if self.peek_next() == Some('>') {
            self.advance();
            self.advance();
            return Ok(Token {
                kind: TokenKind::Arrow,
                line,
                col,
            });
        }

        if self
            .peek_next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            return self.lex_number();
        }

        Err(CompileError::syntax(
            "unexpected '-' (expected '->' or a number)",
            line,
            col,
        ))
    }

    fn lex_number(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        if !self.is_at_end() && matches!(self.peek(), '-' | '+') {
            s.push(self.advance());
        }

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        let is_float = !self.is_at_end() && self.peek() == '.';
        if is_float {
            s.push(self.advance()); // consume '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        // Optional exponent: 1e-3, 2.5E7
        let mut has_exponent = false;
        if !self.is_at_end() && matches!(self.peek(), 'e' | 'E') {
            let digit_follows = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('-' | '+') => self
                    .chars
                    .get(self.pos + 2)
                    .is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if digit_follows {
                has_exponent = true;
                s.push(self.advance());
                if matches!(self.peek(), '-' | '+') {
                    s.push(self.advance());
                }
                while !self.is_at_end() && self.peek().is_ascii_digit() {
                    s.push(self.advance());
                }
            }
        }

        let val: f64 = s
            .parse()
            .map_err(|_| CompileError::syntax(format!("invalid number: {s}"), line, col))?;

        let integral = !is_float && !has_exponent && !s.starts_with('-');
        let kind = match s.trim_start_matches('+').parse::<u64>() {
            Ok(n) if integral => TokenKind::Integer(n),
            _ => TokenKind::Number(val),
        };

        Ok(Token { kind, line, col })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }

        let kind = match s.as_str() {
            "task" => TokenKind::Task,
            "mission" => TokenKind::Mission,
            "start" => TokenKind::Start,
            "transition" => TokenKind::Transition,
            "detect" => TokenKind::Detect,
            "track" => TokenKind::Track,
            "avoid" => TokenKind::Avoid,
            "test" => TokenKind::Test,
            _ => TokenKind::Ident(s),
        };

        Token { kind, line, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_keywords() {
        assert_eq!(
            kinds("task mission start transition detect track avoid test"),
            vec![
                TokenKind::Task,
                TokenKind::Mission,
                TokenKind::Start,
                TokenKind::Transition,
                TokenKind::Detect,
                TokenKind::Track,
                TokenKind::Avoid,
                TokenKind::Test,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_transition_line() {
        assert_eq!(
            kinds("transition(timeout(20)) T1 -> T2"),
            vec![
                TokenKind::Transition,
                TokenKind::LParen,
                TokenKind::Ident("timeout".into()),
                TokenKind::LParen,
                TokenKind::Integer(20),
                TokenKind::RParen,
                TokenKind::RParen,
                TokenKind::Ident("T1".into()),
                TokenKind::Arrow,
                TokenKind::Ident("T2".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_negative_and_float() {
        assert_eq!(
            kinds("-30.0 0.5 -2 7"),
            vec![
                TokenKind::Number(-30.0),
                TokenKind::Number(0.5),
                TokenKind::Number(-2.0),
                TokenKind::Integer(7),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_exponent() {
        assert_eq!(kinds("1e3")[0], TokenKind::Number(1000.0));
        assert_eq!(kinds("2.5E-1")[0], TokenKind::Number(0.25));
    }

    #[test]
    fn lex_waypoint_reference() {
        assert_eq!(
            kinds("way_points: <area_a>"),
            vec![
                TokenKind::Ident("way_points".into()),
                TokenKind::Colon,
                TokenKind::LAngle,
                TokenKind::Ident("area_a".into()),
                TokenKind::RAngle,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_string_literal() {
        assert_eq!(kinds(r#""yolo v5""#)[0], TokenKind::Str("yolo v5".into()));
    }

    #[test]
    fn lex_line_tracking() {
        let tokens = Lexer::new("task {\n  detect T1").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].col), (2, 3));
        assert_eq!((tokens[3].line, tokens[3].col), (2, 10));
    }

    #[test]
    fn lex_comment() {
        assert_eq!(
            kinds("task // the task block\n// another\n{"),
            vec![TokenKind::Task, TokenKind::LBrace, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_error_on_unexpected_char() {
        let err = Lexer::new("task @").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!((err.line, err.col), (1, 6));
    }

    #[test]
    fn lex_lone_dash_is_error() {
        assert!(Lexer::new("T1 - T2").tokenize().is_err());
    }

    #[test]
    fn lex_unclosed_string_error() {
        assert!(Lexer::new("\"coco").tokenize().is_err());
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
