//! Parser for the mission DSL.
//!
//! Recursive descent over the token stream with one token of lookahead. Every
//! production is selected by its first token, so there is no backtracking, and
//! the first unexpected token aborts the parse with its position.

use super::ast::*;
use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// A missing trailing `Eof` is added, so lookahead always has a token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        }
        Self { tokens, pos: 0 }
    }

    /// `file = task mission`
    pub fn parse(&mut self) -> Result<MissionFile, CompileError> {
        let tasks = self.parse_task_block()?;
        let mission = self.parse_mission_block()?;

        let t = self.peek();
        if t.kind != TokenKind::Eof {
            return Err(CompileError::syntax(
                format!("expected end of input after mission block, found {}", t.kind),
                t.line,
                t.col,
            ));
        }

        Ok(MissionFile { tasks, mission })
    }

    fn parse_task_block(&mut self) -> Result<Vec<TaskDecl>, CompileError> {
        self.expect(TokenKind::Task, "at start of file")?;
        self.expect(TokenKind::LBrace, "after 'task'")?;

        let mut tasks = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            tasks.push(self.parse_task_decl()?);
        }
        self.expect(TokenKind::RBrace, "to close the task block")?;

        Ok(tasks)
    }

    /// `task_decl = ("detect"|"track"|"avoid"|"test") name "{" attribute* "}"`
    fn parse_task_decl(&mut self) -> Result<TaskDecl, CompileError> {
        let t = self.peek();
        let span = Span {
            line: t.line,
            col: t.col,
        };
        let keyword = match &t.kind {
            TokenKind::Detect => TaskKeyword::Detect,
            TokenKind::Track => TaskKeyword::Track,
            TokenKind::Avoid => TaskKeyword::Avoid,
            TokenKind::Test => TaskKeyword::Test,
            other => {
                return Err(CompileError::syntax(
                    format!("expected task kind (detect, track, avoid or test), found {other}"),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();

        let name = self.expect_ident("as task name")?;
        self.expect(TokenKind::LBrace, &format!("after task name '{name}'"))?;

        let mut attributes = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            attributes.push(self.parse_attribute()?);
            if self.check(TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace, &format!("to close task '{name}'"))?;

        Ok(TaskDecl {
            keyword,
            name,
            attributes,
            span,
        })
    }

    /// `attribute = id ":" attr_expr`
    fn parse_attribute(&mut self) -> Result<Attribute, CompileError> {
        let t = self.peek();
        let span = Span {
            line: t.line,
            col: t.col,
        };
        let key = self.expect_name("as attribute name")?;
        self.expect(TokenKind::Colon, &format!("after attribute '{key}'"))?;
        let value = self.parse_attr_expr(&key)?;
        Ok(Attribute { key, value, span })
    }

    fn parse_attr_expr(&mut self, key: &str) -> Result<AttrExpr, CompileError> {
        let t = self.peek();
        let (line, col) = (t.line, t.col);
        match &t.kind {
            TokenKind::Number(v) => {
                let v = *v;
                self.advance();
                Ok(AttrExpr::Number(v))
            }
            TokenKind::Integer(v) => {
                let v = *v;
                self.advance();
                Ok(AttrExpr::Integer(v))
            }
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(AttrExpr::Name(s))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(AttrExpr::Str(s))
            }
            TokenKind::LBracket => self.parse_tuple_list(),
            TokenKind::LAngle => {
                self.advance();
                let name = self.expect_ident("as waypoint reference")?;
                self.expect(TokenKind::RAngle, &format!("to close reference <{name}"))?;
                Ok(AttrExpr::VarRef(name))
            }
            TokenKind::LParen => {
                let values = self.parse_number_tuple()?;
                match <[f64; 3]>::try_from(values.as_slice()) {
                    Ok(triple) => Ok(AttrExpr::Triple(triple)),
                    Err(_) => Err(CompileError::syntax(
                        format!(
                            "expected a 3-tuple for attribute '{key}', found {} values",
                            values.len()
                        ),
                        line,
                        col,
                    )),
                }
            }
            other => match other.keyword() {
                Some(word) => {
                    self.advance();
                    Ok(AttrExpr::Name(word.to_string()))
                }
                None => Err(CompileError::syntax(
                    format!("expected value for attribute '{key}', found {other}"),
                    line,
                    col,
                )),
            },
        }
    }

    /// `"[" paren_tuple ("," paren_tuple)* "]"`
    fn parse_tuple_list(&mut self) -> Result<AttrExpr, CompileError> {
        self.expect(TokenKind::LBracket, "to open a tuple list")?;
        let mut tuples = vec![self.parse_number_tuple()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            tuples.push(self.parse_number_tuple()?);
        }
        self.expect(TokenKind::RBracket, "to close the tuple list")?;
        Ok(AttrExpr::TupleList(tuples))
    }

    /// `"(" number ("," number)* ")"`
    fn parse_number_tuple(&mut self) -> Result<Vec<f64>, CompileError> {
        self.expect(TokenKind::LParen, "to open a tuple")?;
        let mut values = vec![self.expect_number("in tuple")?];
        while self.check(TokenKind::Comma) {
            self.advance();
            values.push(self.expect_number("in tuple")?);
        }
        self.expect(TokenKind::RParen, "to close the tuple")?;
        Ok(values)
    }

    /// `mission = "mission" "{" "start:" name transition* "}"`
    fn parse_mission_block(&mut self) -> Result<MissionBlock, CompileError> {
        self.expect(TokenKind::Mission, "after the task block")?;
        self.expect(TokenKind::LBrace, "after 'mission'")?;
        self.expect(TokenKind::Start, "as first mission entry")?;
        self.expect(TokenKind::Colon, "after 'start'")?;

        let t = self.peek();
        let start_span = Span {
            line: t.line,
            col: t.col,
        };
        let start = self.expect_ident("as start task")?;

        let mut transitions = Vec::new();
        while self.check(TokenKind::Transition) {
            transitions.push(self.parse_transition()?);
        }
        self.expect(TokenKind::RBrace, "to close the mission block")?;

        Ok(MissionBlock {
            start,
            start_span,
            transitions,
        })
    }

    /// `transition = "transition" "(" cond ")" name "->" name`
    fn parse_transition(&mut self) -> Result<TransitionDecl, CompileError> {
        let t = self.expect(TokenKind::Transition, "")?;
        let span = Span {
            line: t.line,
            col: t.col,
        };
        self.expect(TokenKind::LParen, "after 'transition'")?;
        let cond = self.parse_cond()?;
        self.expect(TokenKind::RParen, "to close the transition condition")?;

        let source = self.expect_ident("as transition source")?;
        self.expect(TokenKind::Arrow, &format!("after transition source '{source}'"))?;
        let destination = self.expect_ident("as transition destination")?;

        Ok(TransitionDecl {
            cond,
            source,
            destination,
            span,
        })
    }

    /// `cond = id ( "(" (number|id) ")" )?`
    fn parse_cond(&mut self) -> Result<CondDecl, CompileError> {
        let name = self.expect_ident("as transition condition")?;
        if !self.check(TokenKind::LParen) {
            return Ok(CondDecl { name, arg: None });
        }
        self.advance();

        let t = self.peek();
        let arg = match &t.kind {
            TokenKind::Ident(s) | TokenKind::Str(s) => CondArg::Name(s.clone()),
            TokenKind::Number(v) => CondArg::Number(*v),
            TokenKind::Integer(v) => CondArg::Number(*v as f64),
            other => match other.keyword() {
                Some(word) => CondArg::Name(word.to_string()),
                None => {
                    return Err(CompileError::syntax(
                        format!(
                            "expected number or identifier as argument of '{name}', found {other}"
                        ),
                        t.line,
                        t.col,
                    ));
                }
            },
        };
        self.advance();
        self.expect(TokenKind::RParen, &format!("to close the argument of '{name}'"))?;

        Ok(CondDecl {
            name,
            arg: Some(arg),
        })
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end()
            && std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind)
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<&Token, CompileError> {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            let context = if context.is_empty() {
                String::new()
            } else {
                format!(" {context}")
            };
            Err(CompileError::syntax(
                format!("expected {kind}{context}, found {}", t.kind),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<String, CompileError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Ident(s) => {
                let val = s.clone();
                self.advance();
                Ok(val)
            }
            other => Err(CompileError::syntax(
                format!("expected identifier {context}, found {other}"),
                t.line,
                t.col,
            )),
        }
    }

    /// Accept an identifier or keyword as a name (for attribute keys that
    /// might collide with keywords like "track").
    fn expect_name(&mut self, context: &str) -> Result<String, CompileError> {
        let t = self.peek();
        let name = match &t.kind {
            TokenKind::Ident(s) => s.clone(),
            other => match other.keyword() {
                Some(word) => word.to_string(),
                None => {
                    return Err(CompileError::syntax(
                        format!("expected name {context}, found {other}"),
                        t.line,
                        t.col,
                    ));
                }
            },
        };
        self.advance();
        Ok(name)
    }

    fn expect_number(&mut self, context: &str) -> Result<f64, CompileError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Number(v) => {
                let val = *v;
                self.advance();
                Ok(val)
            }
            TokenKind::Integer(v) => {
                let val = *v as f64;
                self.advance();
                Ok(val)
            }
            other => Err(CompileError::syntax(
                format!("expected number {context}, found {other}"),
                t.line,
                t.col,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;
    use crate::dsl::lexer::Lexer;

    fn parse(src: &str) -> Result<MissionFile, CompileError> {
        let mut lexer = Lexer::new(src);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    #[test]
    fn parse_minimal_mission() {
        let file = parse("task { test T1 { } } mission { start: T1 }").unwrap();
        assert_eq!(file.tasks.len(), 1);
        assert_eq!(file.tasks[0].keyword, TaskKeyword::Test);
        assert_eq!(file.tasks[0].name, "T1");
        assert_eq!(file.mission.start, "T1");
        assert!(file.mission.transitions.is_empty());
    }

    #[test]
    fn parse_detect_with_inline_waypoints() {
        let src = r#"
task {
    detect T1 {
        gimbal_pitch: -30.0,
        drone_rotation: 0.0,
        sample_rate: 2,
        hover_delay: 0,
        model: coco,
        way_points: [(1, 2, 3), (4, 5, 6)]
    }
}
mission { start: T1 }
"#;
        let file = parse(src).unwrap();
        let attrs = &file.tasks[0].attributes;
        assert_eq!(attrs.len(), 6);
        assert_eq!(attrs[0].key, "gimbal_pitch");
        assert_eq!(attrs[0].value, AttrExpr::Number(-30.0));
        assert_eq!(attrs[2].value, AttrExpr::Integer(2));
        assert_eq!(attrs[4].value, AttrExpr::Name("coco".into()));
        assert_eq!(
            attrs[5].value,
            AttrExpr::TupleList(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
        );
    }

    #[test]
    fn parse_attributes_without_commas() {
        let src = "task { track T { class: person model: \"yolo\" lower_bound: (0, 10, 20) } } mission { start: T }";
        let file = parse(src).unwrap();
        let attrs = &file.tasks[0].attributes;
        assert_eq!(attrs[1].value, AttrExpr::Str("yolo".into()));
        assert_eq!(attrs[2].value, AttrExpr::Triple([0.0, 10.0, 20.0]));
    }

    #[test]
    fn parse_waypoint_reference() {
        let src = "task { avoid A { way_points: <corridor> } } mission { start: A }";
        let file = parse(src).unwrap();
        assert_eq!(
            file.tasks[0].attributes[0].value,
            AttrExpr::VarRef("corridor".into())
        );
    }

    #[test]
    fn parse_transitions_in_order() {
        let src = r#"
task { test A { } test B { } }
mission {
    start: A
    transition(done) A -> B
    transition(timeout(20)) A -> terminate
    transition(object_detected(person)) B -> A
}
"#;
        let file = parse(src).unwrap();
        let ts = &file.mission.transitions;
        assert_eq!(ts.len(), 3);
        assert_eq!(ts[0].cond, CondDecl { name: "done".into(), arg: None });
        assert_eq!(ts[1].cond.arg, Some(CondArg::Number(20.0)));
        assert_eq!(ts[1].destination, "terminate");
        assert_eq!(ts[2].cond.arg, Some(CondArg::Name("person".into())));
        assert_eq!(ts[2].source, "B");
    }

    #[test]
    fn parse_keyword_as_attribute_key() {
        let src = "task { test A { track: 1 } } mission { start: A }";
        let file = parse(src).unwrap();
        assert_eq!(file.tasks[0].attributes[0].key, "track");
    }

    #[test]
    fn parse_error_missing_arrow() {
        let err = parse("task { test A { } } mission { start: A transition(done) A B }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("'->'"), "{}", err.message);
        assert!(err.message.contains("identifier 'B'"), "{}", err.message);
    }

    #[test]
    fn parse_error_missing_brace() {
        let err = parse("task { test A { } mission { start: A }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!((err.line, err.col), (1, 19));
    }

    #[test]
    fn parse_error_missing_paren() {
        let err = parse("task { } mission { start: A transition(done A -> A }").unwrap_err();
        assert!(err.message.contains("')'"), "{}", err.message);
    }

    #[test]
    fn parse_error_wrong_tuple_arity() {
        let err = parse("task { track T { lower_bound: (1, 2) } } mission { start: T }").unwrap_err();
        assert!(err.message.contains("3-tuple"));
    }

    #[test]
    fn parse_error_empty_tuple_list() {
        assert!(parse("task { detect T { way_points: [] } } mission { start: T }").is_err());
    }

    #[test]
    fn parse_error_trailing_tokens() {
        let err = parse("task { } mission { start: A } extra").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn parse_error_unknown_task_kind() {
        let err = parse("task { fly T { } } mission { start: T }").unwrap_err();
        assert!(err.message.contains("task kind"));
    }

    #[test]
    fn keywords_allowed_as_value_names() {
        let file = parse(
            "task { track T { class: track, model: test } } \
             mission { start: T transition(detected(track)) T -> T }",
        )
        .unwrap();
        let attrs = &file.tasks[0].attributes;
        assert_eq!(attrs[0].value, AttrExpr::Name("track".into()));
        assert_eq!(attrs[1].value, AttrExpr::Name("test".into()));
        assert_eq!(
            file.mission.transitions[0].cond.arg,
            Some(CondArg::Name("track".into()))
        );
    }

    #[test]
    fn parser_without_eof_token_reports_error() {
        let err = Parser::new(Vec::new()).parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!((err.line, err.col), (1, 1));
        assert!(err.message.contains("end of input"), "{}", err.message);
    }
}
