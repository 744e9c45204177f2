// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Hand-written recursive descent parser for Unarian.
//!
//! The grammar is tiny: a file is a sequence of `name { … | … }` definitions,
//! a branch is a sequence of words (function calls) and anonymous `{ … }`
//! groups, and `|` separates alternative branches.
//!
//! # Design
//!
//! - Anonymous groups are hoisted into the [`ProgramMap`] under a generated
//!   name (a decimal index followed by a space, which can never collide with
//!   a user identifier) and replaced by a call. The IR therefore has no
//!   nested programs.
//! - The map is pre-populated with the three primitives: `+` ↦ add one,
//!   `-` ↦ subtract one, `!` ↦ debug print (or an empty program when debug
//!   output is disabled, making `!` a no-op).
//! - Errors are collected, not short-circuited, and every call site is
//!   checked against the finished map so downstream stages may assume all
//!   names resolve.

mod cursor;
mod error;

pub use error::ParseError;

use std::rc::Rc;

use num_bigint::BigUint;
use num_traits::One;
use unarian_ast::{Branch, Instruction, Program, ProgramMap};
use unarian_lexer::{tokenize, FilePosition, TokenKind};

use cursor::TokenCursor;

/// Parse a source file into a program map.
///
/// `debug` selects the meaning of the `!` primitive: a debug print when
/// true, a no-op when false.
///
/// # Errors
///
/// Returns every parse error found in the file, each with its source
/// position.
pub fn parse_file(source: &str, debug: bool) -> Result<ProgramMap, Vec<ParseError>> {
    let mut programs = ProgramMap::new();
    populate_primitives(&mut programs, debug);

    let mut parser = Parser::new(source, &mut programs);
    while !parser.cursor.at_end() {
        parser.parse_named_program();
    }
    parser.check_call_sites();

    let errors = parser.into_errors();
    if errors.is_empty() {
        Ok(programs)
    } else {
        Err(errors)
    }
}

/// Parse an entry expression: a branch alternation without surrounding
/// braces.
///
/// The expression is registered in `programs` under a fresh anonymous name,
/// which is returned; anonymous groups nested in the expression are hoisted
/// into the map as well.
///
/// # Errors
///
/// Returns the parse errors, including references to functions the map does
/// not define.
pub fn parse_expression(
    source: &str,
    programs: &mut ProgramMap,
) -> Result<String, Vec<ParseError>> {
    let mut parser = Parser::new(source, programs);
    let branches = parser.parse_branches();
    if let Some(token) = parser.cursor.peek() {
        parser
            .errors
            .push(ParseError::unexpected(token.pos, &token.kind));
    }
    parser.check_call_sites();

    let name = parser.anonymous_name();
    let errors = parser.into_errors();
    programs.insert(name.clone(), Program::new(branches));

    if errors.is_empty() {
        Ok(name)
    } else {
        Err(errors)
    }
}

/// Insert the `+`, `-` and `!` primitives.
fn populate_primitives(programs: &mut ProgramMap, debug: bool) {
    let one = BigUint::one();
    programs.insert("+".to_string(), Program::single(vec![Instruction::Add(one.clone())]));
    programs.insert("-".to_string(), Program::single(vec![Instruction::Sub(one)]));
    let bang = if debug {
        Program::single(vec![Instruction::DebugPrint])
    } else {
        Program::single(Vec::new())
    };
    programs.insert("!".to_string(), bang);
}

/// Parser state: a cursor, the map under construction, and collected
/// diagnostics.
struct Parser<'map> {
    cursor: TokenCursor,
    programs: &'map mut ProgramMap,
    errors: Vec<ParseError>,
    /// Every call site seen, for the post-parse resolution check.
    call_sites: Vec<(Rc<str>, FilePosition)>,
}

impl<'map> Parser<'map> {
    fn new(source: &str, programs: &'map mut ProgramMap) -> Self {
        Self {
            cursor: TokenCursor::new(tokenize(source)),
            programs,
            errors: Vec::new(),
            call_sites: Vec::new(),
        }
    }

    /// Generated name for the next anonymous program. The trailing space
    /// keeps it out of the user's namespace.
    fn anonymous_name(&self) -> String {
        format!("{} ", self.programs.len())
    }

    /// Parse instructions up to the next `|`, `}` or end of input.
    fn parse_branch(&mut self) -> Branch {
        let mut instructions = Vec::new();

        loop {
            if let Some((word, pos)) = self.cursor.eat_word() {
                self.call_sites.push((Rc::clone(&word), pos));
                instructions.push(Instruction::Call(word.to_string()));
            } else if matches!(
                self.cursor.peek().map(|t| &t.kind),
                Some(TokenKind::OpenBrace)
            ) {
                if let Some(program) = self.parse_program() {
                    let name = self.anonymous_name();
                    self.programs.insert(name.clone(), program);
                    instructions.push(Instruction::Call(name));
                }
            } else {
                break;
            }
        }

        Branch::new(instructions)
    }

    /// Parse one or more branches separated by `|`.
    fn parse_branches(&mut self) -> Vec<Branch> {
        let mut branches = vec![self.parse_branch()];
        while self.cursor.eat(&TokenKind::Pipe).is_some() {
            branches.push(self.parse_branch());
        }
        branches
    }

    /// Parse a braced program group.
    fn parse_program(&mut self) -> Option<Program> {
        let open_pos = match self.cursor.eat(&TokenKind::OpenBrace) {
            Some(pos) => pos,
            None => {
                let pos = self.cursor.error_position();
                self.errors.push(ParseError::new(pos, "Expected a {"));
                return None;
            }
        };

        let branches = self.parse_branches();

        if self.cursor.eat(&TokenKind::CloseBrace).is_none() {
            self.errors
                .push(ParseError::new(open_pos, "No matching } for {"));
            return None;
        }

        Some(Program::new(branches))
    }

    /// Parse a top-level `name { … }` definition.
    fn parse_named_program(&mut self) {
        let Some((name, pos)) = self.cursor.eat_word() else {
            let pos = self.cursor.error_position();
            self.errors.push(ParseError::new(pos, "Expected a name!"));
            self.cursor.advance();
            return;
        };

        let Some(program) = self.parse_program() else {
            return;
        };

        if self.programs.contains_key(name.as_ref()) {
            self.errors.push(ParseError::redefinition(pos, &name));
        } else {
            self.programs.insert(name.to_string(), program);
        }
    }

    /// Report every call to a name the finished map does not define.
    fn check_call_sites(&mut self) {
        for (name, pos) in &self.call_sites {
            if !self.programs.contains_key(name.as_ref()) {
                self.errors.push(ParseError::undefined(*pos, name));
            }
        }
    }

    fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}
