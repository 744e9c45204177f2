//! Parse error type.

use unarian_lexer::{FilePosition, TokenKind};

/// Parse error with source location.
///
/// Errors are collected rather than short-circuiting: a file parse reports
/// every problem it can find in one run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("On {pos}: {message}")]
pub struct ParseError {
    /// Location of the offending token (or of the end of input).
    pub pos: FilePosition,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    /// Create an error at a position.
    pub fn new(pos: FilePosition, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }

    /// An unexpected token in branch or file position.
    pub fn unexpected(pos: FilePosition, token: &TokenKind) -> Self {
        Self::new(pos, format!("Unexpected {token} encountered"))
    }

    /// A name was defined twice.
    pub fn redefinition(pos: FilePosition, name: &str) -> Self {
        Self::new(pos, format!("Cannot redefine {name}"))
    }

    /// A call site references a name with no definition.
    pub fn undefined(pos: FilePosition, name: &str) -> Self {
        Self::new(pos, format!("Reference to undefined function {name}"))
    }
}
