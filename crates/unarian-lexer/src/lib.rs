// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for Unarian source.
//!
//! Tokenization uses logos. Unarian has an unusually small lexical grammar:
//! tokens are whitespace-delimited words, `#` starts a comment that runs to
//! the end of the line (and may begin mid-word: `ab#c` lexes as `ab`), and
//! `{`, `}`, `|` are delimiters only when they stand alone as a whole word.
//! A word like `a|b` is a single name.
//!
//! Every token carries a [`FilePosition`] (1-based line and column) so the
//! parser can report error locations.

use std::fmt;
use std::rc::Rc;

use logos::Logos;

/// Unarian token.
///
/// The delimiter variants only match when the delimiter is a maximal word on
/// its own; the lower-priority `Word` regex wins any longer match, which
/// keeps `{x` or `a|b` a single name exactly like the original
/// whitespace-splitting tokenizer.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f\x0B]+")] // Skip whitespace
#[logos(skip r"#[^\n]*")] // Skip # comments (to end of line)
pub enum TokenKind {
    /// Start of an anonymous program group.
    #[token("{")]
    OpenBrace,

    /// End of an anonymous program group.
    #[token("}")]
    CloseBrace,

    /// Branch separator.
    #[token("|")]
    Pipe,

    /// Any other whitespace-delimited word: a function name.
    ///
    /// Uses `Rc<str>` for cheap cloning through the parser.
    #[regex(r"[^#\s]+", |lex| Rc::from(lex.slice()), priority = 1)]
    Word(Rc<str>),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenBrace => write!(f, "{{"),
            TokenKind::CloseBrace => write!(f, "}}"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Word(word) => write!(f, "{word}"),
        }
    }
}

/// Line/column location of a token, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePosition {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// A token together with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: FilePosition,
}

impl Token {
    /// The word content for `Word` tokens, `None` for delimiters.
    pub fn word(&self) -> Option<&Rc<str>> {
        match &self.kind {
            TokenKind::Word(word) => Some(word),
            _ => None,
        }
    }
}

/// Tokenize a whole source string, attaching line/column positions.
///
/// The token grammar is total: every non-whitespace byte outside a comment
/// belongs to some token, so no input produces a lexing error.
pub fn tokenize(source: &str) -> Vec<Token> {
    let lines = LineIndex::new(source);

    TokenKind::lexer(source)
        .spanned()
        .filter_map(|(kind, span)| {
            kind.ok().map(|kind| Token {
                kind,
                pos: lines.position(span.start),
            })
        })
        .collect()
}

/// Byte-offset → line/column lookup table.
struct LineIndex {
    /// Byte offset of the start of each line.
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn position(&self, offset: usize) -> FilePosition {
        let line = self.starts.partition_point(|&start| start <= offset);
        FilePosition {
            line,
            col: offset - self.starts[line - 1] + 1,
        }
    }
}
