//! Token cursor for the hand-written parser.

use std::rc::Rc;

use unarian_lexer::{FilePosition, Token, TokenKind};

/// Token cursor with single-token lookahead and position tracking.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    /// Create a cursor over a token list.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it is the given delimiter.
    pub fn eat(&mut self, kind: &TokenKind) -> Option<FilePosition> {
        match self.peek() {
            Some(token) if token.kind == *kind => {
                let pos = token.pos;
                self.pos += 1;
                Some(pos)
            }
            _ => None,
        }
    }

    /// Consume the current token if it is a word, returning its content and
    /// position.
    pub fn eat_word(&mut self) -> Option<(Rc<str>, FilePosition)> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(word),
                pos,
            }) => {
                let result = (Rc::clone(word), *pos);
                self.pos += 1;
                Some(result)
            }
            _ => None,
        }
    }

    /// True when every token has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Position for error reporting at the current token, or just past the
    /// final token when the input is exhausted.
    pub fn error_position(&self) -> FilePosition {
        if let Some(token) = self.peek() {
            return token.pos;
        }
        match self.tokens.last() {
            Some(token) => {
                let mut pos = token.pos;
                pos.col += token.kind.to_string().len();
                pos
            }
            None => FilePosition { line: 1, col: 1 },
        }
    }
}
