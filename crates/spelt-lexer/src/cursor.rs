//! Positional view over a materialized token sequence.

use std::ops::Range;
use std::sync::Arc;

use spelt_syntax::error::{Error, Result};
use spelt_syntax::token::{BasicToken, Span, Token, TokenType};

/// Bidirectional cursor with lookahead over an immutable token sequence.
///
/// The token sequence is shared (`Arc<[Token]>`); the position is not. A
/// cursor belongs to one parse operation. Speculative parsing works on a
/// [`fork`](TokenCursor::fork), which copies only the position.
///
/// The sequence always ends with an `Eof` token and the position never moves
/// past it.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Arc<[Token]>,
    pos: usize,
}

impl TokenCursor {
    /// Wraps `tokens`, appending `Eof` if the sequence does not end with one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().map_or(false, |t| t.is(BasicToken::Eof)) {
            let end = tokens.last().map_or(Span::default(), |t| {
                Span::new(t.span.end, t.span.end, t.span.line, t.span.col + t.text.chars().count())
            });
            tokens.push(Token::new(BasicToken::Eof, "", end));
        }
        Self {
            tokens: tokens.into(),
            pos: 0,
        }
    }

    fn last(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Moves forward one token and returns the new current token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &Token {
        if self.pos < self.last() {
            self.pos += 1;
        }
        self.current()
    }

    /// Moves back one token and returns the new current token.
    pub fn previous(&mut self) -> &Token {
        self.pos = self.pos.saturating_sub(1);
        self.current()
    }

    /// Returns the current token and moves past it.
    pub fn consume(&mut self) -> Token {
        let token = self.current().clone();
        self.next();
        token
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Sets the position, clamped to the `Eof` token.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.last());
    }

    /// Token at `offset` from the current position, if any.
    pub fn look_ahead(&self, offset: isize) -> Option<&Token> {
        let index = self.pos as isize + offset;
        if index < 0 {
            return None;
        }
        self.tokens.get(index as usize)
    }

    pub fn is_end(&self) -> bool {
        self.current().is(BasicToken::Eof)
    }

    pub fn is_current(&self, kinds: &[TokenType]) -> bool {
        self.current().is_any(kinds)
    }

    pub fn is_next(&self, kinds: &[TokenType]) -> bool {
        self.look_ahead(1).map_or(false, |t| t.is_any(kinds))
    }

    pub fn is_previous(&self, kinds: &[TokenType]) -> bool {
        self.look_ahead(-1).map_or(false, |t| t.is_any(kinds))
    }

    /// Non-consuming probe: do the tokens from the current position match
    /// `kinds` in order?
    pub fn sequence(&self, kinds: &[TokenType]) -> bool {
        kinds
            .iter()
            .enumerate()
            .all(|(i, k)| self.look_ahead(i as isize).map_or(false, |t| t.kind == *k))
    }

    /// Scans forward from the current token (inclusive) until `pred` matches.
    /// On success the cursor stays on the match; otherwise it is restored.
    pub fn forward(&mut self, pred: impl Fn(&Token) -> bool) -> bool {
        let start = self.pos;
        for i in start..self.tokens.len() {
            if pred(&self.tokens[i]) {
                self.pos = i;
                return true;
            }
        }
        false
    }

    /// Scans backward from the current token (inclusive) until `pred` matches.
    pub fn backward(&mut self, pred: impl Fn(&Token) -> bool) -> bool {
        for i in (0..=self.pos).rev() {
            if pred(&self.tokens[i]) {
                self.pos = i;
                return true;
            }
        }
        false
    }

    pub fn forward_to(&mut self, kind: impl Into<TokenType>) -> bool {
        let kind = kind.into();
        self.forward(|t| t.kind == kind)
    }

    pub fn backward_to(&mut self, kind: impl Into<TokenType>) -> bool {
        let kind = kind.into();
        self.backward(|t| t.kind == kind)
    }

    /// Consumes the current token if it has `kind`, otherwise fails with a
    /// syntax error naming the expected and actual tokens.
    pub fn ensure(&mut self, kind: impl Into<TokenType>) -> Result<Token> {
        let kind = kind.into();
        if self.current().kind == kind {
            Ok(self.consume())
        } else {
            Err(self.unexpected(&format!("'{}'", kind)))
        }
    }

    /// Consumes the current token if it has any of `kinds`.
    pub fn ensure_any(&mut self, kinds: &[TokenType]) -> Result<Token> {
        if self.is_current(kinds) {
            Ok(self.consume())
        } else {
            let expected: Vec<String> = kinds.iter().map(|k| format!("'{}'", k)).collect();
            Err(self.unexpected(&expected.join(" or ")))
        }
    }

    /// Consumes the current token if it has `kind`.
    pub fn accept(&mut self, kind: impl Into<TokenType>) -> Option<Token> {
        if self.current().is(kind) {
            Some(self.consume())
        } else {
            None
        }
    }

    /// Syntax error located at the current token.
    pub fn unexpected(&self, expected: &str) -> Error {
        let token = self.current();
        Error::syntax(
            format!("Expected {} but found {}", expected, token),
            token.span.line,
            token.span.col,
        )
    }

    /// Finds the `end` token balancing the `start` token at the current
    /// position, counting nested pairs. Returns the index range from `start`
    /// through `end` inclusive. The position is left unchanged.
    pub fn look_over(
        &self,
        start: impl Into<TokenType>,
        end: impl Into<TokenType>,
    ) -> Result<Range<usize>> {
        let (start, end) = (start.into(), end.into());
        if self.current().kind != start {
            return Err(self.unexpected(&format!("'{}'", start)));
        }
        let mut depth = 0usize;
        for i in self.pos..self.tokens.len() {
            let kind = self.tokens[i].kind;
            if kind == start {
                depth += 1;
            } else if kind == end {
                depth -= 1;
                if depth == 0 {
                    return Ok(self.pos..i + 1);
                }
            }
        }
        let open = self.current();
        let eof = &self.tokens[self.last()];
        Err(Error::syntax(
            format!(
                "Expected '{}' to close '{}' opened at {}:{} but found end of input",
                end, start, open.span.line, open.span.col
            ),
            eof.span.line,
            eof.span.col,
        ))
    }

    /// Independent cursor over the same tokens at `offset` from here.
    pub fn fork(&self, offset: isize) -> TokenCursor {
        let index = (self.pos as isize + offset).max(0) as usize;
        TokenCursor {
            tokens: self.tokens.clone(),
            pos: index.min(self.last()),
        }
    }
}
