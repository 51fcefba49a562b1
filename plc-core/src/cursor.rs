//! Read cursors over characters and tokens.
//!
//! Both cursors only ever move forward. Lookahead is bounded and never
//! mutates state, so every grammar rule stays linear in its input.

use crate::lexer::Token;

/// Forward-only cursor over the characters of a source string.
///
/// `position` is a byte offset into `source`; it always sits on a char
/// boundary.
#[derive(Debug, Clone)]
pub struct CharCursor<'src> {
    source: &'src str,
    position: usize,
}

impl<'src> CharCursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether a character exists `offset` characters past the position.
    pub fn has(&self, offset: usize) -> bool {
        self.peek_char(offset).is_some()
    }

    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.source[self.position..].chars().nth(offset)
    }

    /// Steps over the current character. A no-op at end of input.
    pub fn advance(&mut self) {
        if let Some(ch) = self.peek_char(0) {
            self.position += ch.len_utf8();
        }
    }

    /// Source text from `start` up to the current position.
    pub fn slice_from(&self, start: usize) -> &'src str {
        &self.source[start..self.position]
    }
}

/// Forward-only cursor over a token sequence.
#[derive(Debug, Clone)]
pub struct TokenCursor<'tok> {
    tokens: &'tok [Token],
    position: usize,
}

impl<'tok> TokenCursor<'tok> {
    pub fn new(tokens: &'tok [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn has(&self, offset: usize) -> bool {
        self.position + offset < self.tokens.len()
    }

    pub fn peek(&self, offset: usize) -> Option<&'tok Token> {
        self.tokens.get(self.position + offset)
    }

    /// The most recently consumed token.
    pub fn previous(&self) -> Option<&'tok Token> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
    }

    pub fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Byte offset just past the final token, or 0 for an empty stream.
    pub fn end_offset(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }
}
