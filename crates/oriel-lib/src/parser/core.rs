//! Parser state and low-level operations.
//!
//! The grammar itself lives in [`super::grammar`]; this module provides the
//! cursor, error reporting with per-position deduplication, and
//! synchronization used for recovery. The parser never fails: malformed
//! input produces placeholder nodes and diagnostics.

use crate::ast::Ast;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::span::Span;

use super::grammar;
use super::lexer::{Token, TokenKind, token_text};

#[derive(Debug)]
pub struct ParseResult {
    pub ast: Ast,
    pub diagnostics: Diagnostics,
}

pub struct Parser<'s> {
    pub(super) source: &'s str,
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) ast: Ast,
    pub(super) diagnostics: Diagnostics,
    last_diagnostic_pos: Option<u32>,
    last_span: Span,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, tokens: Vec<Token>, diagnostics: Diagnostics) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            ast: Ast::new(),
            diagnostics,
            last_diagnostic_pos: None,
            last_span: Span::empty(0),
        }
    }

    pub fn parse(mut self) -> ParseResult {
        grammar::program(&mut self);
        ParseResult {
            ast: self.ast,
            diagnostics: self.diagnostics,
        }
    }

    /// Returns `Eof` past the end of the stream (acts as sentinel).
    pub(super) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(super) fn nth(&self, lookahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + lookahead)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(super) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or_else(|| Span::empty(self.eof_offset()), |t| t.span)
    }

    pub(super) fn current_text(&self) -> &'s str {
        self.tokens
            .get(self.pos)
            .map_or("", |t| token_text(self.source, t))
    }

    fn eof_offset(&self) -> u32 {
        self.source.len() as u32
    }

    pub(super) fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(super) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Span of the most recently consumed token; used to close node spans.
    pub(super) fn last_span(&self) -> Span {
        self.last_span
    }

    /// Merges `start` with the last consumed token's span.
    pub(super) fn span_from(&self, start: Span) -> Span {
        start.merge(self.last_span)
    }

    pub(super) fn bump(&mut self) -> Token {
        debug_assert!(!self.eof(), "bump called at EOF");
        let token = self.tokens[self.pos];
        self.pos += 1;
        self.last_span = token.span;
        token
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// On mismatch: emit diagnostic but don't consume (allows parent recovery).
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_msg(DiagnosticKind::UnexpectedToken, format!("expected {}", what));
        false
    }

    /// Emit diagnostic with default message for the kind.
    pub(super) fn error(&mut self, kind: DiagnosticKind) {
        self.error_msg(kind, kind.default_message());
    }

    /// Emit diagnostic with custom message, deduplicated per position.
    pub(super) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let span = self.current_span();
        if self.last_diagnostic_pos == Some(span.start) {
            return;
        }
        self.last_diagnostic_pos = Some(span.start);
        self.diagnostics.report(kind, span).message(message).emit();
    }

    /// Cursor checkpoint for one-token-lookahead disambiguation.
    pub(super) fn checkpoint(&self) -> usize {
        self.pos
    }

    pub(super) fn rewind(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    /// Skips tokens until one of `kinds` (or EOF); returns whether anything
    /// was skipped.
    pub(super) fn synchronize(&mut self, kinds: &[TokenKind]) -> bool {
        let mut skipped = false;
        while !self.eof() && !self.at_any(kinds) {
            self.bump();
            skipped = true;
        }
        skipped
    }
}
