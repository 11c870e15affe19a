//! Lexer for Oriel source text.
//!
//! Produces span-based tokens without storing text - text is sliced from
//! source only when needed.
//!
//! ## Error handling
//!
//! Runs of unrecognized characters coalesce into single `Garbage` tokens
//! rather than one error per character, keeping the token stream parseable
//! for malformed input. Malformed numbers and unterminated strings also map
//! to `Garbage` so the parser never sees them.

use logos::Logos;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::span::Span;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    #[token("class")]
    ClassKw,
    #[token("extends")]
    ExtendsKw,
    #[token("is")]
    IsKw,
    #[token("end")]
    EndKw,
    #[token("var")]
    VarKw,
    #[token("method")]
    MethodKw,
    #[token("this")]
    ThisKw,
    #[token("if")]
    IfKw,
    #[token("then")]
    ThenKw,
    #[token("else")]
    ElseKw,
    #[token("while")]
    WhileKw,
    #[token("loop")]
    LoopKw,
    #[token("return")]
    ReturnKw,
    #[token("true")]
    TrueKw,
    #[token("false")]
    FalseKw,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":=")]
    Assign,
    #[token(":")]
    Colon,
    #[token("=>")]
    Arrow,

    #[regex(r"-?[0-9]+", priority = 4)]
    IntLit,
    #[regex(r"-?[0-9]+\.[0-9]+", priority = 4)]
    RealLit,
    /// Trailing dot or second dot: `5.` or `1.2.3`.
    #[regex(r"-?[0-9]+\.([0-9]+\.[0-9.]*)?", priority = 3)]
    BadNumber,

    #[regex(r#""[^"\n]*""#, priority = 4)]
    StringLit,
    #[regex(r#""[^"\n]*"#, priority = 2)]
    UnterminatedString,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// `true` when the comment was closed before EOF.
    #[token("/*", lex_block_comment)]
    BlockComment(bool),

    /// Coalesced run of unrecognized or malformed input.
    Garbage,
    /// Sentinel returned by the parser past the end of the stream.
    Eof,
}

fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(i) => {
            lex.bump(i + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[token.span.range()]
}

/// Tokenizes source into a vector of span-based tokens.
///
/// Post-processes the logos output:
/// - Coalesces adjacent lexer errors into single `Garbage` tokens
/// - Maps malformed numbers and unterminated strings to `Garbage` tokens
/// - Drops comments, reporting unterminated block comments
pub fn lex(source: &str, diag: &mut Diagnostics) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut garbage: Option<Span> = None;

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(kind) => {
                flush_garbage(&mut garbage, &mut tokens, source, diag);
                match kind {
                    TokenKind::BlockComment(terminated) => {
                        if !terminated {
                            diag.report(DiagnosticKind::UnterminatedComment, span).emit();
                        }
                    }
                    TokenKind::BadNumber => {
                        diag.report(DiagnosticKind::InvalidNumber, span)
                            .message(format!(
                                "invalid numeric literal '{}'",
                                &source[span.range()]
                            ))
                            .emit();
                        tokens.push(Token::new(TokenKind::Garbage, span));
                    }
                    TokenKind::UnterminatedString => {
                        diag.report(DiagnosticKind::UnterminatedString, span).emit();
                        tokens.push(Token::new(TokenKind::Garbage, span));
                    }
                    _ => tokens.push(Token::new(kind, span)),
                }
            }
            Err(()) => {
                // Extend the current run only when directly adjacent;
                // whitespace between errors starts a fresh run.
                garbage = Some(match garbage {
                    Some(run) if run.end == span.start => run.merge(span),
                    Some(run) => {
                        report_garbage(run, &mut tokens, source, diag);
                        span
                    }
                    None => span,
                });
            }
        }
    }
    flush_garbage(&mut garbage, &mut tokens, source, diag);

    tokens
}

fn flush_garbage(
    garbage: &mut Option<Span>,
    tokens: &mut Vec<Token>,
    source: &str,
    diag: &mut Diagnostics,
) {
    if let Some(run) = garbage.take() {
        report_garbage(run, tokens, source, diag);
    }
}

fn report_garbage(run: Span, tokens: &mut Vec<Token>, source: &str, diag: &mut Diagnostics) {
    diag.report(DiagnosticKind::InvalidCharacter, run)
        .message(format!("invalid character sequence '{}'", &source[run.range()]))
        .emit();
    tokens.push(Token::new(TokenKind::Garbage, run));
}
