//! Diagnostic message types and categories.

use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The category of a diagnostic, grouped by the pass that produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Lexical
    InvalidCharacter,
    InvalidNumber,
    UnterminatedString,
    UnterminatedComment,
    // Syntactic
    UnexpectedToken,
    ExpectedMember,
    ExpectedExpression,
    // Resolution
    DuplicateClass,
    DuplicateField,
    DuplicateMethod,
    DuplicateConstructor,
    DuplicateParameter,
    DuplicateVariable,
    UnknownType,
    UnknownClass,
    UndefinedIdentifier,
    SelfInheritance,
    CircularInheritance,
    ExtendsBuiltin,
    ThisOutsideMethod,
    // Type
    ConditionNotBoolean,
    ReturnTypeMismatch,
    AssignmentTypeMismatch,
    VoidInitializer,
    CircularFieldInitializer,
    UnknownField,
    ConstructorMismatch,
    NoMatchingMethod,
    MethodCallOnLiteral,
    // Optimization
    FoldingIterationLimit,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::FoldingIterationLimit => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticKind::InvalidCharacter => "invalid character",
            DiagnosticKind::InvalidNumber => "invalid numeric literal",
            DiagnosticKind::UnterminatedString => "unterminated string literal",
            DiagnosticKind::UnterminatedComment => "unterminated block comment",
            DiagnosticKind::UnexpectedToken => "unexpected token",
            DiagnosticKind::ExpectedMember => "expected a member declaration",
            DiagnosticKind::ExpectedExpression => "expected an expression",
            DiagnosticKind::DuplicateClass => "duplicate class declaration",
            DiagnosticKind::DuplicateField => "duplicate field declaration",
            DiagnosticKind::DuplicateMethod => "duplicate method declaration",
            DiagnosticKind::DuplicateConstructor => "duplicate constructor declaration",
            DiagnosticKind::DuplicateParameter => "duplicate parameter name",
            DiagnosticKind::DuplicateVariable => "duplicate variable declaration",
            DiagnosticKind::UnknownType => "unknown type",
            DiagnosticKind::UnknownClass => "unknown class",
            DiagnosticKind::UndefinedIdentifier => "undefined identifier",
            DiagnosticKind::SelfInheritance => "a class cannot extend itself",
            DiagnosticKind::CircularInheritance => "circular inheritance",
            DiagnosticKind::ExtendsBuiltin => "cannot extend a built-in type",
            DiagnosticKind::ThisOutsideMethod => {
                "'this' is only allowed inside a method or constructor"
            }
            DiagnosticKind::ConditionNotBoolean => "condition must be Boolean",
            DiagnosticKind::ReturnTypeMismatch => "return type mismatch",
            DiagnosticKind::AssignmentTypeMismatch => "incompatible assignment",
            DiagnosticKind::VoidInitializer => "variable initializer has no value",
            DiagnosticKind::CircularFieldInitializer => {
                "field initializer depends on its own value"
            }
            DiagnosticKind::UnknownField => "unknown field",
            DiagnosticKind::ConstructorMismatch => "no matching constructor",
            DiagnosticKind::NoMatchingMethod => "no matching method",
            DiagnosticKind::MethodCallOnLiteral => {
                "method calls on bare literals are not allowed"
            }
            DiagnosticKind::FoldingIterationLimit => {
                "constant folding stopped before reaching a fixed point"
            }
        }
    }
}

/// Related location information for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) span: Span,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message with category, location and optional related spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) severity: Severity,
    pub(crate) span: Span,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            span,
            message: kind.default_message().to_owned(),
            related: Vec::new(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity, self.span.start, self.span.end, self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message, related.span.start, related.span.end
            )?;
        }
        Ok(())
    }
}
