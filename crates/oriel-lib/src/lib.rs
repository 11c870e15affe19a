//! Compiler for the Oriel language: a small pure object-oriented teaching
//! language targeting stack-VM assembly text, one file per class.
//!
//! The pipeline is strictly staged: lex, parse, resolve symbols, check
//! types, optimize, emit. Each stage is gated on the previous one leaving
//! no errors behind.
//!
//! # Example
//!
//! ```
//! use oriel_lib::Compiler;
//!
//! let unit = Compiler::new("class A is this() is end end")
//!     .parse()
//!     .analyze()
//!     .optimize();
//!
//! if unit.is_valid() {
//!     let files = unit.emit().expect("emission succeeds on valid input");
//!     assert_eq!(files[0].name, "A.assembly");
//! }
//! ```

pub mod analyze;
pub mod ast;
pub mod diagnostics;
pub mod emit;
pub mod optimize;
pub mod parser;
pub mod pipeline;
pub mod scope;
pub mod span;
pub mod stdlib;
pub mod types;

pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use emit::AssemblyFile;
pub use pipeline::{AnalyzedUnit, Compiler, ParsedUnit};
pub use span::{LineCol, LineIndex, Span};

/// Unrecoverable compiler failures, as opposed to source diagnostics.
///
/// The emitter treats unresolved semantic slots and stack-accounting
/// violations as internal invariant breaks; they abort compilation and map
/// to a distinct process exit code in the CLI.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
