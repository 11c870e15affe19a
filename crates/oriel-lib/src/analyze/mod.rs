//! Semantic analysis passes.
//!
//! Two passes over the parsed tree, run in order by the driver:
//! - Symbol table construction and name resolution ([`symbols`])
//! - Declared-type resolution and type inference ([`signatures`],
//!   [`type_check`])
//!
//! Each pass fills resolution slots on the AST that the next pass (and
//! ultimately the emitter) reads.

pub mod signatures;
pub mod symbols;
pub mod type_check;

#[cfg(test)]
mod symbols_tests;

pub use signatures::resolve_signatures;
pub use symbols::build_symbols;
pub use type_check::check_types;
