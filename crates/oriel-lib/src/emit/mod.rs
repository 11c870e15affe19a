//! Assembly emission: typed AST to one assembly file per class.

mod emitter;
mod frame;

#[cfg(test)]
mod emitter_tests;

pub use emitter::{AssemblyFile, ROOT_CLASS, emit_program};
pub use frame::Frame;
