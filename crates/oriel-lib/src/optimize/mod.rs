//! AST-level optimizations, run between type checking and emission.
//!
//! Both passes rewrite the typed tree in place: dead-code elimination prunes
//! statements after a `return` within each straight-line block, and the
//! constant folder collapses method calls over built-in wrapper literals.

pub mod const_fold;
pub mod dead_code;

#[cfg(test)]
mod const_fold_tests;

pub use const_fold::fold_constants;
pub use dead_code::eliminate_dead_code;
