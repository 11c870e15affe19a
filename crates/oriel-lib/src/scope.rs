//! Lexical scopes for name resolution.
//!
//! The global scope holds classes plus the pre-seeded built-in type names.
//! Bodies are resolved against a stack of local frames whose enclosing scope
//! is the declaring class; field lookup through the inheritance chain lives
//! on [`crate::ast::Ast`], since the class declaration doubles as a scope.

use indexmap::IndexMap;

use crate::ast::{ClassId, VarId};
use crate::types::BUILTIN_TYPE_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalSymbol {
    Class(ClassId),
    BuiltinType,
}

/// Program-wide name table: classes and built-in types.
#[derive(Debug, Clone, Default)]
pub struct GlobalScope {
    symbols: IndexMap<String, GlobalSymbol>,
}

impl GlobalScope {
    /// Fresh scope with the built-in type names pre-seeded.
    pub fn with_builtins() -> Self {
        let mut scope = Self::default();
        for name in BUILTIN_TYPE_NAMES {
            scope.symbols.insert(name.to_owned(), GlobalSymbol::BuiltinType);
        }
        scope
    }

    /// `false` when the name is already taken.
    pub fn define(&mut self, name: &str, symbol: GlobalSymbol) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols.insert(name.to_owned(), symbol);
        true
    }

    pub fn resolve(&self, name: &str) -> Option<GlobalSymbol> {
        self.symbols.get(name).copied()
    }

    pub fn resolve_class(&self, name: &str) -> Option<ClassId> {
        match self.resolve(name) {
            Some(GlobalSymbol::Class(id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        matches!(self.resolve(name), Some(GlobalSymbol::BuiltinType))
    }
}

/// Stack of local frames for one method or constructor body.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<IndexMap<String, VarId>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Defines in the innermost frame; `false` on an in-frame collision.
    pub fn define(&mut self, name: &str, var: VarId) -> bool {
        let frame = self.frames.last_mut().expect("no active scope frame");
        if frame.contains_key(name) {
            return false;
        }
        frame.insert(name.to_owned(), var);
        true
    }

    /// Innermost frame only.
    pub fn resolve_local(&self, name: &str) -> Option<VarId> {
        self.frames.last()?.get(name).copied()
    }

    /// Walks frames innermost-out.
    pub fn resolve(&self, name: &str) -> Option<VarId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_seeds_builtins() {
        let scope = GlobalScope::with_builtins();
        assert!(scope.is_builtin("Integer"));
        assert!(scope.is_builtin("Boolean"));
        assert!(scope.is_builtin("Real"));
        assert!(scope.is_builtin("Printer"));
        assert!(!scope.is_builtin("String"));
    }

    #[test]
    fn global_define_rejects_collisions() {
        let mut scope = GlobalScope::with_builtins();
        assert!(scope.define("Point", GlobalSymbol::Class(ClassId(0))));
        assert!(!scope.define("Point", GlobalSymbol::Class(ClassId(1))));
        assert!(!scope.define("Integer", GlobalSymbol::Class(ClassId(2))));
        assert_eq!(scope.resolve_class("Point"), Some(ClassId(0)));
    }

    #[test]
    fn scope_stack_resolves_innermost_out() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        assert!(scopes.define("x", VarId(0)));
        scopes.push();
        assert!(scopes.define("x", VarId(1)));

        assert_eq!(scopes.resolve("x"), Some(VarId(1)));
        assert_eq!(scopes.resolve_local("x"), Some(VarId(1)));
        scopes.pop();
        assert_eq!(scopes.resolve("x"), Some(VarId(0)));
    }

    #[test]
    fn define_rejects_in_frame_collision_only() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        assert!(scopes.define("x", VarId(0)));
        assert!(!scopes.define("x", VarId(1)));
        scopes.push();
        assert!(scopes.define("x", VarId(2)), "shadowing in a new frame is allowed");
    }

    #[test]
    fn resolve_local_ignores_outer_frames() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.define("x", VarId(0));
        scopes.push();
        assert_eq!(scopes.resolve_local("x"), None);
        assert_eq!(scopes.resolve("x"), Some(VarId(0)));
    }
}
