//! Registry of built-in methods on `Integer`, `Boolean`, `Real` and
//! `Printer`.
//!
//! The table is keyed by class name plus textual signature and is built once
//! per compilation by the driver; lookups during type checking are exact, so
//! there is no promotion between `Integer` and `Real`. `Array[T]` methods
//! are not listed here: `get`/`set`/`Length` depend on the element type and
//! are resolved structurally by the type checker.

use indexmap::IndexMap;

use crate::ast::signature;
use crate::types::{self, Type};

/// Parameter and return types of a built-in method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Debug, Clone)]
pub struct Builtins {
    table: IndexMap<String, MethodSig>,
}

fn key(class: &str, sig: &str) -> String {
    format!("{}.{}", class, sig)
}

impl Builtins {
    pub fn new() -> Self {
        let mut builtins = Self {
            table: IndexMap::new(),
        };
        builtins.populate();
        builtins
    }

    fn insert(&mut self, class: &str, name: &str, params: &[Type], ret: Type) {
        let sig = signature(name, params.iter().map(Type::name));
        let previous = self.table.insert(
            key(class, &sig),
            MethodSig {
                params: params.to_vec(),
                ret,
            },
        );
        debug_assert!(previous.is_none(), "duplicate builtin entry");
    }

    fn populate(&mut self) {
        use types::{BOOLEAN, INTEGER, REAL};

        let int = Type::integer();
        let boolean = Type::boolean();
        let real = Type::real();

        for op in ["Plus", "Minus", "Mult", "Div", "Rem"] {
            self.insert(INTEGER, op, &[int.clone()], int.clone());
            self.insert(REAL, op, &[real.clone()], real.clone());
        }
        for op in ["UnaryMinus", "UnaryPlus"] {
            self.insert(INTEGER, op, &[], int.clone());
            self.insert(REAL, op, &[], real.clone());
        }
        for op in ["Less", "LessEqual", "Greater", "GreaterEqual", "Equal"] {
            self.insert(INTEGER, op, &[int.clone()], boolean.clone());
            self.insert(REAL, op, &[real.clone()], boolean.clone());
        }
        self.insert(INTEGER, "toReal", &[], real.clone());
        self.insert(REAL, "toInteger", &[], int.clone());

        for op in ["And", "Or", "Xor"] {
            self.insert(BOOLEAN, op, &[boolean.clone()], boolean.clone());
        }
        self.insert(BOOLEAN, "Not", &[], boolean.clone());
    }

    /// Exact lookup by class name, method name and argument types.
    ///
    /// `Printer.print` is the one structural entry: it accepts a single
    /// argument of any value type.
    pub fn lookup(&self, class: &str, name: &str, args: &[Type]) -> Option<MethodSig> {
        if class == types::PRINTER {
            if name == "print" && args.len() == 1 && !args[0].is_void() {
                return Some(MethodSig {
                    params: vec![args[0].clone()],
                    ret: Type::Void,
                });
            }
            return None;
        }

        let sig = signature(name, args.iter().map(Type::name));
        self.table.get(&key(class, &sig)).cloned()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_returns_integer() {
        let builtins = Builtins::new();
        for op in ["Plus", "Minus", "Mult", "Div", "Rem"] {
            let sig = builtins
                .lookup("Integer", op, &[Type::integer()])
                .unwrap_or_else(|| panic!("Integer.{} missing", op));
            assert_eq!(sig.ret, Type::integer());
        }
    }

    #[test]
    fn integer_comparisons_return_boolean() {
        let builtins = Builtins::new();
        for op in ["Less", "LessEqual", "Greater", "GreaterEqual", "Equal"] {
            let sig = builtins
                .lookup("Integer", op, &[Type::integer()])
                .unwrap_or_else(|| panic!("Integer.{} missing", op));
            assert_eq!(sig.ret, Type::boolean());
        }
    }

    #[test]
    fn real_keeps_rem() {
        let builtins = Builtins::new();
        let sig = builtins.lookup("Real", "Rem", &[Type::real()]).unwrap();
        assert_eq!(sig.ret, Type::real());
    }

    #[test]
    fn conversions() {
        let builtins = Builtins::new();
        assert_eq!(
            builtins.lookup("Integer", "toReal", &[]).unwrap().ret,
            Type::real()
        );
        assert_eq!(
            builtins.lookup("Real", "toInteger", &[]).unwrap().ret,
            Type::integer()
        );
    }

    #[test]
    fn boolean_operations() {
        let builtins = Builtins::new();
        for op in ["And", "Or", "Xor"] {
            let sig = builtins
                .lookup("Boolean", op, &[Type::boolean()])
                .unwrap_or_else(|| panic!("Boolean.{} missing", op));
            assert_eq!(sig.ret, Type::boolean());
        }
        assert_eq!(
            builtins.lookup("Boolean", "Not", &[]).unwrap().ret,
            Type::boolean()
        );
    }

    #[test]
    fn unary_operations_take_no_arguments() {
        let builtins = Builtins::new();
        assert!(builtins.lookup("Integer", "UnaryMinus", &[]).is_some());
        assert!(builtins.lookup("Real", "UnaryPlus", &[]).is_some());
        assert!(
            builtins
                .lookup("Integer", "UnaryMinus", &[Type::integer()])
                .is_none()
        );
    }

    #[test]
    fn cross_type_lookups_miss() {
        let builtins = Builtins::new();
        assert!(builtins.lookup("Integer", "Plus", &[Type::real()]).is_none());
        assert!(builtins.lookup("Real", "Less", &[Type::integer()]).is_none());
        assert!(builtins.lookup("Integer", "Equal", &[Type::real()]).is_none());
    }

    #[test]
    fn printer_print_is_structural() {
        let builtins = Builtins::new();
        assert_eq!(
            builtins
                .lookup("Printer", "print", &[Type::integer()])
                .unwrap()
                .ret,
            Type::Void
        );
        assert!(
            builtins
                .lookup("Printer", "print", &[Type::class("Point", None)])
                .is_some()
        );
        assert!(
            builtins
                .lookup("Printer", "print", &[Type::array(Type::integer())])
                .is_some()
        );
        assert!(builtins.lookup("Printer", "print", &[]).is_none());
        assert!(builtins.lookup("Printer", "print", &[Type::Void]).is_none());
        assert!(builtins.lookup("Printer", "println", &[Type::integer()]).is_none());
    }

    #[test]
    fn unknown_methods_miss() {
        let builtins = Builtins::new();
        assert!(builtins.lookup("Integer", "Pow", &[Type::integer()]).is_none());
        assert!(builtins.lookup("String", "Length", &[]).is_none());
    }
}
