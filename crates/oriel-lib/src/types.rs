//! Type representations, the compatibility relation, and VM descriptors.

use std::hash::{Hash, Hasher};

use crate::ast::{Ast, ClassId};

pub const INTEGER: &str = "Integer";
pub const BOOLEAN: &str = "Boolean";
pub const REAL: &str = "Real";
pub const PRINTER: &str = "Printer";

/// Names pre-seeded into the global scope as built-in types.
pub const BUILTIN_TYPE_NAMES: [&str; 4] = [INTEGER, BOOLEAN, REAL, PRINTER];

/// A closed sum of the types the language can express.
///
/// Built-in types are `Class` values without a declaration. Equality and
/// hashing go by name alone; the `decl` slot is a resolution convenience.
#[derive(Debug, Clone)]
pub enum Type {
    Class {
        name: String,
        decl: Option<ClassId>,
    },
    Array(Box<Type>),
    Void,
}

impl Type {
    pub fn class(name: impl Into<String>, decl: Option<ClassId>) -> Self {
        Type::Class {
            name: name.into(),
            decl,
        }
    }

    pub fn builtin(name: &str) -> Self {
        debug_assert!(BUILTIN_TYPE_NAMES.contains(&name));
        Type::class(name, None)
    }

    pub fn integer() -> Self {
        Type::builtin(INTEGER)
    }

    pub fn boolean() -> Self {
        Type::builtin(BOOLEAN)
    }

    pub fn real() -> Self {
        Type::builtin(REAL)
    }

    pub fn printer() -> Self {
        Type::builtin(PRINTER)
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// The textual name used in signatures: `Integer`, `Array[Point]`, `Void`.
    pub fn name(&self) -> String {
        match self {
            Type::Class { name, .. } => name.clone(),
            Type::Array(element) => format!("Array[{}]", element.name()),
            Type::Void => "Void".to_owned(),
        }
    }

    pub fn is_class_named(&self, expected: &str) -> bool {
        matches!(self, Type::Class { name, .. } if name == expected)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Type::Class { name, .. } if BUILTIN_TYPE_NAMES.contains(&name.as_str()))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Wide types occupy two operand-stack slots.
    pub fn is_wide(&self) -> bool {
        self.is_class_named(REAL)
    }

    /// Operand-stack slots a value of this type occupies (0 for Void).
    pub fn width(&self) -> u32 {
        match self {
            Type::Void => 0,
            t if t.is_wide() => 2,
            _ => 1,
        }
    }

    /// VM descriptor: `I`, `D`, `V`, `[` + element, `L` + name + `;`.
    pub fn descriptor(&self) -> String {
        match self {
            Type::Class { name, .. } => match name.as_str() {
                INTEGER | BOOLEAN => "I".to_owned(),
                REAL => "D".to_owned(),
                _ => format!("L{};", name),
            },
            Type::Array(element) => format!("[{}", element.descriptor()),
            Type::Void => "V".to_owned(),
        }
    }

    /// Whether a value of `self` may flow where `other` is expected.
    ///
    /// Holds when the types are equal, when both are classes and `self`'s
    /// declared-base chain reaches `other`, or when both are arrays with
    /// identical element types (arrays are invariant).
    pub fn is_compatible_with(&self, other: &Type, ast: &Ast) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Class { decl: Some(id), .. }, Type::Class { name, .. }) => ast
                .class_chain(*id)
                .any(|c| ast.class(c).name == *name),
            (Type::Array(a), Type::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Class { name: a, .. }, Type::Class { name: b, .. }) => a == b,
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Void, Type::Void) => true,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Type::Class { name, .. } => {
                0u8.hash(state);
                name.hash(state);
            }
            Type::Array(element) => {
                1u8.hash(state);
                element.hash(state);
            }
            Type::Void => 2u8.hash(state),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, ClassDecl};
    use crate::span::Span;

    fn class_decl(name: &str) -> ClassDecl {
        ClassDecl {
            name: name.to_owned(),
            name_span: Span::empty(0),
            span: Span::empty(0),
            base_name: None,
            members: Vec::new(),
            base: None,
            fields: Default::default(),
            methods: Default::default(),
            ctors: Default::default(),
        }
    }

    #[test]
    fn descriptors() {
        assert_eq!(Type::integer().descriptor(), "I");
        assert_eq!(Type::boolean().descriptor(), "I");
        assert_eq!(Type::real().descriptor(), "D");
        assert_eq!(Type::Void.descriptor(), "V");
        assert_eq!(Type::array(Type::integer()).descriptor(), "[I");
        assert_eq!(
            Type::array(Type::array(Type::real())).descriptor(),
            "[[D"
        );
        assert_eq!(Type::class("Point", None).descriptor(), "LPoint;");
    }

    #[test]
    fn names() {
        assert_eq!(Type::integer().name(), "Integer");
        assert_eq!(Type::array(Type::class("Point", None)).name(), "Array[Point]");
        assert_eq!(Type::Void.name(), "Void");
    }

    #[test]
    fn equality_is_by_name() {
        let a = Type::class("Point", None);
        let b = Type::class("Point", Some(ClassId(3)));
        assert_eq!(a, b);
        assert_ne!(a, Type::class("Line", None));
        assert_ne!(Type::integer(), Type::Void);
    }

    #[test]
    fn widths() {
        assert_eq!(Type::integer().width(), 1);
        assert_eq!(Type::boolean().width(), 1);
        assert_eq!(Type::real().width(), 2);
        assert_eq!(Type::Void.width(), 0);
        assert_eq!(Type::array(Type::real()).width(), 1);
    }

    #[test]
    fn subclass_is_compatible_with_base() {
        let mut ast = Ast::new();
        let base = ast.alloc_class(class_decl("Base"));
        let mut derived = class_decl("Derived");
        derived.base = Some(base);
        let derived = ast.alloc_class(derived);

        let base_ty = Type::class("Base", Some(base));
        let derived_ty = Type::class("Derived", Some(derived));

        assert!(derived_ty.is_compatible_with(&base_ty, &ast));
        assert!(!base_ty.is_compatible_with(&derived_ty, &ast));
        assert!(base_ty.is_compatible_with(&base_ty, &ast));
    }

    #[test]
    fn arrays_are_invariant() {
        let mut ast = Ast::new();
        let base = ast.alloc_class(class_decl("Base"));
        let mut derived = class_decl("Derived");
        derived.base = Some(base);
        let derived = ast.alloc_class(derived);

        let of_base = Type::array(Type::class("Base", Some(base)));
        let of_derived = Type::array(Type::class("Derived", Some(derived)));

        assert!(of_base.is_compatible_with(&of_base.clone(), &ast));
        assert!(!of_derived.is_compatible_with(&of_base, &ast));
    }
}
