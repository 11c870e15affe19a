use indoc::indoc;

use super::build_symbols;
use crate::ast::{Ast, ExprKind, StmtKind, VarKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::parse;
use crate::scope::GlobalScope;

fn analyze(source: &str) -> (Ast, GlobalScope, Diagnostics) {
    let result = parse(source);
    assert!(
        !result.diagnostics.has_errors(),
        "unexpected parse errors: {}",
        result.diagnostics.printer().render()
    );
    let mut ast = result.ast;
    let mut diag = Diagnostics::new();
    let globals = build_symbols(&mut ast, &mut diag);
    (ast, globals, diag)
}

fn kinds(diag: &Diagnostics) -> Vec<DiagnosticKind> {
    diag.iter().map(|d| d.kind()).collect()
}

#[test]
fn classes_register_in_the_global_scope() {
    let (ast, globals, diag) = analyze("class A is end class B extends A is end");
    assert!(diag.is_empty());
    let a = globals.resolve_class("A").unwrap();
    let b = globals.resolve_class("B").unwrap();
    assert_eq!(ast.class(b).base, Some(a));
    assert_eq!(ast.class(a).base, None);
}

#[test]
fn duplicate_class_is_reported() {
    let (_, _, diag) = analyze("class A is end class A is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateClass]);
}

#[test]
fn class_shadowing_a_builtin_is_reported() {
    let (_, _, diag) = analyze("class Integer is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateClass]);
}

#[test]
fn unknown_base_class_is_reported() {
    let (ast, _, diag) = analyze("class A extends Missing is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::UnknownClass]);
    assert_eq!(ast.classes[0].base, None);
}

#[test]
fn self_inheritance_is_reported() {
    let (_, _, diag) = analyze("class A extends A is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::SelfInheritance]);
}

#[test]
fn extending_a_builtin_is_reported() {
    let (_, _, diag) = analyze("class A extends Integer is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::ExtendsBuiltin]);
}

#[test]
fn inheritance_cycle_is_reported_once() {
    let (_, _, diag) = analyze("class A extends B is end class B extends A is end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::CircularInheritance]);
}

#[test]
fn three_class_cycle_is_reported_once() {
    let (_, _, diag) = analyze(
        "class A extends B is end class B extends C is end class C extends A is end",
    );
    assert_eq!(kinds(&diag), vec![DiagnosticKind::CircularInheritance]);
}

#[test]
fn member_tables_are_keyed_by_signature() {
    let source = indoc! {"
        class A is
            var x : Integer(1)
            method m(a : Integer) : Integer => a
            method m(a : Real) : Real => a
            this() is end
            this(a : Integer) is end
        end
    "};
    let (ast, _, diag) = analyze(source);
    assert!(diag.is_empty());
    let class = &ast.classes[0];
    assert!(class.fields.contains_key("x"));
    assert!(class.methods.contains_key("m(Integer)"));
    assert!(class.methods.contains_key("m(Real)"));
    assert!(class.ctors.contains_key("this()"));
    assert!(class.ctors.contains_key("this(Integer)"));
}

#[test]
fn duplicate_field_is_reported() {
    let (_, _, diag) = analyze("class A is var x : Integer(1) var x : Integer(2) end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateField]);
}

#[test]
fn duplicate_method_signature_is_reported() {
    let source = indoc! {"
        class A is
            method m(a : Integer) : Integer => a
            method m(b : Integer) : Integer => b
        end
    "};
    let (_, _, diag) = analyze(source);
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateMethod]);
}

#[test]
fn bodied_method_replaces_forward_declaration() {
    let source = indoc! {"
        class A is
            method m(a : Integer) : Integer
            method m(a : Integer) : Integer => a
        end
    "};
    let (ast, _, diag) = analyze(source);
    assert!(diag.is_empty());
    let method = ast.classes[0].methods["m(Integer)"];
    assert!(ast.method(method).body.is_some());
}

#[test]
fn duplicate_constructor_is_reported() {
    let (_, _, diag) = analyze("class A is this() is end this() is end end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateConstructor]);
}

#[test]
fn duplicate_parameter_is_reported() {
    let (_, _, diag) =
        analyze("class A is method m(a : Integer, a : Integer) : Integer => a end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateParameter]);
}

#[test]
fn duplicate_local_variable_is_reported() {
    let source = indoc! {"
        class A is
            this() is
                var x : Integer(1)
                var x : Integer(2)
            end
        end
    "};
    let (_, _, diag) = analyze(source);
    assert_eq!(kinds(&diag), vec![DiagnosticKind::DuplicateVariable]);
}

#[test]
fn parameters_bind_into_the_body_scope() {
    let source = "class A is method m(n : Integer) : Integer => n end";
    let (ast, _, diag) = analyze(source);
    assert!(diag.is_empty());

    let method = ast.classes[0].methods["m(Integer)"];
    let binding = ast.method(method).params[0].binding.unwrap();
    assert_eq!(ast.var(binding).kind, VarKind::Parameter);
    assert!(ast.var(binding).init.is_none());

    // The `n` in the body resolved to the binding.
    let resolved = ast.exprs.iter().find_map(|e| match &e.kind {
        ExprKind::Ident { name, resolved } if name == "n" => *resolved,
        _ => None,
    });
    assert_eq!(resolved, Some(binding));
}

#[test]
fn identifiers_resolve_to_inherited_fields() {
    let source = indoc! {"
        class Base is
            var x : Integer(10)
        end
        class Derived extends Base is
            method getX() : Integer => x
        end
    "};
    let (ast, _, diag) = analyze(source);
    assert!(diag.is_empty());

    let field = ast.classes[0].fields["x"];
    let resolved = ast.exprs.iter().find_map(|e| match &e.kind {
        ExprKind::Ident { name, resolved } if name == "x" => *resolved,
        _ => None,
    });
    assert_eq!(resolved, Some(field));
}

#[test]
fn undefined_identifier_is_reported() {
    let (_, _, diag) = analyze("class A is this() is x := Integer(1) end end");
    assert_eq!(kinds(&diag), vec![DiagnosticKind::UndefinedIdentifier]);
}

#[test]
fn assignment_targets_resolve() {
    let source = indoc! {"
        class A is
            var x : Integer(0)
            this() is
                x := Integer(1)
            end
        end
    "};
    let (ast, _, diag) = analyze(source);
    assert!(diag.is_empty());

    let field = ast.classes[0].fields["x"];
    let target = ast.stmts.iter().find_map(|s| match &s.kind {
        StmtKind::Assign { target, .. } => *target,
        _ => None,
    });
    assert_eq!(target, Some(field));
}

#[test]
fn constructor_call_class_names_resolve() {
    let source = indoc! {"
        class Point is
            this() is end
        end
        class A is
            this() is
                var p : Point()
                var n : Integer(1)
                var bad : Missing()
            end
        end
    "};
    let (ast, globals, diag) = analyze(source);
    assert_eq!(kinds(&diag), vec![DiagnosticKind::UnknownClass]);

    let point = globals.resolve_class("Point").unwrap();
    let resolved = ast.exprs.iter().find_map(|e| match &e.kind {
        ExprKind::ConstructorCall {
            class_name, class, ..
        } if class_name.text == "Point" => Some(*class),
        _ => None,
    });
    assert_eq!(resolved, Some(Some(point)));
}

#[test]
fn this_in_field_initializer_is_reported() {
    let source = indoc! {"
        class A is
            method half() : Integer => Integer(1)
            var x : this.half()
        end
    "};
    let (_, _, diag) = analyze(source);
    assert_eq!(kinds(&diag), vec![DiagnosticKind::ThisOutsideMethod]);
}

#[test]
fn this_in_method_body_is_allowed() {
    let source = indoc! {"
        class A is
            method half() : Integer => Integer(1)
            method callHalf() : Integer => this.half()
        end
    "};
    let (_, _, diag) = analyze(source);
    assert!(diag.is_empty());
}
