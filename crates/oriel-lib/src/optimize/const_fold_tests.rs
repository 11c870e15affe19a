use indoc::indoc;

use super::const_fold::{fold_constants, fold_pass};
use crate::ast::dump::dump;
use crate::ast::{Ast, ExprKind};
use crate::diagnostics::Diagnostics;
use crate::parser::parse;

fn analyzed(source: &str) -> Ast {
    let result = parse(source);
    assert!(!result.diagnostics.has_errors());
    let mut ast = result.ast;
    let mut diag = Diagnostics::new();
    let globals = crate::analyze::build_symbols(&mut ast, &mut diag);
    crate::analyze::resolve_signatures(&mut ast, &globals, &mut diag);
    crate::analyze::check_types(&mut ast, &globals, &crate::stdlib::Builtins::new(), &mut diag);
    assert!(
        !diag.has_errors(),
        "unexpected diagnostics: {}",
        diag.printer().render()
    );
    ast
}

fn folded(source: &str) -> (Ast, Diagnostics) {
    let mut ast = analyzed(source);
    let mut diag = Diagnostics::new();
    fold_constants(&mut ast, &mut diag);
    (ast, diag)
}

#[test]
fn arithmetic_chain_folds_to_a_single_wrap() {
    let (ast, diag) = folded(
        "class ConstFold is this() is var r : Integer(2).Plus(Integer(3)).Mult(Integer(4)) end end",
    );
    assert!(diag.is_empty());
    assert_eq!(
        dump(&ast),
        indoc! {"
            class ConstFold
              ctor ()
                var r
                  new Integer
                    int 20
        "}
    );
}

#[test]
fn folded_nodes_keep_their_types() {
    let (ast, _) = folded(
        "class A is this() is var r : Integer(2).Plus(Integer(3)) end end",
    );
    let init = ast.vars[0].init.unwrap();
    assert_eq!(ast.expr(init).ty, Some(crate::types::Type::integer()));
}

#[test]
fn comparisons_fold_to_booleans() {
    let (ast, _) = folded(
        "class A is this() is var b : Integer(2).Less(Integer(3)) end end",
    );
    assert_eq!(
        dump(&ast),
        indoc! {"
            class A
              ctor ()
                var b
                  new Boolean
                    bool true
        "}
    );
}

#[test]
fn boolean_logic_folds() {
    let (ast, _) = folded(
        "class A is this() is var b : Boolean(true).And(Boolean(false)).Or(Boolean(true)).Not() end end",
    );
    assert_eq!(
        dump(&ast),
        indoc! {"
            class A
              ctor ()
                var b
                  new Boolean
                    bool false
        "}
    );
}

#[test]
fn division_by_zero_stays_unfolded() {
    let (ast, diag) = folded(
        "class A is this() is var r : Integer(1).Div(Integer(0)) var s : Integer(1).Rem(Integer(0)) end end",
    );
    assert!(diag.is_empty());
    let calls = ast
        .exprs
        .iter()
        .filter(|e| matches!(e.kind, ExprKind::MethodCall { .. }))
        .count();
    assert_eq!(calls, 2);
}

#[test]
fn integer_overflow_stays_unfolded() {
    let (ast, _) = folded(
        "class A is this() is var r : Integer(9223372036854775807).Plus(Integer(1)) end end",
    );
    let calls = ast
        .exprs
        .iter()
        .filter(|e| matches!(e.kind, ExprKind::MethodCall { .. }))
        .count();
    assert_eq!(calls, 1);
}

#[test]
fn real_equal_folds_within_tolerance() {
    let (ast, _) = folded(
        "class A is this() is var b : Real(1.0000000001).Equal(Real(1.0)) var c : Real(1.5).Equal(Real(1.0)) end end",
    );
    let bools: Vec<bool> = ast
        .exprs
        .iter()
        .filter_map(|e| match e.kind {
            ExprKind::Boolean(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(bools, vec![true, false]);
}

#[test]
fn real_arithmetic_folds() {
    let (ast, _) = folded("class A is this() is var r : Real(1.5).Plus(Real(2.25)) end end");
    assert_eq!(
        dump(&ast),
        indoc! {"
            class A
              ctor ()
                var r
                  new Real
                    real 3.75
        "}
    );
}

#[test]
fn conversions_fold() {
    let (ast, _) = folded(
        "class A is this() is var r : Integer(3).toReal() var i : Real(2.75).toInteger() end end",
    );
    assert_eq!(
        dump(&ast),
        indoc! {"
            class A
              ctor ()
                var r
                  new Real
                    real 3
                var i
                  new Integer
                    int 2
        "}
    );
}

#[test]
fn self_wrapper_unwraps() {
    let (ast, _) = folded("class A is this() is var b : Boolean(Boolean(false)) end end");
    assert_eq!(
        dump(&ast),
        indoc! {"
            class A
              ctor ()
                var b
                  new Boolean
                    bool false
        "}
    );
}

#[test]
fn folding_is_idempotent_at_the_fixed_point() {
    let mut ast = analyzed(
        "class A is this() is var r : Integer(2).Plus(Integer(3)).Mult(Integer(4)) end end",
    );
    let mut diag = Diagnostics::new();
    let rewrites = fold_constants(&mut ast, &mut diag);
    assert!(rewrites > 0);
    assert_eq!(fold_pass(&mut ast), 0, "fixed point must be stable");
}

#[test]
fn loops_with_variables_stay_intact() {
    let (ast, _) = folded(indoc! {"
        class Loop is
            method factorial(n : Integer) : Integer is
                var result : Integer(1)
                var i : Integer(1)
                while i.LessEqual(n) loop
                    result := result.Mult(i)
                    i := i.Plus(Integer(1))
                end
                return result
            end
            this() is end
        end
    "});
    let calls = ast
        .exprs
        .iter()
        .filter(|e| matches!(e.kind, ExprKind::MethodCall { .. }))
        .count();
    assert_eq!(calls, 3, "LessEqual, Mult and Plus all survive");
}

#[test]
fn unary_operations_fold() {
    let (ast, _) = folded(
        "class A is this() is var a : Integer(5).UnaryMinus() var b : Integer(5).UnaryPlus() end end",
    );
    let ints: Vec<i64> = ast
        .exprs
        .iter()
        .filter_map(|e| match e.kind {
            ExprKind::Integer(v) => Some(v),
            _ => None,
        })
        .collect();
    assert!(ints.contains(&-5));
    assert!(ints.contains(&5));
}
