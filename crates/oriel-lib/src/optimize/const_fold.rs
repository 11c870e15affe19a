//! Iterative constant folding over built-in wrapper literals.
//!
//! A bottom-up rewriter recognizes wrapper constructors around literals
//! (`Integer(5)`, `Boolean(true)`, `Real(3.14)`) and bare literal arguments,
//! folds method calls whose target and arguments are all such constants,
//! and unwraps a wrapper around itself (`Boolean(Boolean(false))`).
//!
//! Folds that would change runtime behavior are skipped: Integer division
//! and remainder by zero, and Integer arithmetic that overflows, stay
//! unfolded. Real `Equal` folds within a fixed tolerance.
//!
//! The driver repeats the rewrite until a pass reports no change; a safety
//! cap bounds pathological inputs and is reported as a warning, not an
//! error. Runs after type checking, so replacement nodes carry their types.

use crate::ast::{Ast, Expr, ExprId, ExprKind, TypeName};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::span::Span;
use crate::types::{self, Type};

const MAX_ITERATIONS: usize = 10;

/// Tolerance for folding `Real.Equal`.
const REAL_EQUAL_EPSILON: f64 = 1e-9;

/// Runs the rewriter to a fixed point; returns the total rewrite count.
pub fn fold_constants(ast: &mut Ast, diag: &mut Diagnostics) -> usize {
    let mut total = 0;
    for _ in 0..MAX_ITERATIONS {
        let rewrites = fold_pass(ast);
        total += rewrites;
        if rewrites == 0 {
            return total;
        }
    }
    diag.report(DiagnosticKind::FoldingIterationLimit, Span::empty(0))
        .emit();
    total
}

/// One bottom-up sweep. Children precede parents in the arena (the parser
/// allocates operands first), so a single sweep folds whole chains.
pub(crate) fn fold_pass(ast: &mut Ast) -> usize {
    let count = ast.exprs.len();
    let mut rewrites = 0;
    for i in 0..count {
        if try_fold(ast, ExprId(i as u32)) {
            rewrites += 1;
        }
    }
    rewrites
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Const {
    Int(i64),
    Real(f64),
    Bool(bool),
}

impl Const {
    fn wrapper_name(self) -> &'static str {
        match self {
            Const::Int(_) => types::INTEGER,
            Const::Real(_) => types::REAL,
            Const::Bool(_) => types::BOOLEAN,
        }
    }

    fn ty(self) -> Type {
        Type::builtin(self.wrapper_name())
    }

    fn literal_kind(self) -> ExprKind {
        match self {
            Const::Int(v) => ExprKind::Integer(v),
            Const::Real(v) => ExprKind::Real(v),
            Const::Bool(v) => ExprKind::Boolean(v),
        }
    }
}

fn is_wrapper_name(name: &str) -> bool {
    matches!(name, types::INTEGER | types::REAL | types::BOOLEAN)
}

/// A literal, or a wrapper constructor around a matching literal.
fn literal_value(ast: &Ast, id: ExprId) -> Option<Const> {
    match &ast.expr(id).kind {
        ExprKind::Integer(v) => Some(Const::Int(*v)),
        ExprKind::Real(v) => Some(Const::Real(*v)),
        ExprKind::Boolean(v) => Some(Const::Bool(*v)),
        ExprKind::ConstructorCall {
            class_name, args, ..
        } if is_wrapper_name(&class_name.text) && args.len() == 1 => {
            let inner = literal_value_of_literal(ast, args[0])?;
            (inner.wrapper_name() == class_name.text).then_some(inner)
        }
        _ => None,
    }
}

/// Bare literals only - a wrapper's argument must itself be a literal for
/// the wrapper to count as a constant.
fn literal_value_of_literal(ast: &Ast, id: ExprId) -> Option<Const> {
    match &ast.expr(id).kind {
        ExprKind::Integer(v) => Some(Const::Int(*v)),
        ExprKind::Real(v) => Some(Const::Real(*v)),
        ExprKind::Boolean(v) => Some(Const::Bool(*v)),
        _ => None,
    }
}

fn try_fold(ast: &mut Ast, id: ExprId) -> bool {
    match ast.expr(id).kind.clone() {
        // `Integer(Integer(5))` -> `Integer(5)`: re-point the outer wrapper
        // at the inner literal.
        ExprKind::ConstructorCall {
            class_name, args, ..
        } if is_wrapper_name(&class_name.text) && args.len() == 1 => {
            let inner = args[0];
            let ExprKind::ConstructorCall {
                class_name: inner_name,
                args: inner_args,
                ..
            } = ast.expr(inner).kind.clone()
            else {
                return false;
            };
            if inner_name.text != class_name.text
                || inner_args.len() != 1
                || literal_value_of_literal(ast, inner_args[0]).is_none()
            {
                return false;
            }
            if let ExprKind::ConstructorCall { args, .. } = &mut ast.expr_mut(id).kind {
                args[0] = inner_args[0];
            }
            true
        }
        ExprKind::MethodCall {
            target, name, args, ..
        } => {
            let Some(target_value) = literal_value(ast, target) else {
                return false;
            };
            let mut arg_values = Vec::with_capacity(args.len());
            for &arg in &args {
                match literal_value(ast, arg) {
                    Some(value) => arg_values.push(value),
                    None => return false,
                }
            }
            let Some(result) = eval(target_value, &name, &arg_values) else {
                return false;
            };

            // Replace the call with a freshly wrapped literal.
            let span = ast.expr(id).span;
            let literal = ast.alloc_expr(Expr {
                kind: result.literal_kind(),
                span,
                ty: Some(result.ty()),
            });
            let node = ast.expr_mut(id);
            node.kind = ExprKind::ConstructorCall {
                class_name: TypeName {
                    text: result.wrapper_name().to_owned(),
                    span,
                },
                args: vec![literal],
                class: None,
                ctor: None,
            };
            node.ty = Some(result.ty());
            true
        }
        _ => false,
    }
}

/// Operation tables. `None` means "leave unfolded": unknown operation,
/// Integer division/remainder by zero, or Integer overflow.
fn eval(target: Const, name: &str, args: &[Const]) -> Option<Const> {
    match (target, args) {
        (Const::Int(a), [Const::Int(b)]) => eval_int_binary(a, name, *b),
        (Const::Int(a), []) => eval_int_unary(a, name),
        (Const::Real(a), [Const::Real(b)]) => eval_real_binary(a, name, *b),
        (Const::Real(a), []) => eval_real_unary(a, name),
        (Const::Bool(a), [Const::Bool(b)]) => eval_bool_binary(a, name, *b),
        (Const::Bool(a), []) => (name == "Not").then_some(Const::Bool(!a)),
        _ => None,
    }
}

fn eval_int_binary(a: i64, name: &str, b: i64) -> Option<Const> {
    match name {
        "Plus" => a.checked_add(b).map(Const::Int),
        "Minus" => a.checked_sub(b).map(Const::Int),
        "Mult" => a.checked_mul(b).map(Const::Int),
        "Div" => (b != 0).then(|| a.checked_div(b)).flatten().map(Const::Int),
        "Rem" => (b != 0).then(|| a.checked_rem(b)).flatten().map(Const::Int),
        "Less" => Some(Const::Bool(a < b)),
        "LessEqual" => Some(Const::Bool(a <= b)),
        "Greater" => Some(Const::Bool(a > b)),
        "GreaterEqual" => Some(Const::Bool(a >= b)),
        "Equal" => Some(Const::Bool(a == b)),
        _ => None,
    }
}

fn eval_int_unary(a: i64, name: &str) -> Option<Const> {
    match name {
        "UnaryMinus" => a.checked_neg().map(Const::Int),
        "UnaryPlus" => Some(Const::Int(a)),
        "toReal" => Some(Const::Real(a as f64)),
        _ => None,
    }
}

fn eval_real_binary(a: f64, name: &str, b: f64) -> Option<Const> {
    match name {
        "Plus" => Some(Const::Real(a + b)),
        "Minus" => Some(Const::Real(a - b)),
        "Mult" => Some(Const::Real(a * b)),
        "Div" => Some(Const::Real(a / b)),
        "Rem" => Some(Const::Real(a % b)),
        "Less" => Some(Const::Bool(a < b)),
        "LessEqual" => Some(Const::Bool(a <= b)),
        "Greater" => Some(Const::Bool(a > b)),
        "GreaterEqual" => Some(Const::Bool(a >= b)),
        "Equal" => Some(Const::Bool((a - b).abs() < REAL_EQUAL_EPSILON)),
        _ => None,
    }
}

fn eval_real_unary(a: f64, name: &str) -> Option<Const> {
    match name {
        "UnaryMinus" => Some(Const::Real(-a)),
        "UnaryPlus" => Some(Const::Real(a)),
        "toInteger" => Some(Const::Int(a as i64)),
        _ => None,
    }
}

fn eval_bool_binary(a: bool, name: &str, b: bool) -> Option<Const> {
    match name {
        "And" => Some(Const::Bool(a && b)),
        "Or" => Some(Const::Bool(a || b)),
        "Xor" => Some(Const::Bool(a ^ b)),
        _ => None,
    }
}
