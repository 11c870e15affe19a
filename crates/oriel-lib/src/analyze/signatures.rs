//! Declared-type resolution (the first type-checker sub-pass).
//!
//! Resolves every written type name in the program: parameter types and
//! method return types (the distinguished `Void` when absent). After this
//! pass every parameter carries a resolved type or an error was reported.

use crate::ast::{Ast, CtorId, Member, MethodId};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::scope::GlobalScope;
use crate::span::Span;
use crate::types::{BUILTIN_TYPE_NAMES, Type};

/// Resolves a written type name: a built-in, an `Array[T]` form whose inner
/// name resolves recursively, or a registered class. Reports "unknown type"
/// otherwise - which also covers `String`, a name the language reserves but
/// does not support.
pub fn resolve_type_name(
    text: &str,
    span: Span,
    globals: &GlobalScope,
    diag: &mut Diagnostics,
) -> Option<Type> {
    if let Some(inner) = text.strip_prefix("Array[").and_then(|rest| rest.strip_suffix(']')) {
        let element = resolve_type_name(inner, span, globals, diag)?;
        return Some(Type::array(element));
    }
    if BUILTIN_TYPE_NAMES.contains(&text) {
        return Some(Type::builtin(text));
    }
    match globals.resolve_class(text) {
        Some(class) => Some(Type::class(text, Some(class))),
        None => {
            diag.report(DiagnosticKind::UnknownType, span)
                .message(format!("unknown type '{}'", text))
                .emit();
            None
        }
    }
}

#[derive(Clone, Copy)]
enum MemberRef {
    Method(MethodId),
    Ctor(CtorId),
}

pub fn resolve_signatures(ast: &mut Ast, globals: &GlobalScope, diag: &mut Diagnostics) {
    for class in ast.class_ids() {
        let members = ast.class(class).members.clone();
        for member in members {
            match member {
                Member::Field(_) => {}
                Member::Method(method) => {
                    resolve_params(ast, globals, diag, MemberRef::Method(method));

                    let return_type = match ast.method(method).return_type_name.clone() {
                        Some(name) => resolve_type_name(&name.text, name.span, globals, diag),
                        None => Some(Type::Void),
                    };
                    if let Some(ty) = return_type {
                        ast.method_mut(method).return_type = Some(ty);
                    }
                }
                Member::Ctor(ctor) => {
                    resolve_params(ast, globals, diag, MemberRef::Ctor(ctor));
                }
            }
        }
    }
}

fn resolve_params(ast: &mut Ast, globals: &GlobalScope, diag: &mut Diagnostics, member: MemberRef) {
    let count = match member {
        MemberRef::Method(m) => ast.method(m).params.len(),
        MemberRef::Ctor(c) => ast.ctor(c).params.len(),
    };
    for i in 0..count {
        let type_name = match member {
            MemberRef::Method(m) => ast.method(m).params[i].type_name.clone(),
            MemberRef::Ctor(c) => ast.ctor(c).params[i].type_name.clone(),
        };
        let Some(ty) = resolve_type_name(&type_name.text, type_name.span, globals, diag) else {
            continue;
        };
        let binding = match member {
            MemberRef::Method(m) => {
                let param = &mut ast.method_mut(m).params[i];
                param.resolved_type = Some(ty.clone());
                param.binding
            }
            MemberRef::Ctor(c) => {
                let param = &mut ast.ctor_mut(c).params[i];
                param.resolved_type = Some(ty.clone());
                param.binding
            }
        };
        // Mirror onto the body-scope binding so identifier lookups see it.
        if let Some(binding) = binding {
            ast.var_mut(binding).resolved_type = Some(ty);
        }
    }
}
