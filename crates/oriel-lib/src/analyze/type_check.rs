//! Type inference and checking (the second type-checker sub-pass).
//!
//! Populates `inferredType` slots bottom-up, resolves method and member
//! names against target types, and enforces the statement-level rules:
//! Boolean conditions, return/Void agreement, assignment compatibility.
//!
//! Field and local types are inferred from their initializers. Fields are
//! typed on demand so an initializer may reference a field declared later
//! (or inherited from a class declared later in the file); a cycle between
//! field initializers is reported once.

use std::collections::HashSet;

use crate::ast::{Ast, ClassId, CtorId, ExprId, ExprKind, Member, StmtId, StmtKind, VarId, VarKind, signature};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::scope::GlobalScope;
use crate::stdlib::Builtins;
use crate::types::{self, Type};

use super::signatures::resolve_type_name;

pub fn check_types(
    ast: &mut Ast,
    globals: &GlobalScope,
    builtins: &Builtins,
    diag: &mut Diagnostics,
) {
    let mut checker = Checker {
        ast,
        globals,
        builtins,
        diag,
        fields_in_progress: HashSet::new(),
    };
    checker.run();
}

/// Statement-level context: the enclosing class and the return type the
/// enclosing method promises (`Void` in constructors and field initializers).
struct Ctx {
    class: ClassId,
    return_type: Type,
}

struct Checker<'a> {
    ast: &'a mut Ast,
    globals: &'a GlobalScope,
    builtins: &'a Builtins,
    diag: &'a mut Diagnostics,
    fields_in_progress: HashSet<VarId>,
}

impl Checker<'_> {
    fn run(&mut self) {
        for class in self.ast.class_ids() {
            let members = self.ast.class(class).members.clone();
            for member in &members {
                if let Member::Field(var) = member {
                    self.field_type(*var);
                }
            }
            for member in members {
                match member {
                    Member::Field(_) => {}
                    Member::Method(method) => {
                        let Some(body) = self.ast.method(method).body.clone() else {
                            continue;
                        };
                        let ctx = Ctx {
                            class,
                            return_type: self
                                .ast
                                .method(method)
                                .return_type
                                .clone()
                                .unwrap_or(Type::Void),
                        };
                        self.check_block(&body, &ctx);
                    }
                    Member::Ctor(ctor) => {
                        let body = self.ast.ctor(ctor).body.clone();
                        let ctx = Ctx {
                            class,
                            return_type: Type::Void,
                        };
                        self.check_block(&body, &ctx);
                    }
                }
            }
        }
    }

    /// Infers a field's type from its initializer, on demand and memoized.
    fn field_type(&mut self, var: VarId) -> Option<Type> {
        if let Some(ty) = self.ast.var(var).resolved_type.clone() {
            return Some(ty);
        }
        let decl = self.ast.var(var);
        let (Some(init), Some(owner)) = (decl.init, decl.owner) else {
            return None;
        };

        if !self.fields_in_progress.insert(var) {
            let decl = self.ast.var(var);
            let (span, name) = (decl.name_span, decl.name.clone());
            self.diag
                .report(DiagnosticKind::CircularFieldInitializer, span)
                .message(format!(
                    "initializer of field '{}' depends on its own value",
                    name
                ))
                .emit();
            return None;
        }
        let ctx = Ctx {
            class: owner,
            return_type: Type::Void,
        };
        let ty = self.infer_expr(init, &ctx);
        self.fields_in_progress.remove(&var);

        match ty {
            Some(ty) if ty.is_void() => {
                let span = self.ast.expr(init).span;
                self.diag.report(DiagnosticKind::VoidInitializer, span).emit();
                None
            }
            Some(ty) => {
                self.ast.var_mut(var).resolved_type = Some(ty.clone());
                Some(ty)
            }
            None => None,
        }
    }

    /// The type of a resolved variable: declared for parameters, inferred
    /// from the initializer for fields and locals.
    fn var_type(&mut self, var: VarId) -> Option<Type> {
        if let Some(ty) = self.ast.var(var).resolved_type.clone() {
            return Some(ty);
        }
        match self.ast.var(var).kind {
            VarKind::Field => self.field_type(var),
            // Unresolved parameter or not-yet-declared local: an error was
            // already reported upstream.
            VarKind::Parameter | VarKind::Local => None,
        }
    }

    fn check_block(&mut self, stmts: &[StmtId], ctx: &Ctx) {
        for &stmt in stmts {
            self.check_stmt(stmt, ctx);
        }
    }

    fn check_stmt(&mut self, id: StmtId, ctx: &Ctx) {
        match self.ast.stmt(id).kind.clone() {
            StmtKind::Var(var) => {
                let Some(init) = self.ast.var(var).init else {
                    return;
                };
                let Some(ty) = self.infer_expr(init, ctx) else {
                    return;
                };
                if ty.is_void() {
                    let span = self.ast.expr(init).span;
                    self.diag.report(DiagnosticKind::VoidInitializer, span).emit();
                } else {
                    self.ast.var_mut(var).resolved_type = Some(ty);
                }
            }
            StmtKind::Assign {
                name,
                name_span,
                value,
                target,
            } => {
                let value_ty = self.infer_expr(value, ctx);
                let Some(target) = target else {
                    return; // unresolved, reported by the resolver
                };
                let target_ty = self.var_type(target);
                if let (Some(value_ty), Some(target_ty)) = (value_ty, target_ty)
                    && !value_ty.is_compatible_with(&target_ty, self.ast)
                {
                    self.diag
                        .report(DiagnosticKind::AssignmentTypeMismatch, name_span)
                        .message(format!(
                            "cannot assign '{}' to '{}' of type '{}'",
                            value_ty, name, target_ty
                        ))
                        .emit();
                }
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.check_condition(cond, ctx);
                self.check_block(&then_body, ctx);
                if let Some(else_body) = else_body {
                    self.check_block(&else_body, ctx);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, ctx);
                self.check_block(&body, ctx);
            }
            StmtKind::Return { value } => self.check_return(id, value, ctx),
            StmtKind::Expr(expr) => {
                self.infer_expr(expr, ctx);
            }
            StmtKind::Error => {}
        }
    }

    fn check_condition(&mut self, cond: ExprId, ctx: &Ctx) {
        if let Some(ty) = self.infer_expr(cond, ctx)
            && !ty.is_class_named(types::BOOLEAN)
        {
            let span = self.ast.expr(cond).span;
            self.diag
                .report(DiagnosticKind::ConditionNotBoolean, span)
                .message(format!("condition must be Boolean, found '{}'", ty))
                .emit();
        }
    }

    fn check_return(&mut self, id: StmtId, value: Option<ExprId>, ctx: &Ctx) {
        let span = self.ast.stmt(id).span;
        match value {
            Some(value) => {
                let value_ty = self.infer_expr(value, ctx);
                if ctx.return_type.is_void() {
                    self.diag
                        .report(DiagnosticKind::ReturnTypeMismatch, span)
                        .message("cannot return a value from a Void method or constructor")
                        .emit();
                    return;
                }
                if let Some(value_ty) = value_ty
                    && !value_ty.is_compatible_with(&ctx.return_type, self.ast)
                {
                    self.diag
                        .report(DiagnosticKind::ReturnTypeMismatch, span)
                        .message(format!(
                            "expected '{}', found '{}'",
                            ctx.return_type, value_ty
                        ))
                        .emit();
                }
            }
            None => {
                if !ctx.return_type.is_void() {
                    self.diag
                        .report(DiagnosticKind::ReturnTypeMismatch, span)
                        .message(format!("method must return '{}'", ctx.return_type))
                        .emit();
                }
            }
        }
    }

    /// Bottom-up inference; stores the result on the node. `None` means a
    /// diagnostic was already reported somewhere below.
    fn infer_expr(&mut self, id: ExprId, ctx: &Ctx) -> Option<Type> {
        let ty = match self.ast.expr(id).kind.clone() {
            ExprKind::Integer(_) => Some(Type::integer()),
            ExprKind::Real(_) => Some(Type::real()),
            ExprKind::Boolean(_) => Some(Type::boolean()),
            ExprKind::This => {
                let name = self.ast.class(ctx.class).name.clone();
                Some(Type::class(name, Some(ctx.class)))
            }
            ExprKind::Ident { resolved, .. } => {
                let var = resolved?;
                self.var_type(var)
            }
            ExprKind::ConstructorCall {
                class_name,
                args,
                class,
                ..
            } => self.infer_ctor_call(id, &class_name.text, class_name.span, &args, class, ctx),
            ExprKind::MethodCall {
                target,
                name,
                name_span,
                args,
                ..
            } => self.infer_method_call(id, target, &name, name_span, &args, ctx),
            ExprKind::FieldAccess {
                target,
                name,
                name_span,
                ..
            } => self.infer_field_access(id, target, &name, name_span, ctx),
            ExprKind::Error => None,
        };

        if let Some(ty) = &ty {
            self.ast.expr_mut(id).ty = Some(ty.clone());
        }
        ty
    }

    fn infer_ctor_call(
        &mut self,
        id: ExprId,
        name: &str,
        name_span: crate::span::Span,
        args: &[ExprId],
        class: Option<ClassId>,
        ctx: &Ctx,
    ) -> Option<Type> {
        let arg_types: Vec<Option<Type>> =
            args.iter().map(|&arg| self.infer_expr(arg, ctx)).collect();
        // When an argument already failed, skip the contract check to avoid
        // a cascade; the expression type is still known for most forms.
        let clean = arg_types.iter().all(Option::is_some);
        let args_t: Vec<Type> = arg_types.into_iter().flatten().collect();

        if name.starts_with("Array[") {
            let ty = resolve_type_name(name, name_span, self.globals, self.diag)?;
            if clean && (args_t.len() != 1 || !args_t[0].is_class_named(types::INTEGER)) {
                self.diag
                    .report(DiagnosticKind::ConstructorMismatch, name_span)
                    .message("an Array constructor takes a single Integer length")
                    .emit();
            }
            return Some(ty);
        }

        match name {
            types::INTEGER | types::REAL | types::BOOLEAN => {
                let expected = Type::builtin(name);
                if clean && (args_t.len() != 1 || args_t[0] != expected) {
                    self.diag
                        .report(DiagnosticKind::ConstructorMismatch, name_span)
                        .message(format!(
                            "the '{}' constructor takes a single {} argument",
                            name, name
                        ))
                        .emit();
                }
                Some(expected)
            }
            types::PRINTER => {
                if clean && !args_t.is_empty() {
                    self.diag
                        .report(DiagnosticKind::ConstructorMismatch, name_span)
                        .message("the 'Printer' constructor takes no arguments")
                        .emit();
                }
                Some(Type::printer())
            }
            _ => {
                let class = class?; // unresolved, reported by the resolver
                let result = Type::class(name, Some(class));
                if !clean {
                    return Some(result);
                }

                match self.find_ctor(class, &args_t) {
                    Some(ctor) => {
                        if let ExprKind::ConstructorCall { ctor: slot, .. } =
                            &mut self.ast.expr_mut(id).kind
                        {
                            *slot = Some(ctor);
                        }
                    }
                    None => {
                        // A class declaring no constructors still has the
                        // implicit parameterless one.
                        let implicit_default =
                            args_t.is_empty() && self.ast.class(class).ctors.is_empty();
                        if !implicit_default {
                            self.diag
                                .report(DiagnosticKind::ConstructorMismatch, name_span)
                                .message(format!(
                                    "no matching constructor '{}'",
                                    signature(name, args_t.iter().map(Type::name))
                                ))
                                .emit();
                        }
                    }
                }
                Some(result)
            }
        }
    }

    /// Constructors are not inherited: only the target class is searched.
    /// Matching is by arity plus pairwise compatibility; first match wins.
    fn find_ctor(&self, class: ClassId, args: &[Type]) -> Option<CtorId> {
        for (_, &ctor) in &self.ast.class(class).ctors {
            let params = &self.ast.ctor(ctor).params;
            if params.len() != args.len() {
                continue;
            }
            let accepts = params.iter().zip(args).all(|(param, arg)| {
                param
                    .resolved_type
                    .as_ref()
                    .is_some_and(|p| arg.is_compatible_with(p, self.ast))
            });
            if accepts {
                return Some(ctor);
            }
        }
        None
    }

    fn infer_method_call(
        &mut self,
        id: ExprId,
        target: ExprId,
        name: &str,
        name_span: crate::span::Span,
        args: &[ExprId],
        ctx: &Ctx,
    ) -> Option<Type> {
        // Calls on bare literals are rejected to force the explicit
        // `Integer(...).Plus(...)` form.
        if self.ast.expr(target).kind.is_literal() {
            let span = self.ast.expr(target).span;
            self.diag
                .report(DiagnosticKind::MethodCallOnLiteral, span)
                .emit();
            return None;
        }

        let target_ty = self.infer_expr(target, ctx)?;
        let arg_types: Vec<Option<Type>> =
            args.iter().map(|&arg| self.infer_expr(arg, ctx)).collect();
        if arg_types.iter().any(Option::is_none) {
            return None;
        }
        let args_t: Vec<Type> = arg_types.into_iter().flatten().collect();

        match &target_ty {
            Type::Array(element) => {
                self.infer_array_call(element, name, name_span, &args_t, &target_ty)
            }
            ty if ty.is_builtin() => match self.builtins.lookup(&ty.name(), name, &args_t) {
                Some(sig) => Some(sig.ret),
                None => {
                    self.diag
                        .report(DiagnosticKind::NoMatchingMethod, name_span)
                        .message(format!(
                            "no built-in method '{}' on '{}'",
                            signature(name, args_t.iter().map(Type::name)),
                            ty
                        ))
                        .emit();
                    None
                }
            },
            Type::Class {
                decl: Some(class), ..
            } => self.infer_user_call(id, *class, name, name_span, &args_t),
            _ => {
                self.diag
                    .report(DiagnosticKind::NoMatchingMethod, name_span)
                    .message(format!("type '{}' has no methods", target_ty))
                    .emit();
                None
            }
        }
    }

    /// `Array[T]` methods are structural: they depend on the element type
    /// and are not part of the stdlib registry.
    fn infer_array_call(
        &mut self,
        element: &Type,
        name: &str,
        name_span: crate::span::Span,
        args: &[Type],
        target_ty: &Type,
    ) -> Option<Type> {
        match (name, args) {
            ("get", [index]) if index.is_class_named(types::INTEGER) => {
                Some(element.clone())
            }
            ("set", [index, value])
                if index.is_class_named(types::INTEGER)
                    && value.is_compatible_with(element, self.ast) =>
            {
                Some(Type::Void)
            }
            ("Length", []) => Some(Type::integer()),
            _ => {
                self.diag
                    .report(DiagnosticKind::NoMatchingMethod, name_span)
                    .message(format!(
                        "no method '{}' on '{}'",
                        signature(name, args.iter().map(Type::name)),
                        target_ty
                    ))
                    .emit();
                None
            }
        }
    }

    fn infer_user_call(
        &mut self,
        id: ExprId,
        class: ClassId,
        name: &str,
        name_span: crate::span::Span,
        args: &[Type],
    ) -> Option<Type> {
        // Exact signature first, then name-based candidates with per-argument
        // compatibility; resolution order is subclass-first in both cases.
        let exact = signature(name, args.iter().map(Type::name));
        let found = self.ast.lookup_method(class, &exact).or_else(|| {
            self.ast
                .methods_named(class, name)
                .into_iter()
                .find(|&method| {
                    let params = &self.ast.method(method).params;
                    params.len() == args.len()
                        && params.iter().zip(args).all(|(param, arg)| {
                            param
                                .resolved_type
                                .as_ref()
                                .is_some_and(|p| arg.is_compatible_with(p, self.ast))
                        })
                })
        });

        match found {
            Some(method) => {
                if let ExprKind::MethodCall { resolved, .. } = &mut self.ast.expr_mut(id).kind {
                    *resolved = Some(method);
                }
                self.ast.method(method).return_type.clone()
            }
            None => {
                self.diag
                    .report(DiagnosticKind::NoMatchingMethod, name_span)
                    .message(format!(
                        "no matching method '{}' on class '{}'",
                        exact,
                        self.ast.class(class).name
                    ))
                    .emit();
                None
            }
        }
    }

    fn infer_field_access(
        &mut self,
        id: ExprId,
        target: ExprId,
        name: &str,
        name_span: crate::span::Span,
        ctx: &Ctx,
    ) -> Option<Type> {
        let target_ty = self.infer_expr(target, ctx)?;
        let Type::Class {
            decl: Some(class), ..
        } = &target_ty
        else {
            self.diag
                .report(DiagnosticKind::UnknownField, name_span)
                .message(format!("type '{}' has no fields", target_ty))
                .emit();
            return None;
        };

        match self.ast.lookup_field(*class, name) {
            Some(var) => {
                if let ExprKind::FieldAccess { resolved, .. } = &mut self.ast.expr_mut(id).kind {
                    *resolved = Some(var);
                }
                self.field_type(var)
            }
            None => {
                self.diag
                    .report(DiagnosticKind::UnknownField, name_span)
                    .message(format!(
                        "class '{}' has no field '{}'",
                        target_ty, name
                    ))
                    .emit();
                None
            }
        }
    }
}
