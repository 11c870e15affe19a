//! Symbol table construction and name resolution.
//!
//! Three sub-passes:
//! 1. Register classes in the global scope and wire up inheritance links,
//!    detecting self-extension, extension of built-ins and cycles.
//! 2. Build per-class member tables: fields by name, methods and
//!    constructors by textual signature.
//! 3. Resolve identifiers in every initializer and body to a local,
//!    parameter or field; resolve constructor-call class names. Method and
//!    member names inside call chains are deferred to the type checker,
//!    which needs the target types first.

use std::collections::HashSet;

use crate::ast::{Ast, ClassId, ExprId, ExprKind, Member, Param, StmtId, StmtKind, VarDecl, VarId, VarKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::scope::{GlobalScope, GlobalSymbol, ScopeStack};

pub fn build_symbols(ast: &mut Ast, diag: &mut Diagnostics) -> GlobalScope {
    let globals = register_classes(ast, diag);
    build_member_tables(ast, diag);
    resolve_bodies(ast, &globals, diag);
    globals
}

fn register_classes(ast: &mut Ast, diag: &mut Diagnostics) -> GlobalScope {
    let mut globals = GlobalScope::with_builtins();

    for id in ast.class_ids() {
        let class = ast.class(id);
        if globals.is_builtin(&class.name) {
            diag.report(DiagnosticKind::DuplicateClass, class.name_span)
                .message(format!("'{}' is a built-in type name", class.name))
                .emit();
            continue;
        }
        if !globals.define(&class.name, GlobalSymbol::Class(id)) {
            diag.report(DiagnosticKind::DuplicateClass, class.name_span)
                .message(format!("duplicate class '{}'", class.name))
                .emit();
        }
    }

    link_bases(ast, &globals, diag);
    detect_cycles(ast, diag);

    globals
}

fn link_bases(ast: &mut Ast, globals: &GlobalScope, diag: &mut Diagnostics) {
    for id in ast.class_ids() {
        let Some(base_name) = ast.class(id).base_name.clone() else {
            continue;
        };
        if globals.is_builtin(&base_name.text) {
            diag.report(DiagnosticKind::ExtendsBuiltin, base_name.span)
                .message(format!("cannot extend built-in type '{}'", base_name.text))
                .emit();
            continue;
        }
        match globals.resolve_class(&base_name.text) {
            Some(base) if base == id => {
                diag.report(DiagnosticKind::SelfInheritance, base_name.span)
                    .message(format!("class '{}' cannot extend itself", base_name.text))
                    .emit();
            }
            Some(base) => ast.class_mut(id).base = Some(base),
            None => {
                diag.report(DiagnosticKind::UnknownClass, base_name.span)
                    .message(format!("unknown base class '{}'", base_name.text))
                    .emit();
            }
        }
    }
}

/// Walks each class's parent chain with a visited set. A cycle is reported
/// once, on the class that started the walk, and its link is severed so
/// later chain walks terminate.
fn detect_cycles(ast: &mut Ast, diag: &mut Diagnostics) {
    for id in ast.class_ids() {
        let mut visited = HashSet::from([id]);
        let mut current = ast.class(id).base;
        while let Some(next) = current {
            if next == id {
                let class = ast.class(id);
                diag.report(DiagnosticKind::CircularInheritance, class.name_span)
                    .message(format!(
                        "class '{}' participates in an inheritance cycle",
                        class.name
                    ))
                    .emit();
                ast.class_mut(id).base = None;
                break;
            }
            if !visited.insert(next) {
                break;
            }
            current = ast.class(next).base;
        }
    }
}

fn build_member_tables(ast: &mut Ast, diag: &mut Diagnostics) {
    for id in ast.class_ids() {
        let members = ast.class(id).members.clone();
        for member in members {
            match member {
                Member::Field(var) => {
                    ast.var_mut(var).owner = Some(id);
                    let (name, name_span) = {
                        let var = ast.var(var);
                        (var.name.clone(), var.name_span)
                    };
                    let class = ast.class_mut(id);
                    if class.fields.contains_key(&name) {
                        diag.report(DiagnosticKind::DuplicateField, name_span)
                            .message(format!("duplicate field '{}'", name))
                            .emit();
                    } else {
                        class.fields.insert(name, var);
                    }
                }
                Member::Method(method) => {
                    ast.method_mut(method).owner = Some(id);
                    check_duplicate_params(&ast.method(method).params.clone(), diag);

                    let sig = ast.method(method).signature();
                    let name_span = ast.method(method).name_span;
                    match ast.class(id).methods.get(&sig).copied() {
                        // A bodied declaration replaces a prior forward
                        // declaration under the same signature.
                        Some(existing)
                            if ast.method(existing).body.is_none()
                                && ast.method(method).body.is_some() =>
                        {
                            ast.class_mut(id).methods.insert(sig, method);
                        }
                        Some(existing) => {
                            let existing_span = ast.method(existing).name_span;
                            diag.report(DiagnosticKind::DuplicateMethod, name_span)
                                .message(format!("duplicate method '{}'", sig))
                                .related_to("first declared here", existing_span)
                                .emit();
                        }
                        None => {
                            ast.class_mut(id).methods.insert(sig, method);
                        }
                    }
                }
                Member::Ctor(ctor) => {
                    ast.ctor_mut(ctor).owner = Some(id);
                    check_duplicate_params(&ast.ctor(ctor).params.clone(), diag);

                    let sig = ast.ctor(ctor).signature();
                    let span = ast.ctor(ctor).span;
                    let class = ast.class_mut(id);
                    if class.ctors.contains_key(&sig) {
                        diag.report(DiagnosticKind::DuplicateConstructor, span)
                            .message(format!("duplicate constructor '{}'", sig))
                            .emit();
                    } else {
                        class.ctors.insert(sig, ctor);
                    }
                }
            }
        }
    }
}

fn check_duplicate_params(params: &[Param], diag: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param.name.clone()) {
            diag.report(DiagnosticKind::DuplicateParameter, param.name_span)
                .message(format!("duplicate parameter '{}'", param.name))
                .emit();
        }
    }
}

fn resolve_bodies(ast: &mut Ast, globals: &GlobalScope, diag: &mut Diagnostics) {
    let classes: Vec<ClassId> = ast.class_ids().collect();
    let mut resolver = Resolver {
        ast,
        globals,
        diag,
        scopes: ScopeStack::new(),
        class: ClassId(0),
        in_body: false,
    };
    for class in classes {
        resolver.class = class;
        let members = resolver.ast.class(class).members.clone();
        for member in members {
            match member {
                Member::Field(var) => resolver.resolve_field(var),
                Member::Method(method) => resolver.resolve_method(method),
                Member::Ctor(ctor) => resolver.resolve_ctor(ctor),
            }
        }
    }
}

struct Resolver<'a> {
    ast: &'a mut Ast,
    globals: &'a GlobalScope,
    diag: &'a mut Diagnostics,
    scopes: ScopeStack,
    class: ClassId,
    /// Inside a method or constructor body, where `this` is allowed.
    in_body: bool,
}

impl Resolver<'_> {
    /// Field initializers resolve in class context: fields of the class
    /// chain are visible, locals are not and `this` is rejected.
    fn resolve_field(&mut self, var: VarId) {
        if let Some(init) = self.ast.var(var).init {
            self.in_body = false;
            self.resolve_expr(init);
        }
    }

    fn resolve_method(&mut self, method: crate::ast::MethodId) {
        let Some(body) = self.ast.method(method).body.clone() else {
            return;
        };
        self.in_body = true;
        self.scopes.push();
        for i in 0..self.ast.method(method).params.len() {
            let binding = self.bind_param(&self.ast.method(method).params[i].clone());
            self.ast.method_mut(method).params[i].binding = Some(binding);
        }
        self.resolve_block(&body);
        self.scopes.pop();
    }

    fn resolve_ctor(&mut self, ctor: crate::ast::CtorId) {
        let body = self.ast.ctor(ctor).body.clone();
        self.in_body = true;
        self.scopes.push();
        for i in 0..self.ast.ctor(ctor).params.len() {
            let binding = self.bind_param(&self.ast.ctor(ctor).params[i].clone());
            self.ast.ctor_mut(ctor).params[i].binding = Some(binding);
        }
        self.resolve_block(&body);
        self.scopes.pop();
    }

    /// Binds a parameter as a variable record in the body scope. Duplicate
    /// names were already reported by the member-table pass.
    fn bind_param(&mut self, param: &Param) -> VarId {
        let var = self.ast.alloc_var(VarDecl {
            name: param.name.clone(),
            name_span: param.name_span,
            span: param.span,
            kind: VarKind::Parameter,
            init: None,
            owner: Some(self.class),
            resolved_type: None,
        });
        self.scopes.define(&param.name, var);
        var
    }

    fn resolve_block(&mut self, stmts: &[StmtId]) {
        for &stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, id: StmtId) {
        match self.ast.stmt(id).kind.clone() {
            StmtKind::Var(var) => {
                // The initializer resolves before the name is in scope.
                if let Some(init) = self.ast.var(var).init {
                    self.resolve_expr(init);
                }
                let (name, name_span) = {
                    let var = self.ast.var(var);
                    (var.name.clone(), var.name_span)
                };
                if !self.scopes.define(&name, var) {
                    self.diag
                        .report(DiagnosticKind::DuplicateVariable, name_span)
                        .message(format!("duplicate variable '{}'", name))
                        .emit();
                }
            }
            StmtKind::Assign {
                name,
                name_span,
                value,
                ..
            } => {
                self.resolve_expr(value);
                let target = self
                    .scopes
                    .resolve(&name)
                    .or_else(|| self.ast.lookup_field(self.class, &name));
                match target {
                    Some(var) => {
                        if let StmtKind::Assign { target, .. } = &mut self.ast.stmt_mut(id).kind {
                            *target = Some(var);
                        }
                    }
                    None => {
                        self.diag
                            .report(DiagnosticKind::UndefinedIdentifier, name_span)
                            .message(format!("undefined identifier '{}'", name))
                            .emit();
                    }
                }
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.resolve_expr(cond);
                self.resolve_block(&then_body);
                if let Some(else_body) = else_body {
                    self.resolve_block(&else_body);
                }
            }
            StmtKind::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_block(&body);
            }
            StmtKind::Return { value } => {
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            StmtKind::Expr(expr) => self.resolve_expr(expr),
            StmtKind::Error => {}
        }
    }

    fn resolve_expr(&mut self, id: ExprId) {
        match self.ast.expr(id).kind.clone() {
            ExprKind::Ident { name, .. } => {
                let target = self
                    .scopes
                    .resolve(&name)
                    .or_else(|| self.ast.lookup_field(self.class, &name));
                match target {
                    Some(var) => {
                        if let ExprKind::Ident { resolved, .. } = &mut self.ast.expr_mut(id).kind {
                            *resolved = Some(var);
                        }
                    }
                    None => {
                        let span = self.ast.expr(id).span;
                        self.diag
                            .report(DiagnosticKind::UndefinedIdentifier, span)
                            .message(format!("undefined identifier '{}'", name))
                            .emit();
                    }
                }
            }
            ExprKind::ConstructorCall {
                class_name, args, ..
            } => {
                for arg in args {
                    self.resolve_expr(arg);
                }
                // Built-in names (including the Array[T] form) stay
                // unresolved here; the type checker validates them.
                if self.globals.is_builtin(&class_name.text)
                    || class_name.text.starts_with("Array[")
                {
                    return;
                }
                match self.globals.resolve_class(&class_name.text) {
                    Some(class) => {
                        if let ExprKind::ConstructorCall { class: slot, .. } =
                            &mut self.ast.expr_mut(id).kind
                        {
                            *slot = Some(class);
                        }
                    }
                    None => {
                        self.diag
                            .report(DiagnosticKind::UnknownClass, class_name.span)
                            .message(format!("unknown class '{}'", class_name.text))
                            .emit();
                    }
                }
            }
            ExprKind::MethodCall { target, args, .. } => {
                self.resolve_expr(target);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::FieldAccess { target, .. } => self.resolve_expr(target),
            ExprKind::This => {
                if !self.in_body {
                    let span = self.ast.expr(id).span;
                    self.diag
                        .report(DiagnosticKind::ThisOutsideMethod, span)
                        .emit();
                }
            }
            ExprKind::Integer(_) | ExprKind::Real(_) | ExprKind::Boolean(_) | ExprKind::Error => {}
        }
    }
}
