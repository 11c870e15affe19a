//! Compact tree dump of the AST, for tests and debugging.
//!
//! Spans and semantic slots are deliberately omitted so dumps stay stable
//! across passes that only fill resolution slots.

use super::{Ast, ClassId, ExprId, ExprKind, Member, StmtId, StmtKind};

pub fn dump(ast: &Ast) -> String {
    let mut w = Writer::new(ast);
    for class in ast.class_ids() {
        w.class(class);
    }
    w.out
}

struct Writer<'a> {
    ast: &'a Ast,
    out: String,
    indent: usize,
}

impl<'a> Writer<'a> {
    fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn class(&mut self, id: ClassId) {
        let class = self.ast.class(id);
        match &class.base_name {
            Some(base) => self.line(&format!("class {} extends {}", class.name, base.text)),
            None => self.line(&format!("class {}", class.name)),
        }
        let members = class.members.clone();
        self.nested(|w| {
            for member in members {
                w.member(member);
            }
        });
    }

    fn member(&mut self, member: Member) {
        match member {
            Member::Field(var) => {
                let decl = self.ast.var(var);
                let init = decl.init;
                self.line(&format!("field {}", decl.name));
                if let Some(init) = init {
                    self.nested(|w| w.expr(init));
                }
            }
            Member::Method(id) => {
                let method = self.ast.method(id);
                let params: Vec<String> = method
                    .params
                    .iter()
                    .map(|p| format!("{} : {}", p.name, p.type_name.text))
                    .collect();
                let ret = match &method.return_type_name {
                    Some(t) => format!(" : {}", t.text),
                    None => String::new(),
                };
                let suffix = if method.body.is_none() { " (forward)" } else { "" };
                self.line(&format!(
                    "method {}({}){}{}",
                    method.name,
                    params.join(", "),
                    ret,
                    suffix
                ));
                if let Some(body) = method.body.clone() {
                    self.nested(|w| w.block(&body));
                }
            }
            Member::Ctor(id) => {
                let ctor = self.ast.ctor(id);
                let params: Vec<String> = ctor
                    .params
                    .iter()
                    .map(|p| format!("{} : {}", p.name, p.type_name.text))
                    .collect();
                let body = ctor.body.clone();
                self.line(&format!("ctor ({})", params.join(", ")));
                self.nested(|w| w.block(&body));
            }
        }
    }

    fn block(&mut self, stmts: &[StmtId]) {
        for &stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, id: StmtId) {
        match self.ast.stmt(id).kind.clone() {
            StmtKind::Var(var) => {
                let decl = self.ast.var(var);
                let init = decl.init;
                self.line(&format!("var {}", decl.name));
                if let Some(init) = init {
                    self.nested(|w| w.expr(init));
                }
            }
            StmtKind::Assign { name, value, .. } => {
                self.line(&format!("assign {}", name));
                self.nested(|w| w.expr(value));
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.line("if");
                self.nested(|w| {
                    w.line("cond:");
                    w.nested(|w| w.expr(cond));
                    w.line("then:");
                    w.nested(|w| w.block(&then_body));
                    if let Some(else_body) = else_body {
                        w.line("else:");
                        w.nested(|w| w.block(&else_body));
                    }
                });
            }
            StmtKind::While { cond, body } => {
                self.line("while");
                self.nested(|w| {
                    w.line("cond:");
                    w.nested(|w| w.expr(cond));
                    w.line("body:");
                    w.nested(|w| w.block(&body));
                });
            }
            StmtKind::Return { value } => {
                self.line("return");
                if let Some(value) = value {
                    self.nested(|w| w.expr(value));
                }
            }
            StmtKind::Expr(expr) => {
                self.line("expr-stmt");
                self.nested(|w| w.expr(expr));
            }
            StmtKind::Error => self.line("error-stmt"),
        }
    }

    fn expr(&mut self, id: ExprId) {
        match self.ast.expr(id).kind.clone() {
            ExprKind::Integer(value) => self.line(&format!("int {}", value)),
            ExprKind::Real(value) => self.line(&format!("real {}", value)),
            ExprKind::Boolean(value) => self.line(&format!("bool {}", value)),
            ExprKind::This => self.line("this"),
            ExprKind::Ident { name, .. } => self.line(&format!("ident {}", name)),
            ExprKind::ConstructorCall {
                class_name, args, ..
            } => {
                self.line(&format!("new {}", class_name.text));
                self.nested(|w| {
                    for arg in args {
                        w.expr(arg);
                    }
                });
            }
            ExprKind::MethodCall {
                target, name, args, ..
            } => {
                self.line(&format!("call {}", name));
                self.nested(|w| {
                    w.expr(target);
                    for arg in args {
                        w.expr(arg);
                    }
                });
            }
            ExprKind::FieldAccess { target, name, .. } => {
                self.line(&format!("field-access {}", name));
                self.nested(|w| w.expr(target));
            }
            ExprKind::Error => self.line("error-expr"),
        }
    }
}
