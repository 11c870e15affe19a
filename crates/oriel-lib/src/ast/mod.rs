//! Abstract syntax tree for Oriel programs.
//!
//! Nodes live in per-kind arenas owned by [`Ast`] and reference each other
//! through typed indices. Semantic slots (`resolved_*`, `ty`, member tables)
//! are plain `Option` fields: the parser leaves them empty, the analysis
//! passes fill them, the emitter reads them. The whole tree lives for the
//! duration of one compilation unit; nothing is deallocated between passes.

pub mod dump;


use indexmap::IndexMap;

use crate::span::Span;
use crate::types::Type;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Index into [`Ast::classes`].
    ClassId
);
define_id!(
    /// Index into [`Ast::methods`].
    MethodId
);
define_id!(
    /// Index into [`Ast::ctors`].
    CtorId
);
define_id!(
    /// Index into [`Ast::vars`].
    VarId
);
define_id!(
    /// Index into [`Ast::stmts`].
    StmtId
);
define_id!(
    /// Index into [`Ast::exprs`].
    ExprId
);

/// A source type name as written, e.g. `Integer` or `Array[Point]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub text: String,
    pub span: Span,
}

/// One class member, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Field(VarId),
    Method(MethodId),
    Ctor(CtorId),
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub name_span: Span,
    pub span: Span,
    pub base_name: Option<TypeName>,
    pub members: Vec<Member>,

    // Resolution slots, filled by the symbol table builder. The class doubles
    // as a scope: member lookup walks the `base` chain.
    pub base: Option<ClassId>,
    pub fields: IndexMap<String, VarId>,
    /// Methods keyed by textual signature `name(T1,T2,...)`.
    pub methods: IndexMap<String, MethodId>,
    /// Constructors keyed by textual signature `this(T1,T2,...)`.
    pub ctors: IndexMap<String, CtorId>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub name_span: Span,
    pub span: Span,
    pub params: Vec<Param>,
    pub return_type_name: Option<TypeName>,
    /// `None` for a forward declaration.
    pub body: Option<Vec<StmtId>>,

    pub owner: Option<ClassId>,
    /// Resolved return type; `Void` when no annotation was written.
    pub return_type: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct CtorDecl {
    pub span: Span,
    pub params: Vec<Param>,
    pub body: Vec<StmtId>,

    pub owner: Option<ClassId>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub name_span: Span,
    pub type_name: TypeName,
    pub span: Span,

    pub resolved_type: Option<Type>,
    /// Variable record binding this parameter inside the body scope,
    /// synthesized by the symbol table builder.
    pub binding: Option<VarId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Field,
    Local,
    Parameter,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub name_span: Span,
    pub span: Span,
    pub kind: VarKind,
    /// `None` only for parameter bindings.
    pub init: Option<ExprId>,

    /// Declaring class, for fields.
    pub owner: Option<ClassId>,
    /// Declared type (parameters, via the signature pass) or inferred from
    /// the initializer (fields and locals, via the type checker).
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Var(VarId),
    Assign {
        name: String,
        name_span: Span,
        value: ExprId,
        /// Resolved target: a local, parameter or field.
        target: Option<VarId>,
    },
    If {
        cond: ExprId,
        then_body: Vec<StmtId>,
        else_body: Option<Vec<StmtId>>,
    },
    While {
        cond: ExprId,
        body: Vec<StmtId>,
    },
    Return {
        value: Option<ExprId>,
    },
    Expr(ExprId),
    /// Placeholder produced during parse error recovery.
    Error,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Inferred type, filled by the type checker.
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    This,
    Ident {
        name: String,
        resolved: Option<VarId>,
    },
    /// `ClassName(args)`, including built-in wrappers and `Array[T](len)`.
    ConstructorCall {
        class_name: TypeName,
        args: Vec<ExprId>,
        /// Resolved user class; `None` for built-in names.
        class: Option<ClassId>,
        /// Resolved user constructor; `None` for built-ins and the implicit
        /// parameterless constructor.
        ctor: Option<CtorId>,
    },
    MethodCall {
        target: ExprId,
        name: String,
        name_span: Span,
        args: Vec<ExprId>,
        /// Resolved user-class method; `None` for built-in and array calls.
        resolved: Option<MethodId>,
    },
    FieldAccess {
        target: ExprId,
        name: String,
        name_span: Span,
        resolved: Option<VarId>,
    },
    /// Placeholder produced during parse error recovery.
    Error,
}

impl ExprKind {
    /// Syntactic literal, as restricted by the method-call-on-literal rule.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            ExprKind::Integer(_) | ExprKind::Real(_) | ExprKind::Boolean(_)
        )
    }
}

/// Arena-backed syntax tree for one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub classes: Vec<ClassDecl>,
    pub methods: Vec<MethodDecl>,
    pub ctors: Vec<CtorDecl>,
    pub vars: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
    pub exprs: Vec<Expr>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class ids in declaration order. Does not borrow the arena, so passes
    /// may mutate nodes while iterating.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + use<> {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn alloc_class(&mut self, class: ClassDecl) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn alloc_method(&mut self, method: MethodDecl) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(method);
        id
    }

    pub fn alloc_ctor(&mut self, ctor: CtorDecl) -> CtorId {
        let id = CtorId(self.ctors.len() as u32);
        self.ctors.push(ctor);
        id
    }

    pub fn alloc_var(&mut self, var: VarDecl) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDecl {
        &mut self.classes[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDecl {
        &mut self.methods[id.index()]
    }

    pub fn ctor(&self, id: CtorId) -> &CtorDecl {
        &self.ctors[id.index()]
    }

    pub fn ctor_mut(&mut self, id: CtorId) -> &mut CtorDecl {
        &mut self.ctors[id.index()]
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.index()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut VarDecl {
        &mut self.vars[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    /// Walks the base-class chain starting at `class`, inclusive.
    ///
    /// Bounded by the class count so a cyclic hierarchy (already reported by
    /// the resolver) cannot loop.
    pub fn class_chain(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        let mut current = Some(class);
        let mut remaining = self.classes.len() + 1;
        std::iter::from_fn(move || {
            remaining = remaining.checked_sub(1)?;
            let id = current?;
            current = self.class(id).base;
            Some(id)
        })
    }

    /// Field lookup along the inheritance chain, subclass first.
    pub fn lookup_field(&self, class: ClassId, name: &str) -> Option<VarId> {
        self.class_chain(class)
            .find_map(|c| self.class(c).fields.get(name).copied())
    }

    /// Exact-signature method lookup along the inheritance chain.
    pub fn lookup_method(&self, class: ClassId, signature: &str) -> Option<MethodId> {
        self.class_chain(class)
            .find_map(|c| self.class(c).methods.get(signature).copied())
    }

    /// All methods with the given name along the chain, subclass first.
    pub fn methods_named(&self, class: ClassId, name: &str) -> Vec<MethodId> {
        let mut out = Vec::new();
        for c in self.class_chain(class) {
            for (_, &m) in &self.class(c).methods {
                if self.method(m).name == name {
                    out.push(m);
                }
            }
        }
        out
    }

    /// Finds a class by name; linear scan, used by the entry-point check.
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_ids().find(|&id| self.class(id).name == name)
    }
}

/// Builds the textual signature key `name(T1,T2,...)` from a name and
/// parameter type names.
pub fn signature(name: &str, param_types: impl IntoIterator<Item = String>) -> String {
    let mut sig = String::from(name);
    sig.push('(');
    for (i, t) in param_types.into_iter().enumerate() {
        if i > 0 {
            sig.push(',');
        }
        sig.push_str(&t);
    }
    sig.push(')');
    sig
}

impl MethodDecl {
    /// Declaration signature from the written parameter type names.
    pub fn signature(&self) -> String {
        signature(
            &self.name,
            self.params.iter().map(|p| p.type_name.text.clone()),
        )
    }
}

impl CtorDecl {
    /// Declaration signature from the written parameter type names.
    pub fn signature(&self) -> String {
        signature(
            "this",
            self.params.iter().map(|p| p.type_name.text.clone()),
        )
    }
}
