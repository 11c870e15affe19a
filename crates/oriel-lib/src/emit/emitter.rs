//! Assembly text generation.
//!
//! One file per class: header, field declarations, then one rendered method
//! per constructor and bodied method. Bodies are generated into a scratch
//! buffer while the [`Frame`] tracks slots and symbolic stack depth; the
//! stack/locals limits are prepended once the body is complete.
//!
//! Invariants enforced here (violations are internal errors, not
//! diagnostics): statements are stack-neutral, a value expression leaves
//! exactly `width(type)` slots, and every semantic slot the emitter reads
//! was filled by the earlier passes.

use crate::ast::{Ast, ClassId, ExprId, ExprKind, Member, MethodId, Param, StmtId, StmtKind, VarId, VarKind};
use crate::types::{self, Type};
use crate::{Error, Result};

use super::frame::Frame;

/// Implicit root of the class hierarchy in the target VM.
pub const ROOT_CLASS: &str = "java/lang/Object";

/// One generated assembly file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFile {
    pub name: String,
    pub text: String,
}

/// Emits one file per class, plus the synthetic entry point when a `Start`
/// class with a parameterless constructor and a Void `start()` exists.
pub fn emit_program(ast: &Ast) -> Result<Vec<AssemblyFile>> {
    let mut files = Vec::new();
    for class in ast.class_ids() {
        files.push(emit_class(ast, class)?);
    }
    if entry_point(ast).is_some() {
        files.push(emit_entry_point()?);
    }
    Ok(files)
}

/// Per-class writer states, transitioned strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    ClassHeader,
    FieldSection,
    MemberSection,
    Closed,
}

struct ClassWriter {
    out: String,
    state: WriterState,
}

impl ClassWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            state: WriterState::ClassHeader,
        }
    }

    fn transition(&mut self, from: WriterState, to: WriterState) -> Result<()> {
        if self.state != from {
            return Err(Error::Internal(format!(
                "class writer in state {:?}, expected {:?}",
                self.state, from
            )));
        }
        self.state = to;
        Ok(())
    }

    fn header(&mut self, name: &str, superclass: &str) -> Result<()> {
        self.transition(WriterState::ClassHeader, WriterState::FieldSection)?;
        self.out.push_str(&format!(".class public {}\n", name));
        self.out.push_str(&format!(".super {}\n", superclass));
        Ok(())
    }

    fn field(&mut self, name: &str, descriptor: &str) -> Result<()> {
        if self.state != WriterState::FieldSection {
            return Err(Error::Internal(
                "field emitted outside the field section".to_owned(),
            ));
        }
        self.out
            .push_str(&format!(".field public {} {}\n", name, descriptor));
        Ok(())
    }

    fn begin_members(&mut self) -> Result<()> {
        self.transition(WriterState::FieldSection, WriterState::MemberSection)
    }

    /// `signature` is everything after `.method `, e.g. `public <init>()V`.
    fn method(&mut self, signature: &str, stack: u32, locals: u16, body: &str) -> Result<()> {
        if self.state != WriterState::MemberSection {
            return Err(Error::Internal(
                "method emitted outside the member section".to_owned(),
            ));
        }
        self.out.push('\n');
        self.out.push_str(&format!(".method {}\n", signature));
        self.out.push_str(&format!("    .limit stack {}\n", stack));
        self.out.push_str(&format!("    .limit locals {}\n", locals));
        self.out.push_str(body);
        self.out.push_str(".end method\n");
        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        self.transition(WriterState::MemberSection, WriterState::Closed)?;
        Ok(self.out)
    }
}

fn emit_class(ast: &Ast, class: ClassId) -> Result<AssemblyFile> {
    let decl = ast.class(class);
    let super_name = match decl.base {
        Some(base) => ast.class(base).name.clone(),
        None => ROOT_CLASS.to_owned(),
    };

    let mut writer = ClassWriter::new();
    writer.header(&decl.name, &super_name)?;

    for member in &decl.members {
        if let Member::Field(var) = member {
            let field = ast.var(*var);
            let ty = field
                .resolved_type
                .as_ref()
                .ok_or_else(|| missing_slot("field type", &field.name))?;
            writer.field(&field.name, &ty.descriptor())?;
        }
    }
    writer.begin_members()?;

    // A class without constructors still needs an initializer for `new`.
    if decl.ctors.is_empty() {
        emit_ctor(ast, class, &super_name, None, &mut writer)?;
    }
    for member in &decl.members {
        match member {
            Member::Field(_) => {}
            Member::Ctor(ctor) => emit_ctor(ast, class, &super_name, Some(*ctor), &mut writer)?,
            Member::Method(method) => emit_method(ast, class, *method, &mut writer)?,
        }
    }

    Ok(AssemblyFile {
        name: format!("{}.assembly", decl.name),
        text: writer.finish()?,
    })
}

fn emit_method(ast: &Ast, class: ClassId, method: MethodId, writer: &mut ClassWriter) -> Result<()> {
    let decl = ast.method(method);
    let Some(body) = &decl.body else {
        return Ok(()); // forward declaration without a later body
    };
    let return_type = decl
        .return_type
        .clone()
        .ok_or_else(|| missing_slot("return type", &decl.name))?;

    let mut emitter = MethodEmitter::new(ast, class, &decl.name);
    emitter.frame.reserve_receiver();
    emitter.bind_params(&decl.params)?;
    emitter.emit_block(body)?;
    if return_type.is_void() && !ends_with_return(ast, body) {
        emitter.line("return");
    }

    let signature = format!(
        "public {}({}){}",
        decl.name,
        params_descriptor(&decl.params)?,
        return_type.descriptor()
    );
    writer.method(
        &signature,
        emitter.frame.max_stack(),
        emitter.frame.max_locals(),
        &emitter.body,
    )
}

/// `ctor = None` synthesizes the implicit parameterless constructor. Field
/// initialization happens here, right after the base-class call.
fn emit_ctor(
    ast: &Ast,
    class: ClassId,
    super_name: &str,
    ctor: Option<crate::ast::CtorId>,
    writer: &mut ClassWriter,
) -> Result<()> {
    let class_name = ast.class(class).name.clone();
    let mut emitter = MethodEmitter::new(ast, class, "init");
    emitter.frame.reserve_receiver();
    if let Some(ctor) = ctor {
        emitter.bind_params(&ast.ctor(ctor).params)?;
    }

    emitter.line("aload_0");
    emitter.frame.push(1);
    emitter.line(&format!("invokespecial {}/<init>()V", super_name));
    emitter.frame.pop(1)?;

    for member in &ast.class(class).members {
        let Member::Field(var) = member else { continue };
        let field = ast.var(*var);
        let init = field
            .init
            .ok_or_else(|| missing_slot("field initializer", &field.name))?;
        let ty = field
            .resolved_type
            .clone()
            .ok_or_else(|| missing_slot("field type", &field.name))?;

        emitter.line("aload_0");
        emitter.frame.push(1);
        emitter.emit_expr(init)?;
        emitter.line(&format!(
            "putfield {}/{} {}",
            class_name,
            field.name,
            ty.descriptor()
        ));
        emitter.frame.pop(1 + ty.width())?;
    }

    let (params, body): (&[Param], &[StmtId]) = match ctor {
        Some(ctor) => (&ast.ctor(ctor).params, &ast.ctor(ctor).body),
        None => (&[], &[]),
    };
    emitter.emit_block(body)?;
    if !ends_with_return(ast, body) {
        emitter.line("return");
    }

    let signature = format!("public <init>({})V", params_descriptor(params)?);
    writer.method(
        &signature,
        emitter.frame.max_stack(),
        emitter.frame.max_locals(),
        &emitter.body,
    )
}

fn ends_with_return(ast: &Ast, body: &[StmtId]) -> bool {
    body.last()
        .is_some_and(|&s| matches!(ast.stmt(s).kind, StmtKind::Return { .. }))
}

fn params_descriptor(params: &[Param]) -> Result<String> {
    let mut out = String::new();
    for param in params {
        let ty = param
            .resolved_type
            .as_ref()
            .ok_or_else(|| missing_slot("parameter type", &param.name))?;
        out.push_str(&ty.descriptor());
    }
    Ok(out)
}

fn missing_slot(what: &str, name: &str) -> Error {
    Error::Internal(format!("unresolved {} for '{}' reached the emitter", what, name))
}

struct MethodEmitter<'a> {
    ast: &'a Ast,
    frame: Frame,
    body: String,
}

impl<'a> MethodEmitter<'a> {
    fn new(ast: &'a Ast, class: ClassId, member: &str) -> Self {
        Self {
            ast,
            frame: Frame::new(&ast.class(class).name, member),
            body: String::new(),
        }
    }

    fn bind_params(&mut self, params: &[Param]) -> Result<()> {
        for param in params {
            let var = param
                .binding
                .ok_or_else(|| missing_slot("parameter binding", &param.name))?;
            let ty = param
                .resolved_type
                .as_ref()
                .ok_or_else(|| missing_slot("parameter type", &param.name))?;
            self.frame.alloc_slot(var, ty.is_wide());
        }
        Ok(())
    }

    fn line(&mut self, instruction: &str) {
        self.body.push_str("    ");
        self.body.push_str(instruction);
        self.body.push('\n');
    }

    fn label(&mut self, label: &str) {
        self.body.push_str(label);
        self.body.push_str(":\n");
    }

    fn expr_type(&self, id: ExprId) -> Result<Type> {
        self.ast
            .expr(id)
            .ty
            .clone()
            .ok_or_else(|| Error::Internal("untyped expression reached the emitter".to_owned()))
    }

    fn var_type(&self, var: VarId) -> Result<Type> {
        let decl = self.ast.var(var);
        decl.resolved_type
            .clone()
            .ok_or_else(|| missing_slot("variable type", &decl.name))
    }

    fn emit_block(&mut self, stmts: &[StmtId]) -> Result<()> {
        for &stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    /// Statements are stack-neutral; the depth check after each one keeps
    /// the accounting honest.
    fn emit_stmt(&mut self, id: StmtId) -> Result<()> {
        let before = self.frame.depth();
        match self.ast.stmt(id).kind.clone() {
            StmtKind::Var(var) => {
                let ty = self.var_type(var)?;
                let init = self
                    .ast
                    .var(var)
                    .init
                    .ok_or_else(|| missing_slot("initializer", &self.ast.var(var).name))?;
                self.emit_expr(init)?;
                let slot = self.frame.alloc_slot(var, ty.is_wide());
                self.line(&slot_instr(store_op(&ty), slot));
                self.frame.pop(ty.width())?;
            }
            StmtKind::Assign { value, target, .. } => {
                let var = target
                    .ok_or_else(|| Error::Internal("unresolved assignment target".to_owned()))?;
                let ty = self.var_type(var)?;
                match self.ast.var(var).kind {
                    VarKind::Field => {
                        self.line("aload_0");
                        self.frame.push(1);
                        self.emit_expr(value)?;
                        self.emit_putfield(var, &ty)?;
                    }
                    VarKind::Local | VarKind::Parameter => {
                        self.emit_expr(value)?;
                        let slot = self.frame.slot(var)?;
                        self.line(&slot_instr(store_op(&ty), slot));
                        self.frame.pop(ty.width())?;
                    }
                }
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.emit_expr(cond)?;
                match else_body {
                    Some(else_body) => {
                        let else_label = self.frame.fresh_label("else");
                        let end_label = self.frame.fresh_label("endif");
                        self.line(&format!("ifeq {}", else_label));
                        self.frame.pop(1)?;
                        self.emit_block(&then_body)?;
                        self.line(&format!("goto {}", end_label));
                        self.label(&else_label);
                        self.emit_block(&else_body)?;
                        self.label(&end_label);
                    }
                    None => {
                        let end_label = self.frame.fresh_label("endif");
                        self.line(&format!("ifeq {}", end_label));
                        self.frame.pop(1)?;
                        self.emit_block(&then_body)?;
                        self.label(&end_label);
                    }
                }
            }
            StmtKind::While { cond, body } => {
                let cond_label = self.frame.fresh_label("cond");
                let end_label = self.frame.fresh_label("endloop");
                self.label(&cond_label);
                self.emit_expr(cond)?;
                self.line(&format!("ifeq {}", end_label));
                self.frame.pop(1)?;
                self.emit_block(&body)?;
                self.line(&format!("goto {}", cond_label));
                self.label(&end_label);
            }
            StmtKind::Return { value } => match value {
                Some(value) => {
                    self.emit_expr(value)?;
                    let ty = self.expr_type(value)?;
                    self.line(&format!("{}return", type_prefix(&ty)));
                    self.frame.pop(ty.width())?;
                }
                None => self.line("return"),
            },
            StmtKind::Expr(expr) => {
                self.emit_expr(expr)?;
                match self.expr_type(expr)?.width() {
                    0 => {}
                    1 => {
                        self.line("pop");
                        self.frame.pop(1)?;
                    }
                    _ => {
                        self.line("pop2");
                        self.frame.pop(2)?;
                    }
                }
            }
            StmtKind::Error => {
                return Err(Error::Internal(
                    "parse-error placeholder reached the emitter".to_owned(),
                ));
            }
        }

        if self.frame.depth() != before {
            return Err(Error::Internal(format!(
                "statement is not stack-neutral (depth {} -> {})",
                before,
                self.frame.depth()
            )));
        }
        Ok(())
    }

    /// A value expression leaves exactly `width(type)` slots on the stack.
    fn emit_expr(&mut self, id: ExprId) -> Result<()> {
        let before = self.frame.depth();
        match self.ast.expr(id).kind.clone() {
            ExprKind::Integer(value) => self.emit_push_int(value),
            ExprKind::Boolean(value) => self.emit_push_int(value as i64),
            ExprKind::Real(value) => self.emit_push_real(value),
            ExprKind::This => {
                self.line("aload_0");
                self.frame.push(1);
            }
            ExprKind::Ident { resolved, .. } => {
                let var = resolved
                    .ok_or_else(|| Error::Internal("unresolved identifier".to_owned()))?;
                self.emit_var_load(var)?;
            }
            ExprKind::ConstructorCall {
                class_name,
                args,
                ctor,
                ..
            } => self.emit_ctor_call(id, &class_name.text, &args, ctor)?,
            ExprKind::MethodCall {
                target,
                name,
                args,
                resolved,
                ..
            } => self.emit_method_call(target, &name, &args, resolved)?,
            ExprKind::FieldAccess { target, resolved, .. } => {
                let var = resolved
                    .ok_or_else(|| Error::Internal("unresolved field access".to_owned()))?;
                self.emit_expr(target)?;
                let ty = self.var_type(var)?;
                self.emit_getfield(var, &ty)?;
            }
            ExprKind::Error => {
                return Err(Error::Internal(
                    "parse-error placeholder reached the emitter".to_owned(),
                ));
            }
        }

        let width = self.expr_type(id)?.width();
        if self.frame.depth() != before + width {
            return Err(Error::Internal(format!(
                "expression left {} slots, expected {}",
                self.frame.depth() as i64 - before as i64,
                width
            )));
        }
        Ok(())
    }

    /// Most compact constant form per value range.
    fn emit_push_int(&mut self, value: i64) {
        let instr = match value {
            -1 => "iconst_m1".to_owned(),
            0..=5 => format!("iconst_{}", value),
            -128..=127 => format!("bipush {}", value),
            -32768..=32767 => format!("sipush {}", value),
            _ => format!("ldc {}", value),
        };
        self.line(&instr);
        self.frame.push(1);
    }

    fn emit_push_real(&mut self, value: f64) {
        let instr = if value == 0.0 && value.is_sign_positive() {
            "dconst_0".to_owned()
        } else if value == 1.0 {
            "dconst_1".to_owned()
        } else {
            format!("ldc2_w {}", format_real(value))
        };
        self.line(&instr);
        self.frame.push(2);
    }

    fn emit_var_load(&mut self, var: VarId) -> Result<()> {
        let ty = self.var_type(var)?;
        match self.ast.var(var).kind {
            VarKind::Field => {
                self.line("aload_0");
                self.frame.push(1);
                self.emit_getfield(var, &ty)?;
            }
            VarKind::Local | VarKind::Parameter => {
                let slot = self.frame.slot(var)?;
                self.line(&slot_instr(load_op(&ty), slot));
                self.frame.push(ty.width());
            }
        }
        Ok(())
    }

    fn emit_getfield(&mut self, var: VarId, ty: &Type) -> Result<()> {
        let decl = self.ast.var(var);
        let owner = decl
            .owner
            .ok_or_else(|| missing_slot("field owner", &decl.name))?;
        self.line(&format!(
            "getfield {}/{} {}",
            self.ast.class(owner).name,
            decl.name,
            ty.descriptor()
        ));
        self.frame.pop(1)?;
        self.frame.push(ty.width());
        Ok(())
    }

    fn emit_putfield(&mut self, var: VarId, ty: &Type) -> Result<()> {
        let decl = self.ast.var(var);
        let owner = decl
            .owner
            .ok_or_else(|| missing_slot("field owner", &decl.name))?;
        self.line(&format!(
            "putfield {}/{} {}",
            self.ast.class(owner).name,
            decl.name,
            ty.descriptor()
        ));
        self.frame.pop(1 + ty.width())?;
        Ok(())
    }

    fn emit_ctor_call(
        &mut self,
        id: ExprId,
        class_name: &str,
        args: &[ExprId],
        ctor: Option<crate::ast::CtorId>,
    ) -> Result<()> {
        match class_name {
            // Wrapper values are raw VM values; the constructor is identity.
            types::INTEGER | types::REAL | types::BOOLEAN => {
                let arg = *args
                    .first()
                    .ok_or_else(|| Error::Internal("wrapper constructor without argument".to_owned()))?;
                self.emit_expr(arg)
            }
            // A Printer has no runtime state; a null placeholder suffices.
            types::PRINTER => {
                self.line("aconst_null");
                self.frame.push(1);
                Ok(())
            }
            _ if class_name.starts_with("Array[") => {
                let arg = *args
                    .first()
                    .ok_or_else(|| Error::Internal("array constructor without length".to_owned()))?;
                self.emit_expr(arg)?;
                let Type::Array(element) = self.expr_type(id)? else {
                    return Err(Error::Internal(
                        "array constructor without array type".to_owned(),
                    ));
                };
                self.line(&new_array_instr(&element));
                self.frame.pop(1)?;
                self.frame.push(1);
                Ok(())
            }
            _ => {
                self.line(&format!("new {}", class_name));
                self.frame.push(1);
                self.line("dup");
                self.frame.push(1);
                let mut args_width = 0;
                for &arg in args {
                    self.emit_expr(arg)?;
                    args_width += self.expr_type(arg)?.width();
                }
                let descriptor = match ctor {
                    Some(ctor) => params_descriptor(&self.ast.ctor(ctor).params)?,
                    None => String::new(), // implicit parameterless constructor
                };
                self.line(&format!(
                    "invokespecial {}/<init>({})V",
                    class_name, descriptor
                ));
                self.frame.pop(1 + args_width)?;
                Ok(())
            }
        }
    }

    fn emit_method_call(
        &mut self,
        target: ExprId,
        name: &str,
        args: &[ExprId],
        resolved: Option<MethodId>,
    ) -> Result<()> {
        let target_ty = self.expr_type(target)?;
        match &target_ty {
            Type::Array(element) => self.emit_array_call(target, name, args, element),
            Type::Class { name: class, .. } if class == types::PRINTER => {
                self.emit_print(target, args)
            }
            ty if ty.is_builtin() => self.emit_builtin_call(target, name, args, &target_ty),
            Type::Class { .. } => {
                let method = resolved
                    .ok_or_else(|| Error::Internal("unresolved method call".to_owned()))?;
                self.emit_virtual_call(target, args, method)
            }
            Type::Void => Err(Error::Internal("method call on a Void value".to_owned())),
        }
    }

    fn emit_array_call(
        &mut self,
        target: ExprId,
        name: &str,
        args: &[ExprId],
        element: &Type,
    ) -> Result<()> {
        self.emit_expr(target)?;
        match name {
            "get" => {
                self.emit_expr(args[0])?;
                self.line(&format!("{}aload", element_prefix(element)));
                self.frame.pop(2)?;
                self.frame.push(element.width());
            }
            "set" => {
                self.emit_expr(args[0])?;
                self.emit_expr(args[1])?;
                self.line(&format!("{}astore", element_prefix(element)));
                self.frame.pop(2 + element.width())?;
            }
            "Length" => {
                self.line("arraylength");
                self.frame.pop(1)?;
                self.frame.push(1);
            }
            _ => {
                return Err(Error::Internal(format!(
                    "unknown array method '{}' reached the emitter",
                    name
                )));
            }
        }
        Ok(())
    }

    /// `print(x)`: fetch the VM's standard output object and call the
    /// `println` overload selected by the static argument type.
    fn emit_print(&mut self, target: ExprId, args: &[ExprId]) -> Result<()> {
        self.emit_expr(target)?;
        self.line("pop");
        self.frame.pop(1)?;

        self.line("getstatic java/lang/System/out Ljava/io/PrintStream;");
        self.frame.push(1);
        let arg = args[0];
        self.emit_expr(arg)?;
        let arg_ty = self.expr_type(arg)?;
        let descriptor = match &arg_ty {
            t if t.is_class_named(types::INTEGER) || t.is_class_named(types::BOOLEAN) => "I",
            t if t.is_class_named(types::REAL) => "D",
            _ => "Ljava/lang/Object;",
        };
        self.line(&format!(
            "invokevirtual java/io/PrintStream/println({})V",
            descriptor
        ));
        self.frame.pop(1 + arg_ty.width())?;
        Ok(())
    }

    fn emit_builtin_call(
        &mut self,
        target: ExprId,
        name: &str,
        args: &[ExprId],
        target_ty: &Type,
    ) -> Result<()> {
        self.emit_expr(target)?;
        for &arg in args {
            self.emit_expr(arg)?;
        }

        if target_ty.is_class_named(types::REAL) {
            self.emit_real_op(name)
        } else {
            self.emit_int_op(name, target_ty)
        }
    }

    /// Integer and Boolean operations (both are VM ints).
    fn emit_int_op(&mut self, name: &str, target_ty: &Type) -> Result<()> {
        let simple = match name {
            "Plus" => Some("iadd"),
            "Minus" => Some("isub"),
            "Mult" => Some("imul"),
            "Div" => Some("idiv"),
            "Rem" => Some("irem"),
            "And" => Some("iand"),
            "Or" => Some("ior"),
            "Xor" => Some("ixor"),
            _ => None,
        };
        if let Some(op) = simple {
            self.line(op);
            self.frame.pop(2)?;
            self.frame.push(1);
            return Ok(());
        }
        match name {
            "UnaryMinus" => self.line("ineg"),
            "UnaryPlus" => {}
            "Not" => {
                self.line("iconst_1");
                self.frame.push(1);
                self.line("ixor");
                self.frame.pop(2)?;
                self.frame.push(1);
            }
            "toReal" => {
                self.line("i2d");
                self.frame.pop(1)?;
                self.frame.push(2);
            }
            "Less" => self.emit_int_compare("if_icmplt")?,
            "LessEqual" => self.emit_int_compare("if_icmple")?,
            "Greater" => self.emit_int_compare("if_icmpgt")?,
            "GreaterEqual" => self.emit_int_compare("if_icmpge")?,
            "Equal" => self.emit_int_compare("if_icmpeq")?,
            _ => {
                return Err(Error::Internal(format!(
                    "unknown method '{}' on '{}' reached the emitter",
                    name, target_ty
                )));
            }
        }
        Ok(())
    }

    fn emit_real_op(&mut self, name: &str) -> Result<()> {
        let arithmetic = match name {
            "Plus" => Some("dadd"),
            "Minus" => Some("dsub"),
            "Mult" => Some("dmul"),
            "Div" => Some("ddiv"),
            "Rem" => Some("drem"),
            _ => None,
        };
        if let Some(op) = arithmetic {
            self.line(op);
            self.frame.pop(4)?;
            self.frame.push(2);
            return Ok(());
        }
        match name {
            "UnaryMinus" => self.line("dneg"),
            "UnaryPlus" => {}
            "toInteger" => {
                self.line("d2i");
                self.frame.pop(2)?;
                self.frame.push(1);
            }
            // dcmpg biases NaN upward so `<`/`<=` stay false on NaN;
            // dcmpl biases downward for the opposite pair.
            "Less" => self.emit_real_compare("dcmpg", "iflt")?,
            "LessEqual" => self.emit_real_compare("dcmpg", "ifle")?,
            "Greater" => self.emit_real_compare("dcmpl", "ifgt")?,
            "GreaterEqual" => self.emit_real_compare("dcmpl", "ifge")?,
            "Equal" => self.emit_real_compare("dcmpl", "ifeq")?,
            _ => {
                return Err(Error::Internal(format!(
                    "unknown method '{}' on 'Real' reached the emitter",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Comparisons produce a 0/1 int via a short branch.
    fn emit_int_compare(&mut self, branch: &str) -> Result<()> {
        self.emit_compare_tail(branch, 2)
    }

    fn emit_real_compare(&mut self, cmp: &str, branch: &str) -> Result<()> {
        self.line(cmp);
        self.frame.pop(4)?;
        self.frame.push(1);
        self.emit_compare_tail(branch, 1)
    }

    fn emit_compare_tail(&mut self, branch: &str, operand_slots: u32) -> Result<()> {
        let true_label = self.frame.fresh_label("cmptrue");
        let end_label = self.frame.fresh_label("cmpend");
        self.line(&format!("{} {}", branch, true_label));
        self.frame.pop(operand_slots)?;
        self.line("iconst_0");
        self.frame.push(1);
        self.line(&format!("goto {}", end_label));
        self.label(&true_label);
        // Both branches leave one int; the depth was counted on the
        // fall-through path.
        self.line("iconst_1");
        self.label(&end_label);
        Ok(())
    }

    fn emit_virtual_call(&mut self, target: ExprId, args: &[ExprId], method: MethodId) -> Result<()> {
        self.emit_expr(target)?;
        let mut args_width = 0;
        for &arg in args {
            self.emit_expr(arg)?;
            args_width += self.expr_type(arg)?.width();
        }

        let decl = self.ast.method(method);
        let owner = decl
            .owner
            .ok_or_else(|| missing_slot("method owner", &decl.name))?;
        let return_type = decl
            .return_type
            .clone()
            .ok_or_else(|| missing_slot("return type", &decl.name))?;
        self.line(&format!(
            "invokevirtual {}/{}({}){}",
            self.ast.class(owner).name,
            decl.name,
            params_descriptor(&decl.params)?,
            return_type.descriptor()
        ));
        self.frame.pop(1 + args_width)?;
        self.frame.push(return_type.width());
        Ok(())
    }
}

fn type_prefix(ty: &Type) -> &'static str {
    match ty {
        Type::Class { name, .. } if name == types::INTEGER || name == types::BOOLEAN => "i",
        Type::Class { name, .. } if name == types::REAL => "d",
        _ => "a",
    }
}

fn element_prefix(element: &Type) -> &'static str {
    type_prefix(element)
}

fn load_op(ty: &Type) -> String {
    format!("{}load", type_prefix(ty))
}

fn store_op(ty: &Type) -> String {
    format!("{}store", type_prefix(ty))
}

/// `iload_3` for slots 0..=3, `iload 4` beyond.
fn slot_instr(op: String, slot: u16) -> String {
    if slot <= 3 {
        format!("{}_{}", op, slot)
    } else {
        format!("{} {}", op, slot)
    }
}

fn new_array_instr(element: &Type) -> String {
    match element {
        Type::Class { name, .. } if name == types::INTEGER || name == types::BOOLEAN => {
            "newarray int".to_owned()
        }
        Type::Class { name, .. } if name == types::REAL => "newarray double".to_owned(),
        Type::Class { name, .. } => format!("anewarray {}", name),
        Type::Array(_) => format!("anewarray {}", element.descriptor()),
        Type::Void => "newarray int".to_owned(), // unreachable for typed programs
    }
}

fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// `Start` with a parameterless constructor and a parameterless Void
/// `start` gets a synthetic entry-point class.
fn entry_point(ast: &Ast) -> Option<ClassId> {
    let start = ast.class_by_name("Start")?;
    let class = ast.class(start);
    let ctor_ok = class.ctors.is_empty() || class.ctors.contains_key("this()");
    let method = ast.lookup_method(start, "start()")?;
    let void_start = ast.method(method).return_type == Some(Type::Void);
    (ctor_ok && void_start).then_some(start)
}

fn emit_entry_point() -> Result<AssemblyFile> {
    let mut writer = ClassWriter::new();
    writer.header("Main", ROOT_CLASS)?;
    writer.begin_members()?;
    let body = concat!(
        "    new Start\n",
        "    dup\n",
        "    invokespecial Start/<init>()V\n",
        "    invokevirtual Start/start()V\n",
        "    return\n",
    );
    writer.method("public static main([Ljava/lang/String;)V", 2, 1, body)?;
    Ok(AssemblyFile {
        name: "Main.assembly".to_owned(),
        text: writer.finish()?,
    })
}
