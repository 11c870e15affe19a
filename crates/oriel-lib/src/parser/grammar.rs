//! Grammar productions.
//!
//! Single-pass recursive descent with one token of lookahead; the only
//! backtracking is a cursor checkpoint around the `Array [ T ]` type-name
//! composition in expression position. Recovery substitutes placeholder
//! nodes and synchronizes at class, member and statement keywords.

use indexmap::IndexMap;

use crate::ast::{
    ClassDecl, CtorDecl, Expr, ExprId, ExprKind, Member, MethodDecl, Param, Stmt, StmtId,
    StmtKind, TypeName, VarDecl, VarId, VarKind,
};
use crate::diagnostics::DiagnosticKind;
use crate::span::Span;

use super::core::Parser;
use super::lexer::{TokenKind, token_text};

const MEMBER_SYNC: &[TokenKind] = &[
    TokenKind::VarKw,
    TokenKind::MethodKw,
    TokenKind::ThisKw,
    TokenKind::EndKw,
    TokenKind::ClassKw,
];

const BLOCK_END: &[TokenKind] = &[TokenKind::EndKw, TokenKind::ElseKw, TokenKind::ClassKw];

fn is_expr_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::IntLit
            | TokenKind::RealLit
            | TokenKind::TrueKw
            | TokenKind::FalseKw
            | TokenKind::ThisKw
            | TokenKind::Ident
            | TokenKind::StringLit
            | TokenKind::Garbage
    )
}

pub(super) fn program(p: &mut Parser) {
    while !p.eof() {
        if p.at(TokenKind::ClassKw) {
            class_decl(p);
        } else {
            p.error_msg(DiagnosticKind::UnexpectedToken, "expected 'class'");
            p.synchronize(&[TokenKind::ClassKw]);
        }
    }
}

fn class_decl(p: &mut Parser) {
    let start = p.current_span();
    p.bump(); // 'class'

    let (name, name_span) = ident_or_placeholder(p, "a class name");

    let base_name = if p.eat(TokenKind::ExtendsKw) {
        if p.at(TokenKind::Ident) {
            let tok = p.bump();
            Some(TypeName {
                text: token_text(p.source, &tok).to_owned(),
                span: tok.span,
            })
        } else {
            p.error_msg(DiagnosticKind::UnexpectedToken, "expected a base class name");
            None
        }
    } else {
        None
    };

    p.expect(TokenKind::IsKw, "'is'");

    let mut members = Vec::new();
    while !p.at_any(&[TokenKind::EndKw, TokenKind::ClassKw]) && !p.eof() {
        member(p, &mut members);
    }
    p.expect(TokenKind::EndKw, "'end'");

    let span = p.span_from(start);
    p.ast.alloc_class(ClassDecl {
        name,
        name_span,
        span,
        base_name,
        members,
        base: None,
        fields: IndexMap::new(),
        methods: IndexMap::new(),
        ctors: IndexMap::new(),
    });
}

fn member(p: &mut Parser, members: &mut Vec<Member>) {
    match p.current() {
        TokenKind::VarKw => {
            if let Some(var) = var_decl(p, VarKind::Field) {
                members.push(Member::Field(var));
            }
        }
        TokenKind::MethodKw => members.push(Member::Method(method_decl(p))),
        TokenKind::ThisKw => members.push(Member::Ctor(ctor_decl(p))),
        _ => {
            p.error(DiagnosticKind::ExpectedMember);
            p.synchronize(MEMBER_SYNC);
        }
    }
}

/// `'var' Id ':' Expr` - both a field and a local declaration.
fn var_decl(p: &mut Parser, kind: VarKind) -> Option<VarId> {
    let start = p.current_span();
    p.bump(); // 'var'

    if !p.at(TokenKind::Ident) {
        p.error_msg(DiagnosticKind::UnexpectedToken, "expected a variable name");
        return None;
    }
    let tok = p.bump();
    let name = token_text(p.source, &tok).to_owned();

    p.expect(TokenKind::Colon, "':'");
    let init = expr(p);

    let span = p.span_from(start);
    Some(p.ast.alloc_var(VarDecl {
        name,
        name_span: tok.span,
        span,
        kind,
        init: Some(init),
        owner: None,
        resolved_type: None,
    }))
}

fn method_decl(p: &mut Parser) -> crate::ast::MethodId {
    let start = p.current_span();
    p.bump(); // 'method'

    let (name, name_span) = ident_or_placeholder(p, "a method name");
    let params = param_clause(p);
    let return_type_name = if p.eat(TokenKind::Colon) {
        type_name(p)
    } else {
        None
    };

    let body = if p.eat(TokenKind::IsKw) {
        let stmts = block(p);
        p.expect(TokenKind::EndKw, "'end'");
        Some(stmts)
    } else if p.at(TokenKind::Arrow) {
        // `=> Expr` short form: a body of a single return.
        let arrow = p.bump();
        let value = expr(p);
        let ret_span = arrow.span.merge(p.ast.expr(value).span);
        let ret = p.ast.alloc_stmt(Stmt {
            kind: StmtKind::Return { value: Some(value) },
            span: ret_span,
        });
        Some(vec![ret])
    } else {
        None // forward declaration
    };

    let span = p.span_from(start);
    p.ast.alloc_method(MethodDecl {
        name,
        name_span,
        span,
        params,
        return_type_name,
        body,
        owner: None,
        return_type: None,
    })
}

fn ctor_decl(p: &mut Parser) -> crate::ast::CtorId {
    let start = p.current_span();
    p.bump(); // 'this'

    let params = param_clause(p);
    p.expect(TokenKind::IsKw, "'is'");
    let body = block(p);
    p.expect(TokenKind::EndKw, "'end'");

    let span = p.span_from(start);
    p.ast.alloc_ctor(CtorDecl {
        span,
        params,
        body,
        owner: None,
    })
}

fn param_clause(p: &mut Parser) -> Vec<Param> {
    if !p.eat(TokenKind::ParenOpen) {
        return Vec::new();
    }
    let params = param_list(p);
    p.expect(TokenKind::ParenClose, "')'");
    params
}

fn param_list(p: &mut Parser) -> Vec<Param> {
    let mut params = Vec::new();
    if p.at(TokenKind::ParenClose) {
        return params;
    }
    loop {
        if let Some(param) = param(p) {
            params.push(param);
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    params
}

fn param(p: &mut Parser) -> Option<Param> {
    let start = p.current_span();
    if !p.at(TokenKind::Ident) {
        p.error_msg(DiagnosticKind::UnexpectedToken, "expected a parameter name");
        return None;
    }
    let tok = p.bump();
    let name = token_text(p.source, &tok).to_owned();

    p.expect(TokenKind::Colon, "':'");
    let type_name = type_name(p)?;

    Some(Param {
        name,
        name_span: tok.span,
        span: start.merge(type_name.span),
        type_name,
        resolved_type: None,
        binding: None,
    })
}

/// `Id` or `Id '[' Id ']'`, composed into one textual type name.
fn type_name(p: &mut Parser) -> Option<TypeName> {
    if !p.at(TokenKind::Ident) {
        p.error_msg(DiagnosticKind::UnexpectedToken, "expected a type name");
        return None;
    }
    let tok = p.bump();
    let mut text = token_text(p.source, &tok).to_owned();
    let mut span = tok.span;

    if p.at(TokenKind::BracketOpen)
        && p.nth(1) == TokenKind::Ident
        && p.nth(2) == TokenKind::BracketClose
    {
        p.bump();
        let inner = p.bump();
        let close = p.bump();
        text = format!("{}[{}]", text, token_text(p.source, &inner));
        span = span.merge(close.span);
    }

    Some(TypeName { text, span })
}

fn block(p: &mut Parser) -> Vec<StmtId> {
    let mut stmts = Vec::new();
    while !p.at_any(BLOCK_END) && !p.eof() {
        stmts.push(stmt(p));
    }
    stmts
}

fn stmt(p: &mut Parser) -> StmtId {
    let start = p.current_span();
    match p.current() {
        TokenKind::VarKw => match var_decl(p, VarKind::Local) {
            Some(var) => alloc_stmt(p, StmtKind::Var(var), start),
            None => alloc_stmt(p, StmtKind::Error, start),
        },
        TokenKind::ReturnKw => {
            p.bump();
            let value = if is_expr_start(p.current()) {
                Some(expr(p))
            } else {
                None
            };
            alloc_stmt(p, StmtKind::Return { value }, start)
        }
        TokenKind::IfKw => {
            p.bump();
            let cond = expr(p);
            p.expect(TokenKind::ThenKw, "'then'");
            let then_body = block(p);
            let else_body = if p.eat(TokenKind::ElseKw) {
                Some(block(p))
            } else {
                None
            };
            p.expect(TokenKind::EndKw, "'end'");
            alloc_stmt(
                p,
                StmtKind::If {
                    cond,
                    then_body,
                    else_body,
                },
                start,
            )
        }
        TokenKind::WhileKw => {
            p.bump();
            let cond = expr(p);
            p.expect(TokenKind::LoopKw, "'loop'");
            let body = block(p);
            p.expect(TokenKind::EndKw, "'end'");
            alloc_stmt(p, StmtKind::While { cond, body }, start)
        }
        // `Id :=` begins an assignment; a bare expression otherwise.
        TokenKind::Ident if p.nth(1) == TokenKind::Assign => {
            let tok = p.bump();
            let name = token_text(p.source, &tok).to_owned();
            p.bump(); // ':='
            let value = expr(p);
            alloc_stmt(
                p,
                StmtKind::Assign {
                    name,
                    name_span: tok.span,
                    value,
                    target: None,
                },
                start,
            )
        }
        k if is_expr_start(k) => {
            let e = expr(p);
            alloc_stmt(p, StmtKind::Expr(e), start)
        }
        _ => {
            p.error_msg(DiagnosticKind::UnexpectedToken, "expected a statement");
            p.bump();
            alloc_stmt(p, StmtKind::Error, start)
        }
    }
}

/// `Primary { '.' Id [ '(' Args ')' ] }`, left-associative.
fn expr(p: &mut Parser) -> ExprId {
    let mut lhs = primary(p);
    while p.at(TokenKind::Dot) {
        p.bump();
        if !p.at(TokenKind::Ident) {
            p.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected a member name after '.'",
            );
            break;
        }
        let tok = p.bump();
        let name = token_text(p.source, &tok).to_owned();

        if p.eat(TokenKind::ParenOpen) {
            let args = arg_list(p);
            p.expect(TokenKind::ParenClose, "')'");
            let span = p.ast.expr(lhs).span.merge(p.last_span());
            lhs = alloc_expr(
                p,
                ExprKind::MethodCall {
                    target: lhs,
                    name,
                    name_span: tok.span,
                    args,
                    resolved: None,
                },
                span,
            );
        } else {
            let span = p.ast.expr(lhs).span.merge(tok.span);
            lhs = alloc_expr(
                p,
                ExprKind::FieldAccess {
                    target: lhs,
                    name,
                    name_span: tok.span,
                    resolved: None,
                },
                span,
            );
        }
    }
    lhs
}

fn arg_list(p: &mut Parser) -> Vec<ExprId> {
    let mut args = Vec::new();
    if p.at(TokenKind::ParenClose) {
        return args;
    }
    loop {
        args.push(expr(p));
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    args
}

fn primary(p: &mut Parser) -> ExprId {
    let span = p.current_span();
    match p.current() {
        TokenKind::IntLit => {
            let text = p.current_text();
            let value = match text.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    p.error_msg(
                        DiagnosticKind::InvalidNumber,
                        format!("integer literal '{}' is out of range", text),
                    );
                    0
                }
            };
            p.bump();
            alloc_expr(p, ExprKind::Integer(value), span)
        }
        TokenKind::RealLit => {
            let value = p.current_text().parse::<f64>().unwrap_or(0.0);
            p.bump();
            alloc_expr(p, ExprKind::Real(value), span)
        }
        TokenKind::TrueKw => {
            p.bump();
            alloc_expr(p, ExprKind::Boolean(true), span)
        }
        TokenKind::FalseKw => {
            p.bump();
            alloc_expr(p, ExprKind::Boolean(false), span)
        }
        TokenKind::ThisKw => {
            p.bump();
            alloc_expr(p, ExprKind::This, span)
        }
        TokenKind::Ident => ident_primary(p),
        TokenKind::StringLit => {
            p.error_msg(
                DiagnosticKind::ExpectedExpression,
                "string literals cannot be used as expressions",
            );
            p.bump();
            alloc_expr(p, ExprKind::Error, span)
        }
        TokenKind::Garbage => {
            // Already reported by the lexer.
            p.bump();
            alloc_expr(p, ExprKind::Error, span)
        }
        _ => {
            p.error(DiagnosticKind::ExpectedExpression);
            alloc_expr(p, ExprKind::Error, span)
        }
    }
}

/// `Id (...)` is a constructor call, bare `Id` an identifier. The
/// `Id '[' Id ']'` composition (array constructors) backtracks via a cursor
/// checkpoint when the brackets turn out not to form a type name.
fn ident_primary(p: &mut Parser) -> ExprId {
    let tok = p.bump();
    let mut name = token_text(p.source, &tok).to_owned();
    let mut name_span = tok.span;

    if p.at(TokenKind::BracketOpen) {
        let checkpoint = p.checkpoint();
        p.bump();
        let mut composed = false;
        if p.at(TokenKind::Ident) {
            let inner = p.bump();
            if p.eat(TokenKind::BracketClose) {
                name = format!("{}[{}]", name, token_text(p.source, &inner));
                name_span = name_span.merge(p.last_span());
                composed = true;
            }
        }
        if !composed {
            p.rewind(checkpoint);
        }
    }

    if p.eat(TokenKind::ParenOpen) {
        let args = arg_list(p);
        p.expect(TokenKind::ParenClose, "')'");
        let span = name_span.merge(p.last_span());
        alloc_expr(
            p,
            ExprKind::ConstructorCall {
                class_name: TypeName {
                    text: name,
                    span: name_span,
                },
                args,
                class: None,
                ctor: None,
            },
            span,
        )
    } else {
        alloc_expr(
            p,
            ExprKind::Ident {
                name,
                resolved: None,
            },
            name_span,
        )
    }
}

fn ident_or_placeholder(p: &mut Parser, what: &str) -> (String, Span) {
    if p.at(TokenKind::Ident) {
        let tok = p.bump();
        (token_text(p.source, &tok).to_owned(), tok.span)
    } else {
        p.error_msg(DiagnosticKind::UnexpectedToken, format!("expected {}", what));
        ("<error>".to_owned(), p.current_span())
    }
}

fn alloc_expr(p: &mut Parser, kind: ExprKind, span: Span) -> ExprId {
    let span = if matches!(kind, ExprKind::Error) {
        span
    } else {
        span.merge(p.last_span())
    };
    p.ast.alloc_expr(Expr {
        kind,
        span,
        ty: None,
    })
}

fn alloc_stmt(p: &mut Parser, kind: StmtKind, start: Span) -> StmtId {
    let span = p.span_from(start);
    p.ast.alloc_stmt(Stmt { kind, span })
}
