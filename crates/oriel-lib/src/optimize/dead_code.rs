//! Dead-code elimination: statements after a `return` are unreachable.
//!
//! The removal is local to each straight-line block (method body,
//! constructor body, branch, loop body); it does not reason across joins
//! and never deletes a loop body that merely contains a return. Linear in
//! the size of the tree, run once.

use crate::ast::{Ast, StmtId, StmtKind};

pub fn eliminate_dead_code(ast: &mut Ast) {
    for i in 0..ast.methods.len() {
        if let Some(body) = ast.methods[i].body.take() {
            let pruned = prune_block(ast, body);
            ast.methods[i].body = Some(pruned);
        }
    }
    for i in 0..ast.ctors.len() {
        let body = std::mem::take(&mut ast.ctors[i].body);
        ast.ctors[i].body = prune_block(ast, body);
    }
}

fn prune_block(ast: &mut Ast, mut block: Vec<StmtId>) -> Vec<StmtId> {
    if let Some(pos) = block
        .iter()
        .position(|&s| matches!(ast.stmt(s).kind, StmtKind::Return { .. }))
    {
        block.truncate(pos + 1);
    }

    for &stmt in &block {
        // Take the node out while recursing into its nested blocks.
        let mut kind = std::mem::replace(&mut ast.stmt_mut(stmt).kind, StmtKind::Error);
        match &mut kind {
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                *then_body = prune_block(ast, std::mem::take(then_body));
                if let Some(else_body) = else_body {
                    *else_body = prune_block(ast, std::mem::take(else_body));
                }
            }
            StmtKind::While { body, .. } => {
                *body = prune_block(ast, std::mem::take(body));
            }
            _ => {}
        }
        ast.stmt_mut(stmt).kind = kind;
    }

    block
}
