//! Staged compilation driver.
//!
//! Wraps the pipeline in typestates: [`Compiler`] -> [`ParsedUnit`] ->
//! [`AnalyzedUnit`]. Diagnostics accumulate across stages in one
//! collection; a stage that finds errors prevents the later stages from
//! running, so the emitter only ever sees a fully resolved tree.

use crate::ast::Ast;
use crate::analyze::{build_symbols, check_types, resolve_signatures};
use crate::diagnostics::Diagnostics;
use crate::emit::{AssemblyFile, emit_program};
use crate::optimize::{eliminate_dead_code, fold_constants};
use crate::parser;
use crate::scope::GlobalScope;
use crate::stdlib::Builtins;
use crate::{Error, Result};

pub struct Compiler {
    source: String,
}

impl Compiler {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn parse(self) -> ParsedUnit {
        let result = parser::parse(&self.source);
        ParsedUnit {
            source: self.source,
            ast: result.ast,
            diagnostics: result.diagnostics,
        }
    }
}

pub struct ParsedUnit {
    source: String,
    ast: Ast,
    diagnostics: Diagnostics,
}

impl ParsedUnit {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Runs symbol resolution, then the two type-checker sub-passes.
    /// Lex/parse errors skip both; resolution errors skip type checking.
    pub fn analyze(mut self) -> AnalyzedUnit {
        let mut globals = GlobalScope::with_builtins();
        if !self.diagnostics.has_errors() {
            globals = build_symbols(&mut self.ast, &mut self.diagnostics);
            if !self.diagnostics.has_errors() {
                let builtins = Builtins::new();
                resolve_signatures(&mut self.ast, &globals, &mut self.diagnostics);
                check_types(&mut self.ast, &globals, &builtins, &mut self.diagnostics);
            }
        }
        AnalyzedUnit {
            source: self.source,
            ast: self.ast,
            globals,
            diagnostics: self.diagnostics,
        }
    }
}

pub struct AnalyzedUnit {
    source: String,
    ast: Ast,
    globals: GlobalScope,
    diagnostics: Diagnostics,
}

impl AnalyzedUnit {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn globals(&self) -> &GlobalScope {
        &self.globals
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Dead-code elimination, then constant folding to a fixed point.
    /// Skipped entirely when earlier stages reported errors.
    pub fn optimize(mut self) -> Self {
        if self.diagnostics.has_errors() {
            return self;
        }
        eliminate_dead_code(&mut self.ast);
        fold_constants(&mut self.ast, &mut self.diagnostics);
        self
    }

    /// One assembly file per class, plus the entry point when present.
    /// Callers must check [`Self::is_valid`] first; emitting an erroneous
    /// unit is a driver bug, not a source diagnostic.
    pub fn emit(&self) -> Result<Vec<AssemblyFile>> {
        if self.diagnostics.has_errors() {
            return Err(Error::Internal(
                "emit called with outstanding diagnostics".to_owned(),
            ));
        }
        emit_program(&self.ast)
    }
}
