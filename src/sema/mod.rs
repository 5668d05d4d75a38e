//! Sema: the recursive AST walker performing type inference, conversion insertion,
//! constant folding, scope resolution, initializer validation, control-flow label
//! assignment, and AST-to-AST lowering (spec §4.4).
//!
//! Grounded on `seqc::typechecker::TypeChecker`'s walker shape — a struct carrying
//! the active scope and accumulating diagnostics as it recurses — generalized from
//! Seq's single-pass checker into one that also mutates a side table instead of the
//! AST itself (`NodeRecordStore`, since this crate's AST is an owned value tree
//! rather than `seqc`'s pointer-based one).

pub mod convert;
pub mod decl;
pub mod expr;
pub mod stmt;

use std::collections::HashSet;

use crate::ast::{Expr, ExprNode, ExternalDecl, Node, NodeId, SourceLocation, Stmt, StmtNode, TranslationUnit};
use crate::asm::StrPool;
use crate::error::{CcError, CcResult, Diagnostic};
use crate::node_record::NodeRecordStore;
use crate::scope::Scope;
use crate::types::Type;
use crate::value::Value;

/// The active loop's `break`/`continue` targets (spec §4.4.5).
pub struct LoopLabels {
    pub end: String,
    pub continue_target: String,
}

/// The active `switch`'s break target and whether a `default:` has been seen yet
/// (duplicate default is rejected with `InvalidDefault`).
pub struct SwitchCtx {
    /// The `Switch` statement's own id, so a nested `case`/`default` can plant its
    /// label onto *this* node's `NodeRecord.cases` rather than its own.
    pub id: NodeId,
    pub end: String,
    pub has_default: bool,
    pub seen_values: HashSet<i64>,
}

/// Per-function state: the local scope, frame accounting, and the goto/label sets
/// verified against each other at function exit (spec §4.2, invariant 6).
pub struct FunctionCtx {
    pub scope: Scope,
    pub ret_type: Type,
    pub max_frame_size: usize,
    pub labels_defined: HashSet<String>,
    pub labels_referenced: HashSet<String>,
    pub loop_stack: Vec<LoopLabels>,
    pub switch_stack: Vec<SwitchCtx>,
    /// `break`'s target in innermost-enclosing order: a loop and a switch each push
    /// their `end` label here on entry, so a loop nested inside a switch (or vice
    /// versa) resolves `break` to whichever is actually innermost rather than
    /// favoring one kind over the other (spec §4.4.5).
    pub break_stack: Vec<String>,
    label_counter: u32,
    temp_counter: u32,
}

pub struct Sema {
    pub builtin: Scope,
    pub global: Scope,
    pub records: NodeRecordStore,
    pub str_pool: StrPool,
    /// AST-node path from the translation-unit root to whatever is currently being
    /// checked, threaded through the recursion so a failing `CcError` can be wrapped
    /// into a [`Diagnostic`] with a readable trail (spec §7).
    pub path: Vec<NodeId>,
    pub func: Option<FunctionCtx>,
    /// Next id handed out by [`Sema::synth`], seeded above every id the lowerer
    /// minted so synthesized nodes never collide with source ones.
    next_synth_id: u32,
}

impl Sema {
    pub fn new(node_count: usize) -> Sema {
        let builtin = Scope::new_builtin();
        let global = Scope::new_global(&builtin);
        Sema {
            builtin,
            global,
            records: NodeRecordStore::with_capacity(node_count),
            str_pool: StrPool::new(),
            path: Vec::new(),
            func: None,
            next_synth_id: node_count as u32,
        }
    }

    /// Mint a fresh node carrying `kind`, for a §4.4.4 lowering's replacement subtree.
    pub fn synth(&mut self, kind: Expr) -> ExprNode {
        let id = NodeId(self.next_synth_id);
        self.next_synth_id += 1;
        Node { id, loc: SourceLocation::default(), kind }
    }

    /// Mint a fresh statement node, for a local-initializer splice (spec §4.4.3).
    pub fn synth_stmt(&mut self, kind: Stmt) -> StmtNode {
        let id = NodeId(self.next_synth_id);
        self.next_synth_id += 1;
        Node { id, loc: SourceLocation::default(), kind }
    }

    /// Check a synthesized replacement for `original_id`, record it as that node's
    /// `translated` subtree (spec §4.4.4), and return the value it checks to.
    pub fn lower_to(&mut self, original_id: NodeId, new_node: ExprNode) -> CcResult<Value> {
        let value = self.check_expr(&new_node)?;
        self.records.get_mut(original_id).translated = Some(Box::new(new_node));
        Ok(value)
    }

    pub fn diagnostic(&self, error: CcError) -> Diagnostic {
        Diagnostic::new(error, self.path.clone())
    }

    pub fn check_unit(&mut self, unit: &TranslationUnit) -> CcResult<()> {
        for item in &unit.items {
            match item {
                ExternalDecl::Decl(d) => {
                    self.check_global_decl(d)?;
                }
                ExternalDecl::FunctionDef(f) => {
                    self.check_function_def(f)?;
                }
            }
        }
        Ok(())
    }

    pub fn func(&self) -> &FunctionCtx {
        self.func.as_ref().expect("statement/expression checked outside a function body")
    }

    pub fn func_mut(&mut self) -> &mut FunctionCtx {
        self.func.as_mut().expect("statement/expression checked outside a function body")
    }

    pub fn scope(&self) -> Scope {
        match &self.func {
            Some(f) => f.scope.clone(),
            None => self.global.clone(),
        }
    }

    /// Mint a function-local label; `purpose` mirrors the control-flow node kind
    /// (`"if.false"`, `"while.start"`, ...) per spec §4.4.5.
    pub fn new_label(&mut self, purpose: &str) -> String {
        let fc = self.func_mut();
        fc.label_counter += 1;
        format!(".L{}.{purpose}", fc.label_counter)
    }

    /// Mint a name for a compiler-introduced temporary pointer (spec §4.4.4's
    /// `p=&x` aliasing fix for unstable compound-assignment/increment targets).
    pub fn new_temp_name(&mut self) -> String {
        let fc = self.func_mut();
        fc.temp_counter += 1;
        format!("__tmp{}", fc.temp_counter)
    }
}

impl FunctionCtx {
    pub fn new(scope: Scope, ret_type: Type) -> FunctionCtx {
        FunctionCtx {
            scope,
            ret_type,
            max_frame_size: 0,
            labels_defined: HashSet::new(),
            labels_referenced: HashSet::new(),
            loop_stack: Vec::new(),
            switch_stack: Vec::new(),
            break_stack: Vec::new(),
            label_counter: 0,
            temp_counter: 0,
        }
    }

    pub fn note_frame_offset(&mut self, offset: usize) {
        self.max_frame_size = self.max_frame_size.max(offset);
    }
}
