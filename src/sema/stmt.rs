//! Statement checking: control-flow label assignment (spec §4.4.5), loop/switch
//! context tracking, and splicing local-declaration initializers into executable
//! assignment statements. Grounded on `cc.py`'s statement visitor, which plants the
//! same `.L<n>.<purpose>` label shapes this module mints.

use crate::ast::{self, Expr, Stmt, StmtNode};
use crate::error::{CcError, CcResult};
use crate::node_record::CaseLabel;
use crate::sema::{LoopLabels, SwitchCtx};

impl crate::sema::Sema {
    pub fn check_stmt(&mut self, s: &StmtNode) -> CcResult<()> {
        self.path.push(s.id);
        let result = self.check_stmt_inner(s);
        self.path.pop();
        result
    }

    fn check_stmt_inner(&mut self, s: &StmtNode) -> CcResult<()> {
        match &s.kind {
            Stmt::Compound(items) => {
                for item in items {
                    self.check_stmt(item)?;
                }
                Ok(())
            }
            Stmt::Decl(decls) => {
                // `check_local_decl` reserves frame space and returns any
                // initializer statements it synthesized (spec §4.4.3); Codegen
                // emits those in place of the declaration itself.
                for d in decls {
                    for stmt in self.check_local_decl(d)? {
                        self.check_stmt(&stmt)?;
                    }
                }
                Ok(())
            }
            Stmt::Expr(e) => {
                if let Some(e) = e {
                    self.check_expr(e)?;
                }
                Ok(())
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.check_expr(cond)?;
                let false_label = self.new_label("if.false");
                let mut labels = vec![false_label];
                self.check_stmt(then_branch)?;
                if else_branch.is_some() {
                    labels.push(self.new_label("if.end"));
                }
                if let Some(e) = else_branch {
                    self.check_stmt(e)?;
                }
                self.records.get_mut(s.id).labels = labels;
                Ok(())
            }
            Stmt::While { cond, body } => {
                let start = self.new_label("while.start");
                let end = self.new_label("while.end");
                self.func_mut().loop_stack.push(LoopLabels { end: end.clone(), continue_target: start.clone() });
                self.func_mut().break_stack.push(end.clone());
                self.check_expr(cond)?;
                self.check_stmt(body)?;
                self.func_mut().break_stack.pop();
                self.func_mut().loop_stack.pop();
                self.records.get_mut(s.id).labels = vec![start, end];
                Ok(())
            }
            Stmt::DoWhile { body, cond } => {
                let start = self.new_label("dowhile.start");
                let end = self.new_label("dowhile.end");
                self.func_mut().loop_stack.push(LoopLabels { end: end.clone(), continue_target: start.clone() });
                self.func_mut().break_stack.push(end.clone());
                self.check_stmt(body)?;
                self.func_mut().break_stack.pop();
                self.func_mut().loop_stack.pop();
                self.check_expr(cond)?;
                self.records.get_mut(s.id).labels = vec![start, end];
                Ok(())
            }
            Stmt::For { init, cond, step, body } => {
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                let start = self.new_label("for.start");
                let cont = self.new_label("for.continue");
                let end = self.new_label("for.end");
                if let Some(cond) = cond {
                    self.check_expr(cond)?;
                }
                self.func_mut().loop_stack.push(LoopLabels { end: end.clone(), continue_target: cont.clone() });
                self.func_mut().break_stack.push(end.clone());
                self.check_stmt(body)?;
                self.func_mut().break_stack.pop();
                self.func_mut().loop_stack.pop();
                if let Some(step) = step {
                    self.check_expr(step)?;
                }
                self.records.get_mut(s.id).labels = vec![start, cont, end];
                Ok(())
            }
            Stmt::Switch { expr, body } => {
                let v = self.check_expr(expr)?;
                if !v.ty().is_int() {
                    return Err(CcError::InvalidOperand("switch expression must be an integer".into()));
                }
                let end = self.new_label("switch.end");
                self.func_mut().switch_stack.push(SwitchCtx {
                    id: s.id,
                    end: end.clone(),
                    has_default: false,
                    seen_values: std::collections::HashSet::new(),
                });
                self.func_mut().break_stack.push(end.clone());
                self.check_stmt(body)?;
                self.func_mut().break_stack.pop();
                let ctx = self.func_mut().switch_stack.pop().unwrap();
                self.records.get_mut(s.id).labels = vec![end];
                let _ = ctx;
                Ok(())
            }
            Stmt::Case { value, stmt } => {
                if self.func().switch_stack.is_empty() {
                    return Err(CcError::InvalidDefault("case outside of a switch".into()));
                }
                let v = self.check_expr(value)?;
                let n = v.as_int_constant().ok_or_else(|| {
                    CcError::NonConstantInitializer("case label must be a constant expression".into())
                })?;
                let label = self.new_label("case");
                let ctx = self.func_mut().switch_stack.last_mut().unwrap();
                if !ctx.seen_values.insert(n) {
                    return Err(CcError::DuplicatedCase(n.to_string()));
                }
                let switch_id = ctx.id;
                self.records.get_mut(switch_id).cases.push(CaseLabel { value: Some(n), label: label.clone() });
                self.records.get_mut(s.id).labels = vec![label];
                self.check_stmt(stmt)
            }
            Stmt::Default(stmt) => {
                if self.func().switch_stack.is_empty() {
                    return Err(CcError::InvalidDefault("default outside of a switch".into()));
                }
                let label = self.new_label("default");
                let ctx = self.func_mut().switch_stack.last_mut().unwrap();
                if ctx.has_default {
                    return Err(CcError::InvalidDefault("multiple default labels in one switch".into()));
                }
                ctx.has_default = true;
                let switch_id = ctx.id;
                self.records.get_mut(switch_id).cases.push(CaseLabel { value: None, label: label.clone() });
                self.records.get_mut(s.id).labels = vec![label];
                self.check_stmt(stmt)
            }
            Stmt::Break => {
                let target = self
                    .func()
                    .break_stack
                    .last()
                    .cloned()
                    .ok_or_else(|| CcError::InvalidBreak("break outside of a loop or switch".into()))?;
                self.records.get_mut(s.id).labels = vec![target];
                Ok(())
            }
            Stmt::Continue => {
                let target = self
                    .func()
                    .loop_stack
                    .last()
                    .ok_or_else(|| CcError::InvalidContinue("continue outside of a loop".into()))?
                    .continue_target
                    .clone();
                self.records.get_mut(s.id).labels = vec![target];
                Ok(())
            }
            Stmt::Return(e) => {
                let ret_ty = self.func().ret_type.clone();
                if let Some(e) = e {
                    let v = self.check_expr(e)?;
                    self.convert(&ret_ty, v)?;
                } else if ret_ty.is_complete() {
                    return Err(CcError::InvalidOperand("missing return value".into()));
                }
                Ok(())
            }
            Stmt::Goto(name) => {
                self.func_mut().labels_referenced.insert(name.clone());
                Ok(())
            }
            Stmt::Label { name, stmt } => {
                if !self.func_mut().labels_defined.insert(name.clone()) {
                    return Err(CcError::Redefined(format!("label {name}")));
                }
                self.records.register_label(name.clone(), s.id);
                self.records.get_mut(s.id).labels = vec![name.clone()];
                self.check_stmt(stmt)
            }
            Stmt::Pragma(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeId, SourceLocation};
    use crate::types::builtin;

    fn stmt_leaf(kind: Stmt) -> StmtNode {
        Node { id: NodeId(500), loc: SourceLocation::default(), kind }
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let mut sema = crate::sema::Sema::new(10);
        sema.func = Some(crate::sema::FunctionCtx::new(sema.global.clone(), builtin::int()));
        let s = stmt_leaf(Stmt::Break);
        assert!(matches!(sema.check_stmt(&s), Err(CcError::InvalidBreak(_))));
    }

    #[test]
    fn while_loop_assigns_start_and_end_labels() {
        let mut sema = crate::sema::Sema::new(10);
        sema.func = Some(crate::sema::FunctionCtx::new(sema.global.clone(), builtin::int()));
        let cond = Node {
            id: NodeId(1),
            loc: SourceLocation::default(),
            kind: Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false },
        };
        let body = stmt_leaf(Stmt::Compound(Vec::new()));
        let w = Node {
            id: NodeId(2),
            loc: SourceLocation::default(),
            kind: Stmt::While { cond, body: Box::new(body) },
        };
        sema.check_stmt(&w).unwrap();
        assert_eq!(sema.records.get(w.id).unwrap().labels.len(), 2);
    }

    #[test]
    fn break_inside_loop_nested_in_switch_targets_the_loop() {
        let mut sema = crate::sema::Sema::new(10);
        sema.func = Some(crate::sema::FunctionCtx::new(sema.global.clone(), builtin::int()));
        let one = |id| Node {
            id: NodeId(id),
            loc: SourceLocation::default(),
            kind: Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false },
        };
        let brk = Node { id: NodeId(1), loc: SourceLocation::default(), kind: Stmt::Break };
        let while_body = Node {
            id: NodeId(2),
            loc: SourceLocation::default(),
            kind: Stmt::Compound(vec![brk]),
        };
        let while_stmt = Node {
            id: NodeId(3),
            loc: SourceLocation::default(),
            kind: Stmt::While { cond: one(4), body: Box::new(while_body) },
        };
        let switch_body = Node {
            id: NodeId(5),
            loc: SourceLocation::default(),
            kind: Stmt::Compound(vec![while_stmt]),
        };
        let switch_stmt = Node {
            id: NodeId(6),
            loc: SourceLocation::default(),
            kind: Stmt::Switch { expr: one(7), body: Box::new(switch_body) },
        };
        sema.check_stmt(&switch_stmt).unwrap();
        let while_labels = sema.records.get(NodeId(3)).unwrap().labels.clone();
        let while_end = &while_labels[1];
        let break_target = &sema.records.get(NodeId(1)).unwrap().labels[0];
        assert_eq!(break_target, while_end);
    }
}
