//! If/while/do-while/for/switch/goto/label emission (spec §4.5.7), plus the shared
//! condition helpers `emit_cond`/`emit_cond_true` used here and by ternary/logical
//! expression emission in `access.rs`/`binop.rs`. Grounded on `codegen.py`'s
//! `Codegen.visit_If`/`visit_While`/`visit_For`/`visit_Switch`.

use crate::ast::{Expr, ExprNode, Stmt, StmtNode};
use crate::codegen::{is_wide_type, Codegen};
use crate::error::{CcError, CcResult};

impl<'a> Codegen<'a> {
    /// Evaluate `cond`; jump to `false_label` if it is zero. Short-circuits a
    /// compile-time-constant condition instead of emitting a branch around a
    /// provably-dead fallthrough.
    pub(crate) fn emit_cond(&mut self, cond: &ExprNode, false_label: &str) -> CcResult<()> {
        let resolved = self.resolved(cond);
        if let Some(n) = self.const_truth(resolved) {
            if !n {
                self.asm.text.emit(&format!("j {false_label}"));
            }
            return Ok(());
        }
        let v = self.gen_expr(resolved)?;
        if is_wide_type(v.ty()) {
            self.asm.text.emit("or a0, a0, a1");
        }
        self.asm.text.emit(&format!("beqz a0, {false_label}"));
        Ok(())
    }

    /// The mirror of [`Self::emit_cond`]: jump to `true_label` if `cond` is nonzero.
    pub(crate) fn emit_cond_true(&mut self, cond: &ExprNode, true_label: &str) -> CcResult<()> {
        let resolved = self.resolved(cond);
        if let Some(n) = self.const_truth(resolved) {
            if n {
                self.asm.text.emit(&format!("j {true_label}"));
            }
            return Ok(());
        }
        let v = self.gen_expr(resolved)?;
        if is_wide_type(v.ty()) {
            self.asm.text.emit("or a0, a0, a1");
        }
        self.asm.text.emit(&format!("bnez a0, {true_label}"));
        Ok(())
    }

    fn const_truth(&self, e: &ExprNode) -> Option<bool> {
        match &e.kind {
            Expr::IntLiteral { value, .. } => Some(*value != 0),
            _ => None,
        }
    }

    pub(crate) fn gen_if(&mut self, s: &StmtNode) -> CcResult<()> {
        let Stmt::If { cond, then_branch, else_branch } = &s.kind else {
            unreachable!("gen_if called on a non-If statement");
        };
        let labels = self.labels_of(s.id)?;
        let false_label = &labels[0];
        self.emit_cond(cond, false_label)?;
        self.gen_stmt(then_branch)?;
        if let Some(else_branch) = else_branch {
            let end_label = &labels[1];
            self.asm.text.emit(&format!("j {end_label}"));
            self.asm.text.emit_label(false_label);
            self.gen_stmt(else_branch)?;
            self.asm.text.emit_label(end_label);
        } else {
            self.asm.text.emit_label(false_label);
        }
        Ok(())
    }

    pub(crate) fn gen_while(&mut self, s: &StmtNode) -> CcResult<()> {
        let Stmt::While { cond, body } = &s.kind else {
            unreachable!("gen_while called on a non-While statement");
        };
        let labels = self.labels_of(s.id)?;
        let (start, end) = (labels[0].clone(), labels[1].clone());
        self.asm.text.emit_label(&start);
        self.emit_cond(cond, &end)?;
        self.gen_stmt(body)?;
        self.asm.text.emit(&format!("j {start}"));
        self.asm.text.emit_label(&end);
        Ok(())
    }

    pub(crate) fn gen_do_while(&mut self, s: &StmtNode) -> CcResult<()> {
        let Stmt::DoWhile { body, cond } = &s.kind else {
            unreachable!("gen_do_while called on a non-DoWhile statement");
        };
        let labels = self.labels_of(s.id)?;
        let (start, end) = (labels[0].clone(), labels[1].clone());
        self.asm.text.emit_label(&start);
        self.gen_stmt(body)?;
        self.emit_cond_true(cond, &start)?;
        self.asm.text.emit_label(&end);
        Ok(())
    }

    pub(crate) fn gen_for(&mut self, s: &StmtNode) -> CcResult<()> {
        let Stmt::For { init, cond, step, body } = &s.kind else {
            unreachable!("gen_for called on a non-For statement");
        };
        let labels = self.labels_of(s.id)?;
        let (start, cont, end) = (labels[0].clone(), labels[1].clone(), labels[2].clone());
        if let Some(init) = init {
            self.gen_stmt(init)?;
        }
        self.asm.text.emit_label(&start);
        if let Some(cond) = cond {
            self.emit_cond(cond, &end)?;
        }
        self.gen_stmt(body)?;
        self.asm.text.emit_label(&cont);
        if let Some(step) = step {
            self.gen_expr(self.resolved(step))?;
        }
        self.asm.text.emit(&format!("j {start}"));
        self.asm.text.emit_label(&end);
        Ok(())
    }

    pub(crate) fn gen_switch(&mut self, s: &StmtNode) -> CcResult<()> {
        let Stmt::Switch { expr, body } = &s.kind else {
            unreachable!("gen_switch called on a non-Switch statement");
        };
        let labels = self.labels_of(s.id)?;
        let end = labels[0].clone();
        let cases = self.records.get(s.id).map(|r| r.cases.clone()).unwrap_or_default();
        self.gen_expr(self.resolved(expr))?;
        let mut default_label = None;
        for case in &cases {
            match case.value {
                Some(n) => {
                    self.asm.text.emit(&format!("li a1, {n}"));
                    self.asm.text.emit(&format!("beq a0, a1, {}", case.label));
                }
                None => default_label = Some(case.label.clone()),
            }
        }
        self.asm.text.emit(&format!("j {}", default_label.as_deref().unwrap_or(&end)));
        self.gen_stmt(body)?;
        self.asm.text.emit_label(&end);
        Ok(())
    }

    fn labels_of(&self, id: crate::ast::NodeId) -> CcResult<Vec<String>> {
        self.records
            .get(id)
            .map(|r| r.labels.clone())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| CcError::InvalidOperand("control-flow node has no recorded labels".into()))
    }
}
