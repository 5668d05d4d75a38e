//! Binary operator emission (spec §4.5.6): push-right/load-left/pop-right template,
//! pointer-arithmetic scaling for `+`/`-`, and short-circuit `&&`/`||`. Grounded on
//! `codegen.py`'s `Codegen.visit_BinaryOp`, generalized to the teacher's
//! one-file-per-concern split.

use crate::ast::{BinaryOp, ExprNode};
use crate::codegen::{is_wide_type, Codegen};
use crate::error::{CcError, CcResult};
use crate::types::Type;
use crate::value::Value;

impl<'a> Codegen<'a> {
    pub(crate) fn gen_binary(&mut self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode, result: &Value) -> CcResult<Value> {
        if matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
            return self.gen_logical(op, lhs, rhs, result);
        }
        let rv = self.gen_expr(rhs)?;
        self.push(&rv)?;
        let lv = self.gen_expr(lhs)?;
        self.pop_into("a2", rv.ty())?;
        self.emit_binop(op, &lv, &rv)?;
        Ok(result.clone())
    }

    fn gen_logical(&mut self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode, result: &Value) -> CcResult<Value> {
        let end_label = self.asm.text.new_local_label("logical.end");
        match op {
            BinaryOp::LogicalAnd => {
                let false_label = self.asm.text.new_local_label("logical.false");
                self.emit_cond(lhs, &false_label)?;
                self.emit_cond(rhs, &false_label)?;
                self.asm.text.emit("li a0, 1");
                self.asm.text.emit(&format!("j {end_label}"));
                self.asm.text.emit_label(&false_label);
                self.asm.text.emit("li a0, 0");
            }
            BinaryOp::LogicalOr => {
                let true_label = self.asm.text.new_local_label("logical.true");
                self.emit_cond_true(lhs, &true_label)?;
                self.emit_cond_true(rhs, &true_label)?;
                self.asm.text.emit("li a0, 0");
                self.asm.text.emit(&format!("j {end_label}"));
                self.asm.text.emit_label(&true_label);
                self.asm.text.emit("li a0, 1");
            }
            _ => unreachable!("gen_logical called with a non-logical operator"),
        }
        self.asm.text.emit_label(&end_label);
        Ok(result.clone())
    }

    fn emit_binop(&mut self, op: BinaryOp, lv: &Value, rv: &Value) -> CcResult<()> {
        use BinaryOp::*;
        let wide = is_wide_type(lv.ty()) || is_wide_type(rv.ty());
        match op {
            Add | Sub => self.emit_add_sub(op, lv, rv, wide),
            Mul => {
                if wide {
                    // (a1:a0) * (a3:a2) truncated to 64 bits: cross products plus the
                    // high half of the low*low product, low*low kept last since it
                    // overwrites a0.
                    self.asm.text.emit_lines([
                        "mul a1, a2, a1",
                        "mul a3, a3, a0",
                        "add a1, a1, a3",
                        "mulhu a3, a2, a0",
                        "add a1, a1, a3",
                        "mul a0, a2, a0",
                    ]);
                } else {
                    self.asm.text.emit("mul a0, a0, a2");
                }
                Ok(())
            }
            Div => {
                if wide {
                    return Err(CcError::NotImplemented("64-bit division".into()));
                }
                let op = if is_unsigned(rv) || is_unsigned(lv) { "divu" } else { "div" };
                self.asm.text.emit(&format!("{op} a0, a0, a2"));
                Ok(())
            }
            Mod => {
                if wide {
                    return Err(CcError::NotImplemented("64-bit modulo".into()));
                }
                let op = if is_unsigned(rv) || is_unsigned(lv) { "remu" } else { "rem" };
                self.asm.text.emit(&format!("{op} a0, a0, a2"));
                Ok(())
            }
            BitAnd => {
                if wide {
                    self.asm.text.emit("and a1, a1, a3");
                }
                self.asm.text.emit("and a0, a0, a2");
                Ok(())
            }
            BitOr => {
                if wide {
                    self.asm.text.emit("or a1, a1, a3");
                }
                self.asm.text.emit("or a0, a0, a2");
                Ok(())
            }
            BitXor => {
                if wide {
                    self.asm.text.emit("xor a1, a1, a3");
                }
                self.asm.text.emit("xor a0, a0, a2");
                Ok(())
            }
            Shl => {
                if wide {
                    return Err(CcError::NotImplemented("64-bit shift".into()));
                }
                self.asm.text.emit("sll a0, a0, a2");
                Ok(())
            }
            Shr => {
                if wide {
                    return Err(CcError::NotImplemented("64-bit shift".into()));
                }
                let op = if is_unsigned(lv) { "srl" } else { "sra" };
                self.asm.text.emit(&format!("{op} a0, a0, a2"));
                Ok(())
            }
            Eq => {
                if wide {
                    self.asm.text.emit_lines(["xor a1, a1, a3", "xor a0, a0, a2", "or a0, a0, a1", "seqz a0, a0", "li a1, 0"]);
                } else {
                    self.asm.text.emit("xor a0, a0, a2");
                    self.asm.text.emit("seqz a0, a0");
                }
                Ok(())
            }
            Ne => {
                if wide {
                    self.asm.text.emit_lines(["xor a1, a1, a3", "xor a0, a0, a2", "or a0, a0, a1", "snez a0, a0", "li a1, 0"]);
                } else {
                    self.asm.text.emit("xor a0, a0, a2");
                    self.asm.text.emit("snez a0, a0");
                }
                Ok(())
            }
            Lt => {
                if wide {
                    self.emit_cmp64_lt(!(is_unsigned(lv) || is_unsigned(rv)));
                    return Ok(());
                }
                let op = if is_unsigned(lv) || is_unsigned(rv) { "sltu" } else { "slt" };
                self.asm.text.emit(&format!("{op} a0, a0, a2"));
                Ok(())
            }
            Ge => {
                if wide {
                    self.emit_cmp64_lt(!(is_unsigned(lv) || is_unsigned(rv)));
                    self.asm.text.emit("xori a0, a0, 1");
                    return Ok(());
                }
                let op = if is_unsigned(lv) || is_unsigned(rv) { "sltu" } else { "slt" };
                self.asm.text.emit(&format!("{op} a0, a0, a2"));
                self.asm.text.emit("xori a0, a0, 1");
                Ok(())
            }
            Gt | Le => unreachable!("Gt/Le are rewritten to Lt/Ge by Sema before Codegen sees them"),
            LogicalAnd | LogicalOr => unreachable!("handled by gen_logical"),
        }
    }

    /// `a1:a0 < a3:a2`, by the requested signedness of the high-limb compare: equal
    /// high limbs fall through to an unsigned low-limb compare, otherwise the high
    /// limb alone decides it (spec §4.5.6). Leaves the `int` result in `a0`, `a1`
    /// cleared.
    fn emit_cmp64_lt(&mut self, signed: bool) {
        let mnemonic = if signed { "slt" } else { "sltu" };
        let tie = self.asm.text.new_local_label("cmp64.tie");
        let end = self.asm.text.new_local_label("cmp64.end");
        self.asm.text.emit(&format!("beq a1, a3, {tie}"));
        self.asm.text.emit(&format!("{mnemonic} a0, a1, a3"));
        self.asm.text.emit(&format!("j {end}"));
        self.asm.text.emit_label(&tie);
        self.asm.text.emit("sltu a0, a0, a2");
        self.asm.text.emit_label(&end);
        self.asm.text.emit("li a1, 0");
    }

    fn emit_add_sub(&mut self, op: BinaryOp, lv: &Value, rv: &Value, wide: bool) -> CcResult<()> {
        if wide {
            return match op {
                BinaryOp::Add => {
                    self.asm.text.emit_lines(["add a0, a0, a2", "sltu a2, a0, a2", "add a1, a1, a3", "add a1, a1, a2"]);
                    Ok(())
                }
                BinaryOp::Sub => {
                    self.asm.text.emit_lines(["sub a1, a1, a3", "sltu a3, a0, a2", "sub a1, a1, a3", "sub a0, a0, a2"]);
                    Ok(())
                }
                _ => unreachable!("emit_add_sub called with a non-add/sub operator"),
            };
        }
        let lptr = lv.ty().is_pointer();
        let rptr = rv.ty().is_pointer();
        match (op, lptr, rptr) {
            (BinaryOp::Add, true, false) => {
                self.scale_by_pointee("a2", lv.ty());
                self.asm.text.emit("add a0, a0, a2");
            }
            (BinaryOp::Add, false, true) => {
                self.scale_by_pointee("a0", rv.ty());
                self.asm.text.emit("add a0, a0, a2");
            }
            (BinaryOp::Add, _, _) => {
                self.asm.text.emit("add a0, a0, a2");
            }
            (BinaryOp::Sub, true, true) => {
                self.asm.text.emit("sub a0, a0, a2");
                self.unscale_by_pointee("a0", lv.ty());
            }
            (BinaryOp::Sub, true, false) => {
                self.scale_by_pointee("a2", lv.ty());
                self.asm.text.emit("sub a0, a0, a2");
            }
            (BinaryOp::Sub, _, _) => {
                self.asm.text.emit("sub a0, a0, a2");
            }
            _ => unreachable!("emit_add_sub called with a non-add/sub operator"),
        }
        Ok(())
    }

    /// Scale the int operand in `reg` by the pointer's pointee size (spec §4.5.6's
    /// pointer-arithmetic rule; an incomplete/void pointee scales by 1).
    fn scale_by_pointee(&mut self, reg: &str, ptr_ty: &Type) {
        let scale = ptr_ty.pointee().and_then(Type::size).unwrap_or(1);
        if scale <= 1 {
            return;
        }
        if scale.is_power_of_two() {
            self.asm.text.emit(&format!("slli {reg}, {reg}, {}", scale.trailing_zeros()));
        } else {
            self.asm.text.emit(&format!("li a3, {scale}"));
            self.asm.text.emit(&format!("mul {reg}, {reg}, a3"));
        }
    }

    /// Divide a raw pointer difference in `reg` by the pointee size, for `p1 - p2`.
    fn unscale_by_pointee(&mut self, reg: &str, ptr_ty: &Type) {
        let scale = ptr_ty.pointee().and_then(Type::size).unwrap_or(1);
        if scale <= 1 {
            return;
        }
        if scale.is_power_of_two() {
            self.asm.text.emit(&format!("srai {reg}, {reg}, {}", scale.trailing_zeros()));
        } else {
            self.asm.text.emit(&format!("li a3, {scale}"));
            self.asm.text.emit(&format!("div {reg}, {reg}, a3"));
        }
    }
}

fn is_unsigned(v: &Value) -> bool {
    match v.ty() {
        Type::Int(it) => it.unsigned,
        Type::Pointer(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin;

    #[test]
    fn pointer_is_treated_as_unsigned_for_comparison() {
        let v = Value::TemporaryValue { ty: Type::pointer(builtin::int()) };
        assert!(is_unsigned(&v));
        let v = Value::TemporaryValue { ty: builtin::int() };
        assert!(!is_unsigned(&v));
    }
}
