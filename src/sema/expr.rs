//! Expression checking: type inference, constant folding, and the AST-to-AST
//! lowering table of spec §4.4.4 (index/member access, pre/post inc-dec, compound
//! assignment aliasing, comparison rewrites). Grounded on `cc.py`'s expression
//! visitor and `codegen.py`'s constant-folding helpers.

use crate::ast::{BinaryOp, Expr, ExprNode, UnaryOp};
use crate::error::{CcError, CcResult};
use crate::scope::Symbol;
use crate::types::{self, builtin, Type};
use crate::value::Value;

impl crate::sema::Sema {
    pub fn check_expr(&mut self, e: &ExprNode) -> CcResult<Value> {
        self.path.push(e.id);
        let result = self.check_expr_inner(e);
        self.path.pop();
        let value = result?;
        self.records.set_value(e.id, value.clone());
        Ok(value)
    }

    fn check_expr_inner(&mut self, e: &ExprNode) -> CcResult<Value> {
        match &e.kind {
            Expr::Ident(name) => self.scope().get_value(name),
            Expr::IntLiteral { value, suffix_unsigned, suffix_long } => {
                let ty = match (*suffix_long, *suffix_unsigned) {
                    (true, true) => builtin::unsigned_long(),
                    (true, false) => builtin::long(),
                    (false, true) => builtin::unsigned_int(),
                    (false, false) => builtin::int(),
                };
                let it = match &ty {
                    Type::Int(it) => it.clone(),
                    _ => unreachable!(),
                };
                Ok(Value::IntConstant { value: it.normalize(*value), ty })
            }
            Expr::CharLiteral(s) => {
                let byte = parse_char_literal(s);
                Ok(Value::IntConstant { value: byte as i64, ty: builtin::char() })
            }
            Expr::StrLiteral(s) => {
                let bytes = parse_string_literal(s);
                let ty = Type::array(builtin::char(), Some(bytes.len()));
                Ok(Value::StrLiteral { bytes, source_form: s.clone(), rodata_label: None, ty })
            }
            Expr::Unary { op, expr } => self.check_unary(*op, expr, e),
            Expr::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, e),
            Expr::Assign { lhs, rhs } => self.check_assign(lhs, rhs),
            Expr::CompoundAssign { op, lhs, rhs } => self.check_compound_assign(*op, lhs, rhs, e),
            Expr::PreIncDec { inc, expr } => self.check_pre_inc_dec(*inc, expr, e),
            Expr::PostIncDec { inc, expr } => self.check_post_inc_dec(*inc, expr, e),
            Expr::Call { callee, args } => self.check_call(callee, args),
            Expr::Cast { ty, expr } => {
                let target = self.resolve_type(ty)?;
                let v = self.check_expr(expr)?;
                self.convert_cast(&target, v)
            }
            Expr::TypedCast { ty, expr } => {
                let v = self.check_expr(expr)?;
                self.convert_cast(ty, v)
            }
            Expr::Member { base, field, arrow } => self.check_member(base, field, *arrow, e),
            Expr::Index { base, index } => self.check_index(base, index, e),
            Expr::AddrOf(inner) => self.check_addr_of(inner),
            Expr::Deref(inner) => self.check_deref(inner),
            Expr::Ternary { cond, t, f } => self.check_ternary(cond, t, f),
            Expr::Comma(items) => {
                let mut last = None;
                for item in items {
                    last = Some(self.check_expr(item)?);
                }
                last.ok_or_else(|| CcError::InvalidOperand("empty comma expression".into()))
            }
            Expr::SizeofExpr(inner) => {
                let v = self.check_expr(inner)?;
                let size = v.ty().size().ok_or_else(|| CcError::IncompleteType(format!("{:?}", v.ty())))?;
                Ok(Value::IntConstant { value: size as i64, ty: builtin::unsigned_long() })
            }
            Expr::SizeofType(tn) => {
                let ty = self.resolve_type(tn)?;
                let size = ty.size().ok_or_else(|| CcError::IncompleteType(format!("{ty:?}")))?;
                Ok(Value::IntConstant { value: size as i64, ty: builtin::unsigned_long() })
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, expr: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        let v = self.check_expr(expr)?;
        let v = self.decay_to_pointer(v, true);
        if !v.ty().is_int() {
            return Err(CcError::InvalidOperand(format!("unary operator on {:?}", v.ty())));
        }
        let ty = types::promote_int(v.ty());
        if let Value::IntConstant { value, .. } = &v {
            let raw = match op {
                UnaryOp::Neg => -value,
                UnaryOp::Not => !value,
                UnaryOp::LogicalNot => i64::from(*value == 0),
            };
            let it = match &ty {
                Type::Int(it) => it.clone(),
                _ => unreachable!(),
            };
            let result_ty = if op == UnaryOp::LogicalNot { builtin::int() } else { ty };
            return Ok(Value::IntConstant { value: it.normalize(raw), ty: result_ty });
        }
        if op == UnaryOp::Neg && ty.size() == Some(8) {
            // Codegen has no standalone 64-bit negate instruction sequence; rewrite
            // to the two's-complement identity so it reuses the 64-bit bitwise-not
            // and add paths instead (spec §4.4.4).
            let not_expr = self.synth(Expr::Unary { op: UnaryOp::Not, expr: Box::new(expr.clone()) });
            let one = self.synth(Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false });
            let rewritten = self.synth(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(not_expr), rhs: Box::new(one) });
            return self.lower_to(orig.id, rewritten);
        }
        let result_ty = if op == UnaryOp::LogicalNot { builtin::int() } else { ty };
        Ok(Value::TemporaryValue { ty: result_ty })
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        // a > b, a <= b were already rewritten by Sema (spec §4.4.4).
        if op == BinaryOp::Gt || op == BinaryOp::Le {
            let swapped_op = if op == BinaryOp::Gt { BinaryOp::Lt } else { BinaryOp::Ge };
            let rewritten = self.synth(Expr::Binary {
                op: swapped_op,
                lhs: Box::new(rhs.clone()),
                rhs: Box::new(lhs.clone()),
            });
            return self.lower_to(orig.id, rewritten);
        }

        let lv = self.check_expr(lhs)?;
        let rv = self.check_expr(rhs)?;
        let lv = self.decay_to_pointer(lv, true);
        let rv = self.decay_to_pointer(rv, true);

        match op {
            BinaryOp::Add => self.arith_add(lv, rv),
            BinaryOp::Sub => self.arith_sub(lv, rv),
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                self.arith_int_op(op, lv, rv)
            }
            BinaryOp::Shl | BinaryOp::Shr => self.arith_shift(op, lv, rv),
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => self.arith_logical(op, lv, rv),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Ge => self.arith_compare(op, lv, rv),
            BinaryOp::Gt | BinaryOp::Le => unreachable!("rewritten above"),
        }
    }

    fn arith_add(&mut self, lv: Value, rv: Value) -> CcResult<Value> {
        if lv.ty().is_pointer() && rv.ty().is_int() {
            return Ok(Value::TemporaryValue { ty: lv.ty().clone() });
        }
        if rv.ty().is_pointer() && lv.ty().is_int() {
            return Ok(Value::TemporaryValue { ty: rv.ty().clone() });
        }
        if lv.ty().is_int() && rv.ty().is_int() {
            return self.fold_int(lv, rv, |a, b| a.wrapping_add(b));
        }
        Err(CcError::InvalidOperand(format!("+ on {:?} and {:?}", lv.ty(), rv.ty())))
    }

    fn arith_sub(&mut self, lv: Value, rv: Value) -> CcResult<Value> {
        if lv.ty().is_pointer() && rv.ty().is_pointer() {
            if !lv.ty().is_compatible(rv.ty()) {
                return Err(CcError::InvalidOperand("subtracting unrelated pointer types".into()));
            }
            return Ok(Value::TemporaryValue { ty: builtin::long() });
        }
        if lv.ty().is_pointer() && rv.ty().is_int() {
            return Ok(Value::TemporaryValue { ty: lv.ty().clone() });
        }
        if lv.ty().is_int() && rv.ty().is_int() {
            return self.fold_int(lv, rv, |a, b| a.wrapping_sub(b));
        }
        Err(CcError::InvalidOperand(format!("- on {:?} and {:?}", lv.ty(), rv.ty())))
    }

    fn arith_int_op(&mut self, op: BinaryOp, lv: Value, rv: Value) -> CcResult<Value> {
        if !lv.ty().is_int() || !rv.ty().is_int() {
            return Err(CcError::InvalidOperand(format!("{op:?} requires integer operands")));
        }
        match op {
            BinaryOp::Mul => self.fold_int(lv, rv, |a, b| a.wrapping_mul(b)),
            BinaryOp::Div => {
                if let (Value::IntConstant { value: a, .. }, Value::IntConstant { value: b, .. }) = (&lv, &rv) {
                    if *b == 0 {
                        return Err(CcError::InvalidOperand("division by zero".into()));
                    }
                }
                self.fold_int(lv, rv, |a, b| if b == 0 { 0 } else { a.wrapping_div(b) })
            }
            BinaryOp::Mod => self.fold_int(lv, rv, |a, b| if b == 0 { 0 } else { a.wrapping_rem(b) }),
            BinaryOp::BitAnd => self.fold_int(lv, rv, |a, b| a & b),
            BinaryOp::BitOr => self.fold_int(lv, rv, |a, b| a | b),
            BinaryOp::BitXor => self.fold_int(lv, rv, |a, b| a ^ b),
            _ => unreachable!(),
        }
    }

    fn arith_shift(&mut self, op: BinaryOp, lv: Value, rv: Value) -> CcResult<Value> {
        if !lv.ty().is_int() || !rv.ty().is_int() {
            return Err(CcError::InvalidOperand(format!("{op:?} requires integer operands")));
        }
        if lv.ty().size() == Some(8) || rv.ty().size() == Some(8) {
            return Err(CcError::NotImplemented("64-bit shift".into()));
        }
        let ty = types::promote_int(lv.ty());
        let it = match &ty {
            Type::Int(it) => it.clone(),
            _ => unreachable!(),
        };
        if let (Value::IntConstant { value: a, .. }, Value::IntConstant { value: b, .. }) = (&lv, &rv) {
            let raw = match op {
                BinaryOp::Shl => a.wrapping_shl(*b as u32),
                BinaryOp::Shr => a.wrapping_shr(*b as u32),
                _ => unreachable!(),
            };
            return Ok(Value::IntConstant { value: it.normalize(raw), ty });
        }
        Ok(Value::TemporaryValue { ty })
    }

    fn arith_logical(&mut self, op: BinaryOp, lv: Value, rv: Value) -> CcResult<Value> {
        if !(lv.ty().is_int() || lv.ty().is_pointer()) || !(rv.ty().is_int() || rv.ty().is_pointer()) {
            return Err(CcError::InvalidOperand(format!("{op:?} requires scalar operands")));
        }
        let truthy = |v: &Value| match v {
            Value::IntConstant { value, .. } => Some(*value != 0),
            Value::PtrConstant { value, .. } => Some(*value != 0),
            _ => None,
        };
        if let (Some(a), Some(b)) = (truthy(&lv), truthy(&rv)) {
            let result = match op {
                BinaryOp::LogicalAnd => a && b,
                BinaryOp::LogicalOr => a || b,
                _ => unreachable!(),
            };
            return Ok(Value::IntConstant { value: i64::from(result), ty: builtin::int() });
        }
        Ok(Value::TemporaryValue { ty: builtin::int() })
    }

    fn arith_compare(&mut self, op: BinaryOp, lv: Value, rv: Value) -> CcResult<Value> {
        let both_int = lv.ty().is_int() && rv.ty().is_int();
        let both_ptr = lv.ty().is_pointer() && rv.ty().is_pointer();
        let null_mix = (lv.ty().is_pointer() && rv.as_int_constant() == Some(0))
            || (rv.ty().is_pointer() && lv.as_int_constant() == Some(0));
        if !both_int && !both_ptr && !null_mix {
            return Err(CcError::InvalidOperand(format!("{op:?} on {:?} and {:?}", lv.ty(), rv.ty())));
        }
        if both_ptr && !lv.ty().is_compatible(rv.ty()) {
            crate::error::warn(&format!("comparison of distinct pointer types {:?} and {:?}", lv.ty(), rv.ty()));
        }
        if both_int {
            if let (Value::IntConstant { value: a, .. }, Value::IntConstant { value: b, .. }) = (&lv, &rv) {
                let result = match op {
                    BinaryOp::Eq => a == b,
                    BinaryOp::Ne => a != b,
                    BinaryOp::Lt => a < b,
                    BinaryOp::Ge => a >= b,
                    _ => unreachable!(),
                };
                return Ok(Value::IntConstant { value: i64::from(result), ty: builtin::int() });
            }
        }
        Ok(Value::TemporaryValue { ty: builtin::int() })
    }

    fn fold_int(&mut self, lv: Value, rv: Value, f: impl Fn(i64, i64) -> i64) -> CcResult<Value> {
        let common = types::arithmetic_common(lv.ty(), rv.ty());
        let it = match &common {
            Type::Int(it) => it.clone(),
            _ => unreachable!(),
        };
        if let (Value::IntConstant { value: a, .. }, Value::IntConstant { value: b, .. }) = (&lv, &rv) {
            return Ok(Value::IntConstant { value: it.normalize(f(*a, *b)), ty: common });
        }
        Ok(Value::TemporaryValue { ty: common })
    }

    fn check_assign(&mut self, lhs: &ExprNode, rhs: &ExprNode) -> CcResult<Value> {
        let lv = self.check_expr(lhs)?;
        if !lv.is_lvalue() {
            return Err(CcError::InvalidOperand("assignment target is not an lvalue".into()));
        }
        let rv = self.check_expr(rhs)?;
        let converted = self.convert(lv.ty(), rv)?;
        let _ = converted;
        Ok(Value::TemporaryValue { ty: lv.ty().clone() })
    }

    fn check_compound_assign(&mut self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        let lv = self.check_expr(lhs)?;
        if !lv.is_lvalue() {
            return Err(CcError::InvalidOperand("compound-assignment target is not an lvalue".into()));
        }
        if lv.is_stable() {
            let binary = self.synth(Expr::Binary { op, lhs: Box::new(lhs.clone()), rhs: Box::new(rhs.clone()) });
            let rewritten = self.synth(Expr::Assign {
                lhs: Box::new(lhs.clone()),
                rhs: Box::new(binary),
            });
            return self.lower_to(orig.id, rewritten);
        }

        let tmp_name = self.new_temp_name();
        let tmp_ty = Type::pointer(lv.ty().clone());
        let tmp_offset = self.scope().alloc_local(4);
        self.func_mut().note_frame_offset((-tmp_offset) as usize);
        self.scope()
            .add(&tmp_name, Symbol::Value(Value::LocalVariable { name: tmp_name.clone(), ty: tmp_ty, frame_offset: tmp_offset }))?;

        let tmp_ident = self.synth(Expr::Ident(tmp_name));
        let addr_of_lhs = self.synth(Expr::AddrOf(Box::new(lhs.clone())));
        let assign_tmp = self.synth(Expr::Assign {
            lhs: Box::new(tmp_ident.clone()),
            rhs: Box::new(addr_of_lhs),
        });
        let deref_a = self.synth(Expr::Deref(Box::new(tmp_ident.clone())));
        let deref_b = self.synth(Expr::Deref(Box::new(tmp_ident.clone())));
        let binary = self.synth(Expr::Binary { op, lhs: Box::new(deref_b), rhs: Box::new(rhs.clone()) });
        let store = self.synth(Expr::Assign {
            lhs: Box::new(deref_a),
            rhs: Box::new(binary),
        });
        let deref_c = self.synth(Expr::Deref(Box::new(tmp_ident)));
        let comma = self.synth(Expr::Comma(vec![assign_tmp, store, deref_c]));
        self.lower_to(orig.id, comma)
    }

    fn check_pre_inc_dec(&mut self, inc: bool, expr: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        let op = if inc { BinaryOp::Add } else { BinaryOp::Sub };
        let one = self.synth(Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false });
        let rewritten = self.synth(Expr::CompoundAssign { op, lhs: Box::new(expr.clone()), rhs: Box::new(one) });
        self.lower_to(orig.id, rewritten)
    }

    fn check_post_inc_dec(&mut self, inc: bool, expr: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        let lv = self.check_expr(expr)?;
        if !lv.is_lvalue() {
            return Err(CcError::InvalidOperand("increment/decrement target is not an lvalue".into()));
        }
        let fwd_op = if inc { BinaryOp::Add } else { BinaryOp::Sub };
        let back_op = if inc { BinaryOp::Sub } else { BinaryOp::Add };

        let tmp_name = self.new_temp_name();
        let tmp_ty = Type::pointer(lv.ty().clone());
        let tmp_offset = self.scope().alloc_local(4);
        self.func_mut().note_frame_offset((-tmp_offset) as usize);
        self.scope()
            .add(&tmp_name, Symbol::Value(Value::LocalVariable { name: tmp_name.clone(), ty: tmp_ty, frame_offset: tmp_offset }))?;

        let tmp_ident = self.synth(Expr::Ident(tmp_name));
        let addr_of_expr = self.synth(Expr::AddrOf(Box::new(expr.clone())));
        let assign_tmp = self.synth(Expr::Assign {
            lhs: Box::new(tmp_ident.clone()),
            rhs: Box::new(addr_of_expr),
        });
        let one = self.synth(Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false });
        let deref_tmp = self.synth(Expr::Deref(Box::new(tmp_ident.clone())));
        let ca = self.synth(Expr::CompoundAssign { op: fwd_op, lhs: Box::new(deref_tmp), rhs: Box::new(one) });
        let one2 = self.synth(Expr::IntLiteral { value: 1, suffix_unsigned: false, suffix_long: false });
        let deref_tmp2 = self.synth(Expr::Deref(Box::new(tmp_ident)));
        let old_value = self.synth(Expr::Binary {
            op: back_op,
            lhs: Box::new(deref_tmp2),
            rhs: Box::new(one2),
        });
        let comma = self.synth(Expr::Comma(vec![assign_tmp, ca, old_value]));
        self.lower_to(orig.id, comma)
    }

    fn check_call(&mut self, callee: &ExprNode, args: &[ExprNode]) -> CcResult<Value> {
        let cv = self.check_expr(callee)?;
        let cv = self.decay_to_pointer(cv, true);
        let sig = match cv.ty() {
            Type::Function(sig) => sig.clone(),
            Type::Pointer(p) => match p.as_ref() {
                Type::Function(sig) => sig.clone(),
                _ => return Err(CcError::InvalidOperand("call target is not a function".into())),
            },
            _ => return Err(CcError::InvalidOperand("call target is not a function".into())),
        };
        if args.len() < sig.args.len() || (args.len() > sig.args.len() && !sig.ellipsis) {
            return Err(CcError::InvalidOperand(format!(
                "expected {} argument(s), found {}",
                sig.args.len(),
                args.len()
            )));
        }
        for (i, arg) in args.iter().enumerate() {
            let av = self.check_expr(arg)?;
            if let Some(pty) = sig.args.get(i) {
                self.convert(pty, av)?;
            } else {
                self.decay_to_pointer(av, true);
            }
        }
        Ok(Value::TemporaryValue { ty: sig.ret.clone() })
    }

    fn check_member(&mut self, base: &ExprNode, field: &str, arrow: bool, orig: &ExprNode) -> CcResult<Value> {
        let base_val = self.check_expr(base)?;
        let struct_ty = if arrow {
            base_val.ty().pointee().cloned().ok_or_else(|| CcError::InvalidOperand("-> on a non-pointer".into()))?
        } else {
            base_val.ty().clone()
        };
        let st = match &struct_ty {
            Type::Struct(st) => st.clone(),
            _ => return Err(CcError::InvalidOperand(format!("member access on {struct_ty:?}"))),
        };
        let fields = st.fields.as_ref().ok_or_else(|| CcError::IncompleteType(format!("{struct_ty:?}")))?;
        let f = fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| CcError::Undefined(format!("field {field}")))?;
        let field_ty = f.ty.clone();
        let field_offset = f.offset as i64;

        let base_ptr_expr = if arrow {
            base.clone()
        } else {
            self.synth(Expr::AddrOf(Box::new(base.clone())))
        };
        let as_void = self.synth(Expr::TypedCast { ty: Type::pointer(Type::Void), expr: Box::new(base_ptr_expr) });
        let offset_lit = self.synth(Expr::IntLiteral { value: field_offset, suffix_unsigned: false, suffix_long: false });
        let added = self.synth(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(as_void), rhs: Box::new(offset_lit) });
        let as_field_ptr = self.synth(Expr::TypedCast { ty: Type::pointer(field_ty), expr: Box::new(added) });
        let deref = self.synth(Expr::Deref(Box::new(as_field_ptr)));
        self.lower_to(orig.id, deref)
    }

    fn check_index(&mut self, base: &ExprNode, index: &ExprNode, orig: &ExprNode) -> CcResult<Value> {
        let add = self.synth(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(base.clone()), rhs: Box::new(index.clone()) });
        let deref = self.synth(Expr::Deref(Box::new(add)));
        self.lower_to(orig.id, deref)
    }

    fn check_addr_of(&mut self, inner: &ExprNode) -> CcResult<Value> {
        let v = self.check_expr(inner)?;
        if !v.is_lvalue() {
            return Err(CcError::InvalidOperand("cannot take the address of a non-lvalue".into()));
        }
        let ptr_ty = Type::pointer(v.ty().clone());
        Ok(match v {
            Value::GlobalVariable { label, .. } | Value::StaticVariable { label, .. } => {
                Value::SymConstant { name: label, ty: ptr_ty, offset: 0 }
            }
            Value::ExternVariable { name, .. } => Value::SymConstant { name, ty: ptr_ty, offset: 0 },
            Value::LocalVariable { frame_offset, .. } | Value::Argument { frame_offset, .. } => {
                Value::StackFrameOffset { offset: frame_offset, ty: ptr_ty }
            }
            Value::StrLiteral { bytes, source_form, .. } => {
                let label = self.str_pool.intern(&bytes, &source_form);
                Value::SymConstant { name: label, ty: ptr_ty, offset: 0 }
            }
            Value::MemoryAccess { addr, .. } => addr.with_type(ptr_ty),
            other => other.with_type(ptr_ty),
        })
    }

    fn check_deref(&mut self, inner: &ExprNode) -> CcResult<Value> {
        let v = self.check_expr(inner)?;
        let v = self.decay_to_pointer(v, true);
        let pointee = v.ty().pointee().cloned().ok_or_else(|| CcError::InvalidOperand(format!("dereferencing {:?}", v.ty())))?;
        Ok(Value::MemoryAccess { addr: Box::new(v), ty: pointee })
    }

    fn check_ternary(&mut self, cond: &ExprNode, t: &ExprNode, f: &ExprNode) -> CcResult<Value> {
        let cv = self.check_expr(cond)?;
        let tv = self.check_expr(t)?;
        let fv = self.check_expr(f)?;
        let common = if tv.ty().is_int() && fv.ty().is_int() {
            types::arithmetic_common(tv.ty(), fv.ty())
        } else {
            tv.ty().clone()
        };
        let truthy = match &cv {
            Value::IntConstant { value, .. } => Some(*value != 0),
            Value::PtrConstant { value, .. } => Some(*value != 0),
            _ => None,
        };
        if let Some(truthy) = truthy {
            let chosen = if truthy { tv } else { fv };
            return Ok(chosen.with_type(common));
        }
        Ok(Value::TemporaryValue { ty: common })
    }
}

fn parse_char_literal(raw: &str) -> u8 {
    let inner = raw.trim_matches('\'');
    unescape_one(inner)
}

fn parse_string_literal(raw: &str) -> Vec<u8> {
    let inner = raw.trim_matches('"');
    let mut out = Vec::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let mut seq = String::from('\\');
            if let Some(&next) = chars.peek() {
                seq.push(next);
                chars.next();
                if next == 'x' {
                    while let Some(&h) = chars.peek() {
                        if h.is_ascii_hexdigit() {
                            seq.push(h);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            out.push(unescape_one(&seq));
        } else {
            out.push(c as u8);
        }
    }
    out.push(0);
    out
}

fn unescape_one(s: &str) -> u8 {
    if let Some(rest) = s.strip_prefix('\\') {
        match rest.chars().next() {
            Some('n') => b'\n',
            Some('t') => b'\t',
            Some('0') => 0,
            Some('"') => b'"',
            Some('\\') => b'\\',
            Some('\'') => b'\'',
            Some('x') => u8::from_str_radix(&rest[1..], 16).unwrap_or(0),
            _ => rest.bytes().next().unwrap_or(0),
        }
    } else {
        s.bytes().next().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeId, SourceLocation};
    use std::cell::Cell;

    thread_local!(static NEXT_TEST_ID: Cell<u32> = Cell::new(0));

    fn leaf(kind: Expr) -> ExprNode {
        let id = NEXT_TEST_ID.with(|c| {
            let v = c.get();
            c.set(v + 1);
            v
        });
        Node { id: NodeId(id), loc: SourceLocation::default(), kind }
    }

    #[test]
    fn int_arithmetic_folds() {
        let mut sema = crate::sema::Sema::new(10);
        sema.func = Some(crate::sema::FunctionCtx::new(sema.global.clone(), builtin::int()));
        let two = leaf(Expr::IntLiteral { value: 2, suffix_unsigned: false, suffix_long: false });
        let three = leaf(Expr::IntLiteral { value: 3, suffix_unsigned: false, suffix_long: false });
        let add = leaf(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(two), rhs: Box::new(three) });
        let v = sema.check_expr(&add).unwrap();
        assert_eq!(v.as_int_constant(), Some(5));
    }

    #[test]
    fn gt_is_rewritten_to_lt() {
        let mut sema = crate::sema::Sema::new(10);
        sema.func = Some(crate::sema::FunctionCtx::new(sema.global.clone(), builtin::int()));
        let five = leaf(Expr::IntLiteral { value: 5, suffix_unsigned: false, suffix_long: false });
        let two = leaf(Expr::IntLiteral { value: 2, suffix_unsigned: false, suffix_long: false });
        let gt = leaf(Expr::Binary { op: BinaryOp::Gt, lhs: Box::new(five), rhs: Box::new(two) });
        let v = sema.check_expr(&gt).unwrap();
        assert_eq!(v.as_int_constant(), Some(1));
        assert!(sema.records.get(gt.id).unwrap().translated.is_some());
    }
}
