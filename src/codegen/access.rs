//! Expression evaluation and the load/store/address-of/push/pop primitives of spec
//! §4.5.2-§4.5.5. Grounded on `codegen.py`'s `Asm.load`/`Asm.store`/`Asm.push`/
//! `Asm.pop`/`addressOf`.

use crate::ast::{BinaryOp, Expr, ExprNode};
use crate::codegen::Codegen;
use crate::error::{CcError, CcResult};
use crate::types::Type;
use crate::value::Value;

impl<'a> Codegen<'a> {
    /// Evaluate `e`, leaving the result in `a0` (and `a1` for an 8-byte value).
    /// Returns the [`Value`] Sema recorded for it, for callers that need its type.
    pub(crate) fn gen_expr(&mut self, e: &ExprNode) -> CcResult<Value> {
        let v = self.value_of(e.id)?;
        match &e.kind {
            Expr::Assign { lhs, rhs } => {
                self.gen_expr(self.resolved(rhs))?;
                let target = self.value_of(self.resolved(lhs).id)?;
                self.store(&target)?;
                Ok(v)
            }
            Expr::Comma(items) => {
                let mut last = v.clone();
                for item in items {
                    last = self.gen_expr(self.resolved(item))?;
                }
                Ok(last)
            }
            Expr::Binary { op, lhs, rhs } => self.gen_binary(*op, self.resolved(lhs), self.resolved(rhs), &v),
            Expr::Unary { op, expr } => self.gen_unary(*op, self.resolved(expr), &v),
            Expr::Call { callee, args } => self.gen_call(self.resolved(callee), args, &v),
            Expr::Cast { expr, .. } => {
                self.gen_expr(self.resolved(expr))?;
                self.load(&v)
            }
            Expr::TypedCast { expr, .. } => {
                self.gen_expr(self.resolved(expr))?;
                self.load(&v)
            }
            Expr::AddrOf(inner) => {
                let inner_v = self.value_of(self.resolved(inner).id)?;
                let addr = self.address_of(&inner_v)?;
                self.load(&addr)?;
                Ok(v)
            }
            Expr::Deref(inner) => {
                self.gen_expr(self.resolved(inner))?;
                self.load(&v)
            }
            Expr::Ternary { cond, t, f } => self.gen_ternary(self.resolved(cond), self.resolved(t), self.resolved(f), &v),
            _ => {
                self.load(&v)?;
                Ok(v)
            }
        }
    }

    fn gen_ternary(&mut self, cond: &ExprNode, t: &ExprNode, f: &ExprNode, result: &Value) -> CcResult<Value> {
        let false_label = self.asm.text.new_local_label("ternary.false");
        let end_label = self.asm.text.new_local_label("ternary.end");
        self.emit_cond(cond, &false_label)?;
        self.gen_expr(t)?;
        self.asm.text.emit(&format!("j {end_label}"));
        self.asm.text.emit_label(&false_label);
        self.gen_expr(f)?;
        self.asm.text.emit_label(&end_label);
        Ok(result.clone())
    }

    fn gen_unary(&mut self, op: crate::ast::UnaryOp, expr: &ExprNode, result: &Value) -> CcResult<Value> {
        use crate::ast::UnaryOp;
        let v = self.gen_expr(expr)?;
        let wide = crate::codegen::is_wide_type(v.ty());
        match op {
            UnaryOp::Neg => {
                // Sema rewrites a 64-bit operand to `~x + 1` before Codegen ever
                // sees it (spec §4.4.4); this path is 32-bit only.
                self.asm.text.emit("sub a0, zero, a0");
            }
            UnaryOp::Not => {
                if wide {
                    self.asm.text.emit("xori a1, a1, -1");
                }
                self.asm.text.emit("xori a0, a0, -1");
            }
            UnaryOp::LogicalNot => {
                if wide {
                    self.asm.text.emit("or a0, a0, a1");
                }
                self.asm.text.emit("seqz a0, a0");
            }
        }
        Ok(result.clone())
    }

    fn gen_call(&mut self, callee: &ExprNode, args: &[ExprNode], result: &Value) -> CcResult<Value> {
        let mut pushed = 0usize;
        for arg in args.iter().rev() {
            let av = self.gen_expr(self.resolved(arg))?;
            self.push(&av)?;
            pushed += round_up4(av.ty().size().unwrap_or(4));
        }
        match &callee.kind {
            Expr::Ident(name) if matches!(self.value_of(callee.id), Ok(Value::Function { .. })) => {
                match name.as_str() {
                    "memset" => self.needs_memset = true,
                    "memcpy" => self.needs_memcpy = true,
                    _ => {}
                }
                self.asm.text.emit(&format!("call {name}"));
            }
            _ => {
                self.gen_expr(callee)?;
                self.asm.text.emit("jalr a0");
            }
        }
        if pushed > 0 {
            self.asm.text.emit(&format!("addi sp, sp, {pushed}"));
        }
        Ok(result.clone())
    }

    pub(crate) fn load(&mut self, v: &Value) -> CcResult<Value> {
        match v {
            Value::IntConstant { value, ty } => {
                if ty.size() == Some(8) {
                    let low = (*value & 0xFFFF_FFFF) as i32;
                    let high = (*value >> 32) as i32;
                    self.asm.text.emit(&format!("li a0, {low}"));
                    self.asm.text.emit(&format!("li a1, {high}"));
                } else {
                    self.asm.text.emit(&format!("li a0, {value}"));
                }
            }
            Value::PtrConstant { value, .. } => {
                self.asm.text.emit(&format!("li a0, {value}"));
            }
            Value::SymConstant { name, offset, .. } => {
                if *offset == 0 {
                    self.asm.text.emit(&format!("li a0, ${name}"));
                } else {
                    self.asm.text.emit(&format!("li a0, +(${name} {offset})"));
                }
            }
            Value::StackFrameOffset { offset, .. } => {
                self.asm.text.emit(&format!("addi a0, fp, {offset}"));
            }
            Value::Function { name, .. } => {
                self.asm.text.emit(&format!("li a0, ${name}"));
            }
            Value::TemporaryValue { .. } => {}
            Value::GlobalVariable { .. } | Value::StaticVariable { .. } | Value::ExternVariable { .. } => {
                let addr = self.address_of(v)?;
                let mem = Value::MemoryAccess { addr: Box::new(addr), ty: v.ty().clone() };
                self.load(&mem)?;
            }
            Value::LocalVariable { .. } | Value::Argument { .. } => {
                let addr = self.address_of(v)?;
                let mem = Value::MemoryAccess { addr: Box::new(addr), ty: v.ty().clone() };
                self.load(&mem)?;
            }
            Value::StrLiteral { rodata_label, .. } => {
                let label = rodata_label
                    .clone()
                    .ok_or_else(|| CcError::InvalidOperand("string literal has no pool label".into()))?;
                self.asm.text.emit(&format!("li a0, ${label}"));
            }
            Value::MemoryAccess { addr, ty } => self.load_memory(addr, ty)?,
        }
        Ok(v.clone())
    }

    fn load_memory(&mut self, addr: &Value, ty: &Type) -> CcResult<()> {
        if ty.size() == Some(8) {
            return self.load_memory64(addr);
        }
        let (op, _) = load_opcode(ty);
        match addr {
            Value::SymConstant { name, offset, .. } => {
                if *offset == 0 {
                    self.asm.text.emit(&format!("{op} a0, +(${name} 0)"));
                } else {
                    self.asm.text.emit(&format!("{op} a0, +(${name} {offset})"));
                }
            }
            Value::StackFrameOffset { offset, .. } => {
                self.asm.text.emit(&format!("{op} a0, fp, {offset}"));
            }
            Value::PtrConstant { value, .. } => {
                self.asm.text.emit(&format!("{op} a0, {value}"));
            }
            other => {
                self.load(other)?;
                self.asm.text.emit(&format!("{op} a0, a0, 0"));
            }
        }
        Ok(())
    }

    /// `lw`/`lw` pair, low word then high word, for an 8-byte value (spec §4.5.2).
    fn load_memory64(&mut self, addr: &Value) -> CcResult<()> {
        match addr {
            Value::SymConstant { name, offset, .. } => {
                self.asm.text.emit(&format!("lw a0, +(${name} {offset})"));
                self.asm.text.emit(&format!("lw a1, +(${name} {})", offset + 4));
            }
            Value::StackFrameOffset { offset, .. } => {
                self.asm.text.emit(&format!("lw a0, fp, {offset}"));
                self.asm.text.emit(&format!("lw a1, fp, {}", offset + 4));
            }
            Value::PtrConstant { value, .. } => {
                self.asm.text.emit(&format!("lw a0, {value}"));
                self.asm.text.emit(&format!("lw a1, {}", value + 4));
            }
            other => {
                self.load(other)?;
                self.asm.text.emit("lw a1, a0, 4");
                self.asm.text.emit("lw a0, a0, 0");
            }
        }
        Ok(())
    }

    /// Store whatever is currently in `a0`/`a1` into `target`.
    pub(crate) fn store(&mut self, target: &Value) -> CcResult<()> {
        match target {
            Value::GlobalVariable { .. } | Value::StaticVariable { .. } | Value::ExternVariable { .. }
            | Value::LocalVariable { .. } | Value::Argument { .. } => {
                let addr = self.address_of(target)?;
                self.store_memory(&addr, target.ty())
            }
            Value::MemoryAccess { addr, ty } => self.store_memory(addr, ty),
            _ => Err(CcError::InvalidOperand("assignment target is not storable".into())),
        }
    }

    fn store_memory(&mut self, addr: &Value, ty: &Type) -> CcResult<()> {
        if ty.size() == Some(8) {
            return self.store_memory64(addr);
        }
        let op = store_opcode(ty);
        match addr {
            Value::SymConstant { name, offset, .. } => {
                if *offset == 0 {
                    self.asm.text.emit(&format!("{op} a0, +(${name} 0)"));
                } else {
                    self.asm.text.emit(&format!("{op} a0, +(${name} {offset})"));
                }
            }
            Value::StackFrameOffset { offset, .. } => {
                self.asm.text.emit(&format!("{op} a0, fp, {offset}"));
            }
            other => {
                self.asm.text.emit("mv a2, a0");
                self.load(other)?;
                self.asm.text.emit(&format!("{op} a2, a0, 0"));
            }
        }
        Ok(())
    }

    /// `sw`/`sw` pair, low word then high word, for an 8-byte value (spec §4.5.3).
    /// An indirect target relocates the value out of `a0`/`a1` first, the same way
    /// the 32-bit path frees `a0` into `a2` before recursing to load the address.
    fn store_memory64(&mut self, addr: &Value) -> CcResult<()> {
        match addr {
            Value::SymConstant { name, offset, .. } => {
                self.asm.text.emit(&format!("sw a0, +(${name} {offset})"));
                self.asm.text.emit(&format!("sw a1, +(${name} {})", offset + 4));
            }
            Value::StackFrameOffset { offset, .. } => {
                self.asm.text.emit(&format!("sw a0, fp, {offset}"));
                self.asm.text.emit(&format!("sw a1, fp, {}", offset + 4));
            }
            other => {
                self.asm.text.emit("mv a2, a0");
                self.asm.text.emit("mv a3, a1");
                self.load(other)?;
                self.asm.text.emit("sw a2, a0, 0");
                self.asm.text.emit("sw a3, a0, 4");
            }
        }
        Ok(())
    }

    /// The Constant-family [`Value`] that addresses `v` (spec §4.5.5).
    pub(crate) fn address_of(&mut self, v: &Value) -> CcResult<Value> {
        let ptr_ty = Type::pointer(v.ty().clone());
        Ok(match v {
            Value::GlobalVariable { label, .. } | Value::StaticVariable { label, .. } => {
                Value::SymConstant { name: label.clone(), ty: ptr_ty, offset: 0 }
            }
            Value::ExternVariable { name, .. } => Value::SymConstant { name: name.clone(), ty: ptr_ty, offset: 0 },
            Value::LocalVariable { frame_offset, .. } | Value::Argument { frame_offset, .. } => {
                Value::StackFrameOffset { offset: *frame_offset, ty: ptr_ty }
            }
            Value::StrLiteral { rodata_label: Some(label), .. } => {
                Value::SymConstant { name: label.clone(), ty: ptr_ty, offset: 0 }
            }
            Value::MemoryAccess { addr, .. } => addr.with_type(ptr_ty),
            _ => return Err(CcError::InvalidOperand("value has no address".into())),
        })
    }

    pub(crate) fn push(&mut self, v: &Value) -> CcResult<()> {
        self.load(v)?;
        if v.ty().size() == Some(8) {
            self.asm.text.emit("push a1");
        }
        self.asm.text.emit("push a0");
        Ok(())
    }

    /// `pop reg` (low half), then `pop <reg's high pair>` for an 8-byte value, in
    /// the order `push` put them on the stack (spec §4.5.4).
    pub(crate) fn pop_into(&mut self, reg: &str, ty: &Type) -> CcResult<()> {
        self.asm.text.emit(&format!("pop {reg}"));
        if ty.size() == Some(8) {
            self.asm.text.emit(&format!("pop {}", hi_pair(reg)));
        }
        Ok(())
    }
}

/// The paired high-half register for a low-half register used as an 8-byte pop
/// target; the only pairs Codegen ever pops into (spec §4.5.1).
fn hi_pair(reg: &str) -> &'static str {
    match reg {
        "a0" => "a1",
        "a2" => "a3",
        _ => unreachable!("pop_into called for an 8-byte value with an unpaired register {reg}"),
    }
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}

fn load_opcode(ty: &Type) -> (&'static str, bool) {
    match ty {
        Type::Int(it) => match (it.size, it.unsigned) {
            (1, true) => ("lbu", true),
            (1, false) => ("lb", false),
            (2, true) => ("lhu", true),
            (2, false) => ("lh", false),
            _ => ("lw", false),
        },
        _ => ("lw", false),
    }
}

fn store_opcode(ty: &Type) -> &'static str {
    match ty.size() {
        Some(1) => "sb",
        Some(2) => "sh",
        _ => "sw",
    }
}
