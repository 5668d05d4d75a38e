//! `__builtin_memset`/`__builtin_memcpy` byte-loop emission (spec §4.5.8), materialized
//! once into `.text` only when a translation unit actually used one. Grounded on
//! `codegen.py`'s `_emitBuiltinMemset`/`_emitBuiltinMemcpy`.
//!
//! Calling convention matches every other call site in this crate: arguments pushed
//! right-to-left by the caller, popped here into named registers.

use crate::asm::AsmWriter;

/// `void memset(void *dst, int c, unsigned n)` — `a0` holds `dst` on return, matching
/// a normal function's return-value slot.
pub(crate) fn emit_memset(asm: &mut AsmWriter) {
    asm.text.own_fragment();
    asm.text.emit_label("memset");
    asm.text.emit("push ra");
    asm.text.emit("push fp");
    asm.text.emit("mv fp, sp");
    asm.text.emit("lw a0, fp, 8");
    asm.text.emit("lw a1, fp, 12");
    asm.text.emit("lw a2, fp, 16");
    asm.text.emit("mv a3, a0");
    let loop_label = asm.text.new_local_label("memset.loop");
    let end_label = asm.text.new_local_label("memset.end");
    asm.text.emit_label(&loop_label);
    asm.text.emit(&format!("beqz a2, {end_label}"));
    asm.text.emit("sb a1, a3, 0");
    asm.text.emit("addi a3, a3, 1");
    asm.text.emit("addi a2, a2, -1");
    asm.text.emit(&format!("j {loop_label}"));
    asm.text.emit_label(&end_label);
    asm.text.emit("mv sp, fp");
    asm.text.emit("pop fp");
    asm.text.emit("pop ra");
    asm.text.emit("ret");
}

/// `void *memcpy(void *dst, const void *src, unsigned n)`.
pub(crate) fn emit_memcpy(asm: &mut AsmWriter) {
    asm.text.own_fragment();
    asm.text.emit_label("memcpy");
    asm.text.emit("push ra");
    asm.text.emit("push fp");
    asm.text.emit("mv fp, sp");
    asm.text.emit("lw a0, fp, 8");
    asm.text.emit("lw a1, fp, 12");
    asm.text.emit("lw a2, fp, 16");
    asm.text.emit("mv a3, a0");
    let loop_label = asm.text.new_local_label("memcpy.loop");
    let end_label = asm.text.new_local_label("memcpy.end");
    asm.text.emit_label(&loop_label);
    asm.text.emit(&format!("beqz a2, {end_label}"));
    asm.text.emit("lb a4, a1, 0");
    asm.text.emit("sb a4, a3, 0");
    asm.text.emit("addi a1, a1, 1");
    asm.text.emit("addi a3, a3, 1");
    asm.text.emit("addi a2, a2, -1");
    asm.text.emit(&format!("j {loop_label}"));
    asm.text.emit_label(&end_label);
    asm.text.emit("mv sp, fp");
    asm.text.emit("pop fp");
    asm.text.emit("pop ra");
    asm.text.emit("ret");
}
