//! ValueModel: the closed set of l-value and r-value kinds Sema and Codegen both
//! operate on (spec §3). A single tagged enum, matched exhaustively at every `load`,
//! `store`, `address_of`, and `convert` site per §9's dispatch design note.

use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // ---- l-values ----
    GlobalVariable {
        name: String,
        ty: Type,
        is_static: bool,
        label: String,
    },
    StaticVariable {
        name: String,
        ty: Type,
        label: String,
    },
    ExternVariable {
        name: String,
        ty: Type,
    },
    /// `frame_offset` is negative: locals live below `fp` (spec invariant 4).
    LocalVariable {
        name: String,
        ty: Type,
        frame_offset: i32,
    },
    /// `frame_offset` is `>= 8`: arguments live above the saved `ra`/`fp` pair.
    Argument {
        name: String,
        ty: Type,
        frame_offset: i32,
    },
    StrLiteral {
        bytes: Vec<u8>,
        /// Original, still-escaped source text (for `.asciz "..."` emission).
        source_form: String,
        /// Set once the literal escapes as a pointer (invariant 5); `None` while it
        /// is only ever consumed by an array initializer.
        rodata_label: Option<String>,
        ty: Type,
    },
    /// "Memory at this address value" (GLOSSARY); synthesized by Codegen's
    /// `address_of`/dereference handling, never produced directly by Sema.
    MemoryAccess {
        addr: Box<Value>,
        ty: Type,
    },

    // ---- r-values ----
    Function {
        name: String,
        ty: Type,
    },
    IntConstant {
        /// Always stored modulo-reduced to `ty`'s range (invariant 2).
        value: i64,
        ty: Type,
    },
    PtrConstant {
        value: u32,
        ty: Type,
    },
    SymConstant {
        name: String,
        ty: Type,
        offset: i64,
    },
    /// A result sitting in the argument registers (`a0`/`a1`), not yet spilled
    /// anywhere.
    TemporaryValue {
        ty: Type,
    },
    /// The address of a local, `fp + offset`, as a Codegen-time constant.
    StackFrameOffset {
        offset: i32,
        ty: Type,
    },
}

impl Value {
    pub fn ty(&self) -> &Type {
        match self {
            Value::GlobalVariable { ty, .. }
            | Value::StaticVariable { ty, .. }
            | Value::ExternVariable { ty, .. }
            | Value::LocalVariable { ty, .. }
            | Value::Argument { ty, .. }
            | Value::StrLiteral { ty, .. }
            | Value::MemoryAccess { ty, .. }
            | Value::Function { ty, .. }
            | Value::IntConstant { ty, .. }
            | Value::PtrConstant { ty, .. }
            | Value::SymConstant { ty, .. }
            | Value::TemporaryValue { ty }
            | Value::StackFrameOffset { ty, .. } => ty,
        }
    }

    pub fn is_lvalue(&self) -> bool {
        matches!(
            self,
            Value::GlobalVariable { .. }
                | Value::StaticVariable { .. }
                | Value::ExternVariable { .. }
                | Value::LocalVariable { .. }
                | Value::Argument { .. }
                | Value::StrLiteral { .. }
                | Value::MemoryAccess { .. }
        )
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Value::IntConstant { .. } | Value::PtrConstant { .. } | Value::SymConstant { .. }
        )
    }

    pub fn as_int_constant(&self) -> Option<i64> {
        match self {
            Value::IntConstant { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// "Stable" (GLOSSARY): evaluation uses no temporaries and is side-effect-free —
    /// identifiers, constants, and (by extension, checked by the caller for `&`/`*`
    /// wrapping) their direct address/dereference.
    pub fn is_stable(&self) -> bool {
        matches!(
            self,
            Value::GlobalVariable { .. }
                | Value::StaticVariable { .. }
                | Value::ExternVariable { .. }
                | Value::LocalVariable { .. }
                | Value::Argument { .. }
                | Value::IntConstant { .. }
                | Value::PtrConstant { .. }
                | Value::SymConstant { .. }
        )
    }

    pub fn with_type(&self, ty: Type) -> Value {
        let mut v = self.clone();
        match &mut v {
            Value::GlobalVariable { ty: t, .. }
            | Value::StaticVariable { ty: t, .. }
            | Value::ExternVariable { ty: t, .. }
            | Value::LocalVariable { ty: t, .. }
            | Value::Argument { ty: t, .. }
            | Value::StrLiteral { ty: t, .. }
            | Value::MemoryAccess { ty: t, .. }
            | Value::Function { ty: t, .. }
            | Value::IntConstant { ty: t, .. }
            | Value::PtrConstant { ty: t, .. }
            | Value::SymConstant { ty: t, .. }
            | Value::TemporaryValue { ty: t }
            | Value::StackFrameOffset { ty: t, .. } => *t = ty,
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin;

    #[test]
    fn int_constant_is_stable_and_not_lvalue() {
        let v = Value::IntConstant { value: 3, ty: builtin::int() };
        assert!(v.is_stable());
        assert!(!v.is_lvalue());
    }

    #[test]
    fn local_variable_is_stable_lvalue() {
        let v = Value::LocalVariable {
            name: "x".into(),
            ty: builtin::int(),
            frame_offset: -4,
        };
        assert!(v.is_stable());
        assert!(v.is_lvalue());
    }

    #[test]
    fn memory_access_is_not_stable() {
        let v = Value::MemoryAccess {
            addr: Box::new(Value::StackFrameOffset { offset: -4, ty: Type::pointer(builtin::int()) }),
            ty: builtin::int(),
        };
        assert!(!v.is_stable());
    }
}
