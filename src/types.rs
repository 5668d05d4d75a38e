//! TypeModel: value types, sizes, alignments, completion, compatibility, and the
//! arithmetic conversion rules (spec §4.1).

use std::rc::Rc;

use crate::error::{warn, CcError, CcResult};

/// One field of a `Struct` type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    /// Byte offset from the start of the struct; computed by `set_fields`.
    pub offset: usize,
}

/// The closed set of C types this compiler understands (spec §3).
///
/// `Array` and `Struct` may be incomplete (`dim`/`fields` missing); `set_dim` and
/// `set_fields` complete them and recompute layout, matching `ArrayType.setDim` /
/// `StructType.setFields` in the original.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Int(IntType),
    Array {
        base: Rc<Type>,
        dim: Option<usize>,
    },
    Struct(Rc<StructType>),
    Pointer(Rc<Type>),
    Function(Rc<FunctionSignature>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntType {
    pub name: &'static str,
    pub size: u32,
    pub unsigned: bool,
    pub align: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub size: Option<usize>,
    pub align: usize,
    pub tail_fill: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub ret: Type,
    pub args: Vec<Type>,
    pub ellipsis: bool,
}

fn round_up(offset: usize, align: usize) -> usize {
    let rem = offset % align;
    if rem == 0 {
        offset
    } else {
        offset + (align - rem)
    }
}

impl Type {
    pub fn pointer(base: Type) -> Type {
        Type::Pointer(Rc::new(base))
    }

    pub fn array(base: Type, dim: Option<usize>) -> Type {
        Type::Array {
            base: Rc::new(base),
            dim,
        }
    }

    /// `None` means incomplete: an array without `dim`, a struct without `fields`, or
    /// `void`.
    pub fn size(&self) -> Option<usize> {
        match self {
            Type::Void => None,
            Type::Int(i) => Some(i.size as usize),
            Type::Pointer(_) => Some(4),
            Type::Function(_) => Some(0),
            Type::Array { base, dim } => dim.map(|d| base.size().unwrap_or(0) * d),
            Type::Struct(s) => s.size,
        }
    }

    pub fn align(&self) -> usize {
        match self {
            Type::Void => 1,
            Type::Int(i) => i.align as usize,
            Type::Pointer(_) | Type::Function(_) => 4,
            Type::Array { base, .. } => base.align(),
            Type::Struct(s) => s.align,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Type::Void => false,
            Type::Array { dim, .. } => dim.is_some(),
            Type::Struct(s) => s.fields.is_some(),
            _ => true,
        }
    }

    pub fn check_complete(&self) -> CcResult<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(CcError::IncompleteType(format!("{self:?}")))
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(base) => Some(base),
            _ => None,
        }
    }

    /// Complete an array's `dim` and recompute its size, mirroring
    /// `ArrayType.setDim`.
    pub fn set_dim(&mut self, dim: usize) {
        if let Type::Array { dim: d, .. } = self {
            *d = Some(dim);
        }
    }

    /// Compute field offsets and struct size/alignment/tail-fill, mirroring
    /// `StructType._layout`: round up to each field's alignment, accumulate, then
    /// round the total up to the struct's own alignment.
    pub fn set_fields(&mut self, mut fields: Vec<Field>) -> CcResult<()> {
        if let Type::Struct(s) = self {
            if fields.is_empty() {
                return Err(CcError::NotImplemented(
                    "structure with no field".to_string(),
                ));
            }

            let mut offset = 0usize;
            let mut align = 1usize;
            let mut seen = std::collections::HashSet::new();
            for field in fields.iter_mut() {
                if !seen.insert(field.name.clone()) {
                    return Err(CcError::Redefined(format!("field {}", field.name)));
                }
                let fa = field.ty.align();
                align = align.max(fa);
                offset = round_up(offset, fa);
                field.offset = offset;
                let fsize = field
                    .ty
                    .size()
                    .ok_or_else(|| CcError::IncompleteType(field.name.clone()))?;
                offset += fsize;
            }
            let padded = round_up(offset, align);
            let new_struct = StructType {
                name: s.name.clone(),
                fields: Some(fields),
                size: Some(padded),
                align,
                tail_fill: padded - offset,
            };
            *self = Type::Struct(Rc::new(new_struct));
        }
        Ok(())
    }

    /// "Cook" a parameter or return type for a function signature: array decays to a
    /// pointer to its element, function decays to a pointer to itself, struct is
    /// rejected (object-level struct rvalues are out of scope, per spec §1 Non-goals).
    pub fn cook_for_signature(&self) -> CcResult<Type> {
        match self {
            Type::Array { base, .. } => Ok(Type::pointer((**base).clone())),
            Type::Function(_) => Ok(Type::pointer(self.clone())),
            Type::Struct(_) => Err(CcError::NotImplemented(
                "struct by value is not supported".to_string(),
            )),
            other => Ok(other.clone()),
        }
    }

    /// Structural compatibility (spec §4.1): same pointer if same base; same array if
    /// same size *and* same base; same struct if same field count with each pair same
    /// name and compatible type; same function if same ellipsis/arity and each
    /// parameter pair compatible, with array-to-pointer and function-to-pointer
    /// relaxations at parameter positions only.
    pub fn is_compatible(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        if !self.is_complete() || !other.is_complete() {
            return false;
        }
        match (self, other) {
            (Type::Pointer(a), Type::Pointer(b)) => a.is_compatible(b),
            (Type::Array { base: a, dim: da }, Type::Array { base: b, dim: db }) => {
                da == db && a.is_compatible(b)
            }
            (Type::Struct(a), Type::Struct(b)) => {
                match (&a.fields, &b.fields) {
                    (Some(fa), Some(fb)) => {
                        fa.len() == fb.len()
                            && fa
                                .iter()
                                .zip(fb.iter())
                                .all(|(x, y)| x.name == y.name && x.ty.is_compatible(&y.ty))
                    }
                    _ => false,
                }
            }
            (Type::Function(a), Type::Function(b)) => {
                if a.ellipsis != b.ellipsis || a.args.len() != b.args.len() {
                    return false;
                }
                if !a.ret.is_compatible(&b.ret) {
                    return false;
                }
                a.args
                    .iter()
                    .zip(b.args.iter())
                    .all(|(x, y)| param_compatible(x, y))
            }
            _ => false,
        }
    }
}

fn param_compatible(a: &Type, b: &Type) -> bool {
    if a.is_compatible(b) {
        return true;
    }
    let array_to_pointer = |t1: &Type, t2: &Type| match (t1, t2) {
        (Type::Array { base, .. }, Type::Pointer(p)) => base.is_compatible(p),
        _ => false,
    };
    let function_to_pointer = |t1: &Type, t2: &Type| match (t1, t2) {
        (Type::Function(_), Type::Pointer(p)) => matches!(p.as_ref(), Type::Function(_)) && t1.is_compatible(p),
        _ => false,
    };
    array_to_pointer(a, b)
        || array_to_pointer(b, a)
        || function_to_pointer(a, b)
        || function_to_pointer(b, a)
}

/// Integer promotion (spec §4.1): any `Int` narrower than 4 bytes widens to signed
/// `int`; everything else, including pointers, is unchanged.
pub fn promote_int(t: &Type) -> Type {
    match t {
        Type::Int(i) if i.size < 4 => builtin::int(),
        other => other.clone(),
    }
}

/// Arithmetic common type (spec §4.1): promote both operands, then if they're the
/// same size the unsigned one wins, otherwise the wider one wins.
pub fn arithmetic_common(a: &Type, b: &Type) -> Type {
    let a = promote_int(a);
    let b = promote_int(b);
    match (&a, &b) {
        (Type::Int(ia), Type::Int(ib)) => {
            if ia.size == ib.size {
                if ia.unsigned {
                    a
                } else {
                    b
                }
            } else if ia.size > ib.size {
                a
            } else {
                b
            }
        }
        _ => a,
    }
}

impl IntType {
    /// Wrap `i` into this type's representable range using two's complement,
    /// warning (not failing) on out-of-range input, mirroring `IntType.convert`.
    pub fn normalize(&self, i: i64) -> i64 {
        let n = self.size * 8;
        if n >= 64 {
            // A 64-bit value's two's-complement bit pattern already fits exactly in
            // `i64` (`1i64 << 64` would overflow the shift); every `i64` is already
            // in range for either signedness, so there is nothing to wrap.
            return i;
        }
        let modulus = 1i64 << n;
        if self.unsigned {
            let maxu = modulus - 1;
            if (0..=maxu).contains(&i) {
                return i;
            }
            if i < 0 && i >= -modulus {
                return i + modulus;
            }
        } else {
            let mins = -(1i64 << (n - 1));
            let maxs = (1i64 << (n - 1)) - 1;
            if (mins..=maxs).contains(&i) {
                return i;
            }
            if i > maxs && i <= (modulus - 1) {
                return i - modulus;
            }
        }
        warn(&format!("out of range for {}: {i}", self.name));
        let mut wrapped = i.rem_euclid(modulus);
        if !self.unsigned && wrapped > (1i64 << (n - 1)) - 1 {
            wrapped -= modulus;
        }
        wrapped
    }
}

/// Built-in numeric types and their aliases, seeded into the built-in scope at
/// start-up (spec GLOSSARY). Kept as functions rather than `static` so each call
/// returns an owned `Type` (the enum holds no interior mutability).
pub mod builtin {
    use super::{IntType, Type};

    fn it(name: &'static str, size: u32, unsigned: bool, align: u32) -> Type {
        Type::Int(IntType {
            name,
            size,
            unsigned,
            align,
        })
    }

    pub fn void() -> Type {
        Type::Void
    }
    pub fn char() -> Type {
        it("char", 1, false, 1)
    }
    pub fn short() -> Type {
        it("short", 2, false, 2)
    }
    pub fn int() -> Type {
        it("int", 4, false, 4)
    }
    pub fn long() -> Type {
        it("long", 4, false, 4)
    }
    pub fn long_long() -> Type {
        it("long long", 8, false, 4)
    }
    pub fn unsigned_char() -> Type {
        it("unsigned char", 1, true, 1)
    }
    pub fn unsigned_short() -> Type {
        it("unsigned short", 2, true, 2)
    }
    pub fn unsigned_int() -> Type {
        it("unsigned int", 4, true, 4)
    }
    pub fn unsigned_long() -> Type {
        it("unsigned long", 4, true, 4)
    }
    pub fn unsigned_long_long() -> Type {
        it("unsigned long long", 8, true, 4)
    }
    /// Every (name, constructor) pair, including aliases, for seeding the built-in
    /// scope (spec GLOSSARY).
    pub fn all_named() -> Vec<(&'static str, Type)> {
        vec![
            ("void", void()),
            ("char", char()),
            ("signed char", char()),
            ("short", short()),
            ("short int", short()),
            ("signed short", short()),
            ("signed short int", short()),
            ("int", int()),
            ("signed int", int()),
            ("long", long()),
            ("long int", long()),
            ("signed long", long()),
            ("signed long int", long()),
            ("ssize_t", long()),
            ("long long", long_long()),
            ("long long int", long_long()),
            ("signed long long", long_long()),
            ("signed long long int", long_long()),
            ("unsigned char", unsigned_char()),
            ("unsigned short", unsigned_short()),
            ("unsigned short int", unsigned_short()),
            ("unsigned int", unsigned_int()),
            ("unsigned", unsigned_int()),
            ("unsigned long", unsigned_long()),
            ("unsigned long int", unsigned_long()),
            ("size_t", unsigned_long()),
            ("unsigned long long", unsigned_long_long()),
            ("unsigned long long int", unsigned_long_long()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_layout_matches_field_gap_rule() {
        let mut s = Type::Struct(Rc::new(StructType {
            name: Some("Foo".into()),
            fields: None,
            size: None,
            align: 1,
            tail_fill: 0,
        }));
        s.set_fields(vec![
            Field {
                name: "i".into(),
                ty: builtin::int(),
                offset: 0,
            },
            Field {
                name: "c".into(),
                ty: builtin::char(),
                offset: 0,
            },
        ])
        .unwrap();
        assert_eq!(s.size(), Some(8));
        assert_eq!(s.align(), 4);
        if let Type::Struct(st) = &s {
            let fields = st.fields.as_ref().unwrap();
            assert_eq!(fields[0].offset, 0);
            assert_eq!(fields[1].offset, 4);
            assert_eq!(st.tail_fill, 3);
        }
    }

    #[test]
    fn empty_struct_is_rejected() {
        let mut s = Type::Struct(Rc::new(StructType {
            name: None,
            fields: None,
            size: None,
            align: 1,
            tail_fill: 0,
        }));
        assert!(matches!(s.set_fields(vec![]), Err(CcError::NotImplemented(_))));
    }

    #[test]
    fn compatibility_is_reflexive_and_symmetric() {
        let a = Type::pointer(builtin::int());
        let b = Type::pointer(builtin::int());
        assert!(a.is_compatible(&a));
        assert!(a.is_compatible(&b) == b.is_compatible(&a));
    }

    #[test]
    fn arithmetic_common_prefers_unsigned_on_tie() {
        let t = arithmetic_common(&builtin::int(), &builtin::unsigned_int());
        assert!(matches!(t, Type::Int(i) if i.unsigned));
    }

    #[test]
    fn promote_int_widens_narrow_types_only() {
        assert!(matches!(promote_int(&builtin::char()), Type::Int(i) if i.size == 4 && !i.unsigned));
        assert!(matches!(promote_int(&builtin::long()), Type::Int(i) if i.size == 4));
    }

    #[test]
    fn normalize_wraps_negative_into_unsigned_char() {
        let ty = match builtin::unsigned_char() {
            Type::Int(i) => i,
            _ => unreachable!(),
        };
        assert_eq!(ty.normalize(-1), 255);
    }
}
