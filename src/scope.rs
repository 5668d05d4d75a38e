//! ScopeTable: nested lexical scopes with a parent-pointer chain (spec §4.2).
//!
//! Grounded on `cc.py`'s `Scope`/`GlobalScope`/`LocalScope`, but scope links use
//! `Rc<RefCell<..>>` rather than a plain parent field: per spec §9, an AST annotation
//! captured while a scope is open (a `LocalVariable` referenced by a `load`) may be
//! read again after that scope is popped from the active stack, so a popped scope's
//! symbols must stay reachable through the `Rc` rather than being dropped with it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{CcError, CcResult};
use crate::types::{builtin, Type};
use crate::value::Value;

/// Either a type or a value may be bound to a name in a scope (functions and
/// variables are both `Value`s; `struct Foo` and typedef names are `Type`s).
#[derive(Debug, Clone)]
pub enum Symbol {
    Type(Type),
    Value(Value),
}

struct ScopeData {
    symbols: HashMap<String, Symbol>,
    parent: Option<Scope>,
    /// Running allocation cursor for locals in this scope, in bytes (spec §4.4.3):
    /// `offset += round_up(size, 4)` per local declared, the local's `frame_offset`
    /// is `-offset`.
    frame_offset: usize,
}

/// A scope handle; clones share the underlying data.
#[derive(Clone)]
pub struct Scope(Rc<RefCell<ScopeData>>);

impl Scope {
    fn new(parent: Option<Scope>, frame_offset: usize) -> Scope {
        Scope(Rc::new(RefCell::new(ScopeData {
            symbols: HashMap::new(),
            parent,
            frame_offset,
        })))
    }

    /// The process-wide built-in scope, seeded once with the numeric types
    /// (GLOSSARY) and never modified afterward.
    pub fn new_builtin() -> Scope {
        let scope = Scope::new(None, 0);
        for (name, ty) in builtin::all_named() {
            // Aliases collide by construction (e.g. "int" == "signed int" maps twice
            // to the same underlying type) so redefinition is expected and ignored
            // here, unlike ordinary user code.
            scope
                .0
                .borrow_mut()
                .symbols
                .entry(name.to_string())
                .or_insert(Symbol::Type(ty));
        }
        scope
    }

    pub fn new_global(builtin: &Scope) -> Scope {
        let scope = Scope::new(Some(builtin.clone()), 0);
        seed_runtime_builtins(&scope);
        scope
    }

    pub fn new_child(parent: &Scope) -> Scope {
        let offset = parent.0.borrow().frame_offset;
        Scope::new(Some(parent.clone()), offset)
    }

    pub fn add(&self, name: &str, sym: Symbol) -> CcResult<()> {
        let mut data = self.0.borrow_mut();
        if data.symbols.contains_key(name) {
            return Err(CcError::Redefined(name.to_string()));
        }
        data.symbols.insert(name.to_string(), sym);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<Symbol> {
        let data = self.0.borrow();
        if let Some(sym) = data.symbols.get(name) {
            return Some(sym.clone());
        }
        data.parent.as_ref().and_then(|p| p.find(name))
    }

    pub fn get(&self, name: &str) -> CcResult<Symbol> {
        self.find(name)
            .ok_or_else(|| CcError::Undefined(name.to_string()))
    }

    pub fn get_type(&self, name: &str) -> CcResult<Type> {
        match self.get(name)? {
            Symbol::Type(t) => Ok(t),
            _ => Err(CcError::Undefined(format!("{name} is not a type"))),
        }
    }

    pub fn get_value(&self, name: &str) -> CcResult<Value> {
        match self.get(name)? {
            Symbol::Value(v) => Ok(v),
            _ => Err(CcError::Undefined(format!("{name} is not a variable or function"))),
        }
    }

    /// Allocate frame space for a local of `size` bytes, returning its (negative)
    /// offset; updates this scope's running cursor.
    pub fn alloc_local(&self, size: usize) -> i32 {
        let mut data = self.0.borrow_mut();
        let padded = round_up(size, 4);
        data.frame_offset += padded;
        -(data.frame_offset as i32)
    }

    pub fn current_frame_offset(&self) -> usize {
        self.0.borrow().frame_offset
    }
}

/// Pre-declare `memset`/`memcpy` as ordinary functions so Sema's aggregate zero-fill
/// lowering (spec §4.4.3) can call them like any other declared function, instead of
/// needing a special "builtin call" AST shape — Codegen still materializes their
/// bodies lazily, only when one is actually referenced.
fn seed_runtime_builtins(scope: &Scope) {
    use crate::types::FunctionSignature;
    let void_ptr = Type::pointer(builtin::void());
    let memset_ty = Type::Function(Rc::new(FunctionSignature {
        ret: void_ptr.clone(),
        args: vec![void_ptr.clone(), builtin::int(), builtin::unsigned_int()],
        ellipsis: false,
    }));
    let memcpy_ty = Type::Function(Rc::new(FunctionSignature {
        ret: void_ptr.clone(),
        args: vec![void_ptr.clone(), void_ptr, builtin::unsigned_int()],
        ellipsis: false,
    }));
    let _ = scope.add("memset", Symbol::Value(Value::Function { name: "memset".into(), ty: memset_ty }));
    let _ = scope.add("memcpy", Symbol::Value(Value::Function { name: "memcpy".into(), ty: memcpy_ty }));
}

fn round_up(n: usize, align: usize) -> usize {
    let rem = n % align;
    if rem == 0 {
        n
    } else {
        n + (align - rem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin;

    #[test]
    fn lookup_walks_up_the_chain() {
        let builtin_scope = Scope::new_builtin();
        let global = Scope::new_global(&builtin_scope);
        assert!(global.get_type("int").is_ok());
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let builtin_scope = Scope::new_builtin();
        let global = Scope::new_global(&builtin_scope);
        global
            .add("x", Symbol::Value(Value::GlobalVariable {
                name: "x".into(),
                ty: builtin::int(),
                is_static: false,
                label: "x".into(),
            }))
            .unwrap();
        let err = global.add(
            "x",
            Symbol::Value(Value::GlobalVariable {
                name: "x".into(),
                ty: builtin::int(),
                is_static: false,
                label: "x".into(),
            }),
        );
        assert!(matches!(err, Err(CcError::Redefined(_))));
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        let builtin_scope = Scope::new_builtin();
        let global = Scope::new_global(&builtin_scope);
        global
            .add("x", Symbol::Value(Value::GlobalVariable {
                name: "x".into(),
                ty: builtin::int(),
                is_static: false,
                label: "x".into(),
            }))
            .unwrap();
        let inner = Scope::new_child(&global);
        inner
            .add("x", Symbol::Value(Value::LocalVariable {
                name: "x".into(),
                ty: builtin::int(),
                frame_offset: -4,
            }))
            .unwrap();
        assert!(matches!(inner.get_value("x"), Ok(Value::LocalVariable { .. })));
    }

    #[test]
    fn frame_offsets_accumulate_by_four_byte_multiples() {
        let builtin_scope = Scope::new_builtin();
        let global = Scope::new_global(&builtin_scope);
        let fscope = Scope::new_child(&global);
        let o1 = fscope.alloc_local(1); // char, padded to 4
        let o2 = fscope.alloc_local(4); // int
        assert_eq!(o1, -4);
        assert_eq!(o2, -8);
        assert_eq!(fscope.current_frame_offset(), 8);
    }
}
