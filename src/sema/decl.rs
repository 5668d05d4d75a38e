//! Declarations, type resolution, and initializer validation (spec §4.4.3).
//! Grounded on `cc.py`'s declaration visitor and `codegen.py`'s initializer
//! lowering (zero-fill then element-wise store for locals; constant folding for
//! globals).

use std::rc::Rc;

use crate::ast::{self, Decl, DeclNode, Initializer, Storage, TypeNode, TypeSpec};
use crate::error::{CcError, CcResult};
use crate::scope::{Scope, Symbol};
use crate::types::{Field, StructType, Type};
use crate::value::Value;

impl crate::sema::Sema {
    pub fn resolve_type(&mut self, tn: &TypeNode) -> CcResult<Type> {
        self.path.push(tn.id);
        let result = self.resolve_type_inner(&tn.kind);
        self.path.pop();
        result
    }

    fn resolve_type_inner(&mut self, spec: &TypeSpec) -> CcResult<Type> {
        match spec {
            TypeSpec::Named(name) => self.scope().get_type(name),
            TypeSpec::Pointer(inner) => Ok(Type::pointer(self.resolve_type(inner)?)),
            TypeSpec::Array(inner, size) => {
                let base = self.resolve_type(inner)?;
                let mut ty = Type::array(base, None);
                if let Some(expr) = size {
                    let v = self.check_expr(expr)?;
                    let dim = v.as_int_constant().ok_or_else(|| {
                        CcError::NonConstantInitializer("array dimension must be a constant".into())
                    })?;
                    ty.set_dim(dim as usize);
                }
                Ok(ty)
            }
            TypeSpec::Struct { name, fields } => self.resolve_struct(name.as_deref(), fields.as_deref()),
            TypeSpec::Function { ret, params, ellipsis } => {
                let ret_ty = self.resolve_type(ret)?.cook_for_signature()?;
                let mut args = Vec::new();
                for (_, pty) in params {
                    args.push(self.resolve_type(pty)?.cook_for_signature()?);
                }
                Ok(Type::Function(Rc::new(crate::types::FunctionSignature {
                    ret: ret_ty,
                    args,
                    ellipsis: *ellipsis,
                })))
            }
        }
    }

    fn resolve_struct(&mut self, name: Option<&str>, fields: Option<&[(String, TypeNode)]>) -> CcResult<Type> {
        match fields {
            None => match name {
                Some(n) => self.scope().get_type(&format!("struct {n}")),
                None => Err(CcError::IncompleteType("anonymous struct forward reference".into())),
            },
            Some(fields) => {
                let mut built = Vec::new();
                for (fname, fty) in fields {
                    built.push(Field { name: fname.clone(), ty: self.resolve_type(fty)?, offset: 0 });
                }
                let mut ty = Type::Struct(Rc::new(StructType {
                    name: name.map(|s| s.to_string()),
                    fields: None,
                    size: None,
                    align: 1,
                    tail_fill: 0,
                }));
                ty.set_fields(built)?;
                if let Some(n) = name {
                    let key = format!("struct {n}");
                    // Re-declaring the same tag with the same shape is fine; a
                    // conflicting shape is a redefinition.
                    if self.scope().find(&key).is_none() {
                        self.scope().add(&key, Symbol::Type(ty.clone()))?;
                    }
                }
                Ok(ty)
            }
        }
    }

    pub fn check_global_decl(&mut self, d: &DeclNode) -> CcResult<()> {
        self.path.push(d.id);
        let result = self.check_global_decl_inner(&d.kind);
        self.path.pop();
        result
    }

    fn check_global_decl_inner(&mut self, d: &Decl) -> CcResult<()> {
        let ty = self.resolve_type(&d.ty)?;
        let Some(name) = &d.name else { return Ok(()) };

        if d.storage == Storage::Typedef {
            return self.global.add(name, Symbol::Type(ty));
        }
        if let Type::Function(_) = &ty {
            let value = Value::Function { name: name.clone(), ty };
            if self.global.find(name).is_none() {
                self.global.add(name, Symbol::Value(value))?;
            }
            return Ok(());
        }

        let mut ty = ty;
        if let Some(init) = &d.init {
            self.complete_array_dim_from_init(&mut ty, init)?;
            self.check_const_initializer(&ty, init)?;
        } else {
            ty.check_complete()?;
        }

        let value = match d.storage {
            Storage::Extern => Value::ExternVariable { name: name.clone(), ty: ty.clone() },
            Storage::Static => {
                let label = format!("{name}.static");
                Value::StaticVariable { name: name.clone(), ty: ty.clone(), label }
            }
            _ => Value::GlobalVariable { name: name.clone(), ty: ty.clone(), is_static: false, label: name.clone() },
        };

        self.global.add(name, Symbol::Value(value))
    }

    /// Validate a global/static initializer, requiring everything to fold to a
    /// constant (spec §4.4.3): `NonConstantInitializer` otherwise.
    fn check_const_initializer(&mut self, ty: &Type, init: &Initializer) -> CcResult<()> {
        match (ty, init) {
            (Type::Array { base, .. }, Initializer::Expr(e)) if base.is_int() && base.size() == Some(1) => {
                let v = self.check_expr(e)?;
                match v {
                    Value::StrLiteral { .. } => Ok(()),
                    _ => Err(CcError::InvalidInitializer("expected a string literal".into())),
                }
            }
            (_, Initializer::Expr(e)) => {
                let v = self.check_expr(e)?;
                let v = self.convert(ty, v)?;
                if !v.is_constant() {
                    return Err(CcError::NonConstantInitializer(format!("{ty:?}")));
                }
                Ok(())
            }
            (Type::Array { base, dim }, Initializer::List(items)) => {
                if let Some(d) = dim {
                    if items.len() > *d {
                        return Err(CcError::InvalidInitializer("too many initializers".into()));
                    }
                }
                for item in items {
                    self.check_const_initializer(base, item)?;
                }
                Ok(())
            }
            (Type::Struct(st), Initializer::List(items)) => {
                let fields = st.fields.as_ref().ok_or(CcError::IncompleteType("struct".into()))?;
                if items.len() > fields.len() {
                    return Err(CcError::InvalidInitializer("too many initializers".into()));
                }
                for (item, field) in items.iter().zip(fields.iter()) {
                    self.check_const_initializer(&field.ty, item)?;
                }
                Ok(())
            }
            _ => Err(CcError::InvalidInitializer(format!("cannot initialize {ty:?} with a list"))),
        }
    }

    /// Complete an open array dimension (`int a[]`, `char s[]`) from its
    /// initializer, before anything relies on `ty.size()`/`check_complete()`
    /// (spec §4.4.3): a list initializer's length, or a string literal's byte
    /// count including its trailing NUL.
    fn complete_array_dim_from_init(&mut self, ty: &mut Type, init: &Initializer) -> CcResult<()> {
        let Type::Array { dim, base } = ty else { return Ok(()) };
        if dim.is_some() {
            return Ok(());
        }
        match init {
            Initializer::List(items) => *dim = Some(items.len()),
            Initializer::Expr(e) if base.is_int() && base.size() == Some(1) => {
                if let Value::StrLiteral { bytes, .. } = self.check_expr(e)? {
                    *dim = Some(bytes.len());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// A local `Decl` statement (spec §4.4.3): frame space is reserved for each
    /// name, and any initializer is lowered into a sequence the caller (`stmt.rs`)
    /// turns into assignment statements.
    pub fn check_local_decl(&mut self, d: &DeclNode) -> CcResult<Vec<ast::StmtNode>> {
        self.path.push(d.id);
        let result = self.check_local_decl_inner(d);
        self.path.pop();
        result
    }

    fn check_local_decl_inner(&mut self, d: &DeclNode) -> CcResult<Vec<ast::StmtNode>> {
        let ty = self.resolve_type(&d.kind.ty)?;
        let Some(name) = &d.kind.name else { return Ok(Vec::new()) };

        if d.kind.storage == Storage::Typedef {
            self.scope().add(name, Symbol::Type(ty))?;
            return Ok(Vec::new());
        }
        if d.kind.storage == Storage::Extern {
            self.scope().add(name, Symbol::Value(Value::ExternVariable { name: name.clone(), ty }))?;
            return Ok(Vec::new());
        }
        if d.kind.storage == Storage::Static {
            let mut ty = ty;
            let label = format!("{name}.static.{}", d.id.0);
            if let Some(init) = &d.kind.init {
                self.complete_array_dim_from_init(&mut ty, init)?;
                self.check_const_initializer(&ty, init)?;
            } else {
                ty.check_complete()?;
            }
            self.scope().add(name, Symbol::Value(Value::StaticVariable { name: name.clone(), ty, label }))?;
            return Ok(Vec::new());
        }

        let mut ty = ty;
        if let Some(init) = &d.kind.init {
            self.complete_array_dim_from_init(&mut ty, init)?;
        }

        ty.check_complete()?;
        let size = ty.size().unwrap();
        let offset = self.scope().alloc_local(size.max(1));
        self.func_mut().note_frame_offset((-offset) as usize);
        self.scope().add(name, Symbol::Value(Value::LocalVariable { name: name.clone(), ty: ty.clone(), frame_offset: offset }))?;

        let Some(init) = &d.kind.init else { return Ok(Vec::new()) };
        let base = self.synth(ast::Expr::Ident(name.clone()));
        let mut stmts = Vec::new();
        self.build_init_stmts(&base, &ty, init, &mut stmts)?;
        Ok(stmts)
    }

    /// Splice `init` into a sequence of plain assignment/memset statements against
    /// `base` (an lvalue expression for the declared object), recursing through
    /// nested array/struct initializer lists via `Index`/`Member` the same way
    /// source-level element access would (spec §4.4.3). A short array or struct
    /// initializer zero-fills the remaining elements via the `memset` builtin.
    fn build_init_stmts(&mut self, base: &ast::ExprNode, ty: &Type, init: &Initializer, out: &mut Vec<ast::StmtNode>) -> CcResult<()> {
        match (ty, init) {
            (_, Initializer::Expr(e)) => {
                let assign = self.synth(ast::Expr::Assign { lhs: Box::new(base.clone()), rhs: e.clone() });
                out.push(self.synth_stmt(ast::Stmt::Expr(Some(assign))));
                Ok(())
            }
            (Type::Array { base: elem_ty, dim }, Initializer::List(items)) => {
                let elem_ty = (**elem_ty).clone();
                for (i, item) in items.iter().enumerate() {
                    let idx = self.synth(ast::Expr::IntLiteral { value: i as i64, suffix_unsigned: false, suffix_long: false });
                    let elem = self.synth(ast::Expr::Index { base: Box::new(base.clone()), index: Box::new(idx) });
                    self.build_init_stmts(&elem, &elem_ty, item, out)?;
                }
                if let Some(d) = dim {
                    if *d > items.len() {
                        let idx = self.synth(ast::Expr::IntLiteral {
                            value: items.len() as i64,
                            suffix_unsigned: false,
                            suffix_long: false,
                        });
                        let elem = self.synth(ast::Expr::Index { base: Box::new(base.clone()), index: Box::new(idx) });
                        let byte_count = (*d - items.len()) * elem_ty.size().unwrap_or(1);
                        self.emit_zero_fill_tail(&elem, byte_count, out)?;
                    }
                }
                Ok(())
            }
            (Type::Struct(st), Initializer::List(items)) => {
                let fields = st.fields.clone().ok_or_else(|| CcError::IncompleteType("struct".into()))?;
                for (item, field) in items.iter().zip(fields.iter()) {
                    let member = self.synth(ast::Expr::Member { base: Box::new(base.clone()), field: field.name.clone(), arrow: false });
                    self.build_init_stmts(&member, &field.ty, item, out)?;
                }
                if let (Some(size), Some(first_unfilled)) = (st.size, fields.get(items.len())) {
                    let byte_count = size.saturating_sub(first_unfilled.offset);
                    if byte_count > 0 {
                        let member = self.synth(ast::Expr::Member {
                            base: Box::new(base.clone()),
                            field: first_unfilled.name.clone(),
                            arrow: false,
                        });
                        self.emit_zero_fill_tail(&member, byte_count, out)?;
                    }
                }
                Ok(())
            }
            _ => Err(CcError::InvalidInitializer(format!("cannot initialize {ty:?} with a list"))),
        }
    }

    /// `memset(&start, 0, byte_count)`, for an array or struct initializer shorter
    /// than its declared dimension/field count.
    fn emit_zero_fill_tail(&mut self, start: &ast::ExprNode, byte_count: usize, out: &mut Vec<ast::StmtNode>) -> CcResult<()> {
        let addr = self.synth(ast::Expr::AddrOf(Box::new(start.clone())));
        let zero = self.synth(ast::Expr::IntLiteral { value: 0, suffix_unsigned: false, suffix_long: false });
        let count = self.synth(ast::Expr::IntLiteral { value: byte_count as i64, suffix_unsigned: true, suffix_long: false });
        let callee = self.synth(ast::Expr::Ident("memset".to_string()));
        let call = self.synth(ast::Expr::Call { callee: Box::new(callee), args: vec![addr, zero, count] });
        out.push(self.synth_stmt(ast::Stmt::Expr(Some(call))));
        Ok(())
    }

    pub fn check_function_def(&mut self, f: &ast::FunctionDef) -> CcResult<()> {
        let ret_ty = self.resolve_type(&f.ret)?.cook_for_signature()?;
        let mut param_types = Vec::new();
        for (_, pty) in &f.params {
            param_types.push(self.resolve_type(pty)?.cook_for_signature()?);
        }
        let sig_ty = Type::Function(Rc::new(crate::types::FunctionSignature {
            ret: ret_ty.clone(),
            args: param_types.clone(),
            ellipsis: f.ellipsis,
        }));
        if self.global.find(&f.name).is_none() {
            self.global.add(&f.name, Symbol::Value(Value::Function { name: f.name.clone(), ty: sig_ty }))?;
        }

        let fn_scope = Scope::new_child(&self.global);
        let mut offset = 8usize;
        for (pname, pty) in f.params.iter().zip(param_types.iter()) {
            if let Some(pname) = &pname.0 {
                fn_scope.add(
                    pname,
                    Symbol::Value(Value::Argument { name: pname.clone(), ty: pty.clone(), frame_offset: offset as i32 }),
                )?;
            }
            offset += round_up4(pty.size().unwrap_or(4));
        }

        self.func = Some(crate::sema::FunctionCtx::new(fn_scope, ret_ty));
        let body_id = f.body.id;
        self.check_stmt(&f.body)?;
        let fc = self.func.take().unwrap();

        for label in &fc.labels_referenced {
            if !fc.labels_defined.contains(label) {
                return Err(CcError::UnknownLabel(label.clone()));
            }
        }

        self.records.get_mut(body_id).max_frame_size = Some(fc.max_frame_size);
        Ok(())
    }
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}
