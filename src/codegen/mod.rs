//! Codegen: the second AST walk, emitting assembly text against the register
//! convention of spec §4.5.1. Restructured from `codegen.py`'s single `Codegen`
//! class into the teacher's `codegen/{...}.rs` one-file-per-concern split.
//!
//! Reads [`crate::node_record::NodeRecordStore`] for the [`Value`] Sema attached to
//! each expression node and the `translated` subtree Sema planted in place of a
//! lowered construct (spec §4.4.4) — this walker never re-derives types or scopes,
//! it only ever asks "what did Sema decide this node is."

pub mod access;
pub mod binop;
pub mod builtins;
pub mod control_flow;

use crate::asm::{AsmWriter, StrPool};
use crate::ast::{self, Decl, DeclNode, ExternalDecl, FunctionDef, Initializer, Stmt, StmtNode, TranslationUnit};
use crate::error::{CcError, CcResult};
use crate::node_record::NodeRecordStore;
use crate::types::Type;
use crate::value::Value;

pub struct Codegen<'a> {
    records: &'a NodeRecordStore,
    pub(crate) asm: AsmWriter,
    pub(crate) func_name: String,
    pub(crate) needs_memset: bool,
    pub(crate) needs_memcpy: bool,
}

impl<'a> Codegen<'a> {
    pub fn new(records: &'a NodeRecordStore) -> Codegen<'a> {
        Codegen {
            records,
            asm: AsmWriter::new(),
            func_name: String::new(),
            needs_memset: false,
            needs_memcpy: false,
        }
    }

    pub fn gen_unit(&mut self, unit: &TranslationUnit) -> CcResult<()> {
        for item in &unit.items {
            match item {
                ExternalDecl::Decl(d) => self.gen_global_decl(d)?,
                ExternalDecl::FunctionDef(f) => self.gen_function(f)?,
            }
        }
        Ok(())
    }

    pub fn finish(mut self, str_pool: &StrPool) -> String {
        self.asm.flush_str_pool(str_pool);
        if self.needs_memset {
            builtins::emit_memset(&mut self.asm);
        }
        if self.needs_memcpy {
            builtins::emit_memcpy(&mut self.asm);
        }
        self.asm.to_text()
    }

    fn value_of(&self, id: ast::NodeId) -> CcResult<Value> {
        self.records
            .value(id)
            .cloned()
            .ok_or_else(|| CcError::InvalidOperand("expression has no recorded value".into()))
    }

    /// The subtree to actually walk for `e`: Sema's `translated` replacement if it
    /// planted one (spec §4.4.4), otherwise `e` itself.
    fn resolved<'e>(&self, e: &'e ast::ExprNode) -> &'e ast::ExprNode
    where
        'a: 'e,
    {
        match self.records.get(e.id).and_then(|r| r.translated.as_deref()) {
            Some(t) => t,
            None => e,
        }
    }

    fn gen_global_decl(&mut self, d: &DeclNode) -> CcResult<()> {
        let Some(value) = self.records.value(d.id).cloned() else {
            return Ok(());
        };
        match value {
            Value::GlobalVariable { label, ty, .. } | Value::StaticVariable { label, ty, .. } => {
                self.gen_data_object(&label, &ty, d.kind.init.as_ref())
            }
            _ => Ok(()),
        }
    }

    fn gen_data_object(&mut self, label: &str, ty: &Type, init: Option<&Initializer>) -> CcResult<()> {
        let align = crate::asm::p2align(ty.align().max(1));
        match init {
            None => {
                self.asm.bss.own_fragment();
                self.asm.bss.emit(&format!(".align {align}"));
                self.asm.bss.emit_label(label);
                self.asm.bss.emit(&format!(".fill {}", ty.size().unwrap_or(0)));
                self.asm.bss.emit(&format!(".global ${label}"));
                self.asm.bss.emit(&format!(".type ${label}, \"object\""));
                self.asm.bss.emit(&format!(".size ${label}, -($. ${label})"));
                Ok(())
            }
            Some(init) => {
                self.asm.data.own_fragment();
                self.asm.data.emit(&format!(".align {align}"));
                self.asm.data.emit_label(label);
                self.emit_initializer(ty, init)?;
                self.asm.data.emit(&format!(".global ${label}"));
                self.asm.data.emit(&format!(".type ${label}, \"object\""));
                self.asm.data.emit(&format!(".size ${label}, -($. ${label})"));
                Ok(())
            }
        }
    }

    fn emit_initializer(&mut self, ty: &Type, init: &Initializer) -> CcResult<()> {
        match (ty, init) {
            (_, Initializer::Expr(e)) => {
                let v = self.value_of(e.id)?;
                if let Value::StrLiteral { source_form, .. } = &v {
                    self.asm.data.emit(&format!(".asciz {source_form}"));
                    return Ok(());
                }
                self.asm.data.emit_constant(&v);
                Ok(())
            }
            (Type::Array { base, dim }, Initializer::List(items)) => {
                for item in items {
                    self.emit_initializer(base, item)?;
                }
                if let Some(d) = dim {
                    let pad = d.saturating_sub(items.len());
                    if pad > 0 {
                        self.asm.data.emit(&format!(".fill {}", pad * base.size().unwrap_or(1)));
                    }
                }
                Ok(())
            }
            (Type::Struct(st), Initializer::List(items)) => {
                let fields = st.fields.as_ref().ok_or_else(|| CcError::IncompleteType("struct".into()))?;
                for (item, field) in items.iter().zip(fields.iter()) {
                    self.emit_initializer(&field.ty, item)?;
                }
                if let Some(size) = st.size {
                    let emitted: usize = fields.iter().take(items.len()).filter_map(|f| f.ty.size()).sum();
                    let pad = size.saturating_sub(emitted);
                    if pad > 0 {
                        self.asm.data.emit(&format!(".fill {pad}"));
                    }
                }
                Ok(())
            }
            _ => Err(CcError::InvalidInitializer(format!("cannot emit {ty:?} from a list"))),
        }
    }

    fn gen_function(&mut self, f: &FunctionDef) -> CcResult<()> {
        if matches!(f.storage, ast::Storage::Extern) {
            return Ok(());
        }
        self.func_name = f.name.clone();
        let max_frame_size = self
            .records
            .get(f.body.id)
            .and_then(|r| r.max_frame_size)
            .unwrap_or(0);

        self.asm.text.own_fragment();
        self.asm.text.emit_label(&f.name);
        self.asm.text.emit("push ra");
        self.asm.text.emit("push fp");
        self.asm.text.emit("mv fp, sp");
        if max_frame_size > 0 {
            self.asm.text.emit(&format!("addi sp, sp, -{max_frame_size}"));
        }

        self.gen_stmt(&f.body)?;

        self.asm.text.own_fragment();
        self.asm.text.emit_label(&format!("{}.epilogue", f.name));
        self.asm.text.emit("mv sp, fp");
        self.asm.text.emit("pop fp");
        self.asm.text.emit("pop ra");
        self.asm.text.emit("ret");
        Ok(())
    }

    fn gen_stmt(&mut self, s: &StmtNode) -> CcResult<()> {
        match &s.kind {
            Stmt::Compound(items) => {
                for item in items {
                    self.gen_stmt(item)?;
                }
                Ok(())
            }
            Stmt::Decl(_) => Ok(()),
            Stmt::Expr(e) => {
                if let Some(e) = e {
                    self.gen_expr(self.resolved(e))?;
                }
                Ok(())
            }
            Stmt::If { .. } => self.gen_if(s),
            Stmt::While { .. } => self.gen_while(s),
            Stmt::DoWhile { .. } => self.gen_do_while(s),
            Stmt::For { .. } => self.gen_for(s),
            Stmt::Switch { .. } => self.gen_switch(s),
            Stmt::Case { stmt, .. } => {
                let label = self.records.get(s.id).and_then(|r| r.labels.first().cloned());
                if let Some(label) = label {
                    self.asm.text.emit_label(&label);
                }
                self.gen_stmt(stmt)
            }
            Stmt::Default(stmt) => {
                let label = self.records.get(s.id).and_then(|r| r.labels.first().cloned());
                if let Some(label) = label {
                    self.asm.text.emit_label(&label);
                }
                self.gen_stmt(stmt)
            }
            Stmt::Break | Stmt::Continue => {
                let target = self
                    .records
                    .get(s.id)
                    .and_then(|r| r.labels.first().cloned())
                    .ok_or_else(|| CcError::InvalidBreak("break/continue with no target label".into()))?;
                self.asm.text.emit(&format!("j {target}"));
                Ok(())
            }
            Stmt::Return(e) => {
                if let Some(e) = e {
                    self.gen_expr(self.resolved(e))?;
                }
                self.asm.text.emit(&format!("j {}.epilogue", self.func_name));
                Ok(())
            }
            Stmt::Goto(name) => {
                self.asm.text.emit(&format!("j {name}"));
                Ok(())
            }
            Stmt::Label { name, stmt } => {
                self.asm.text.emit_label(name);
                self.gen_stmt(stmt)
            }
            Stmt::Pragma(text) => {
                self.asm.text.emit_raw(text);
                Ok(())
            }
        }
    }
}

pub(crate) fn is_wide(ty: &Type) -> bool {
    ty.size() == Some(8)
}

pub(crate) use is_wide as is_wide_type;
