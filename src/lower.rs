//! Converts a `lang_c`-parsed C tree into this crate's own [`crate::ast`] tree,
//! minting a [`NodeId`] for every node along the way.
//!
//! This is the one module with no teacher counterpart: `seqc` parses its own
//! grammar and never has a foreign tree to lower. It exists because this crate
//! delegates C lexing/parsing to the `lang-c` crate (per the driver surface) rather
//! than hand-rolling a parser — once lowering is done, Sema and Codegen never see
//! `lang_c`'s types again.

use lang_c::ast as lc;
use lang_c::driver::{parse_preprocessed, Config};
use lang_c::span::Node as LcNode;

use crate::ast::{
    self, BinaryOp, Decl, DeclNode, Expr, ExprNode, ExternalDecl, FunctionDef, Initializer,
    NodeIdGen, SourceLocation, Stmt, StmtNode, Storage, TypeNode, TypeSpec, UnaryOp,
};
use crate::error::{CcError, CcResult};

pub struct Lowerer {
    ids: NodeIdGen,
    file: std::path::PathBuf,
}

impl Lowerer {
    pub fn new(file: std::path::PathBuf) -> Self {
        Lowerer { ids: NodeIdGen::new(), file }
    }

    pub fn id_count(&self) -> usize {
        self.ids.count()
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation { file: self.file.clone(), line: 0 }
    }

    fn expr_node(&mut self, kind: Expr) -> ExprNode {
        ast::Node { id: self.ids.next(), loc: self.loc(), kind }
    }

    fn stmt_node(&mut self, kind: Stmt) -> StmtNode {
        ast::Node { id: self.ids.next(), loc: self.loc(), kind }
    }

    fn decl_node(&mut self, kind: Decl) -> DeclNode {
        ast::Node { id: self.ids.next(), loc: self.loc(), kind }
    }

    fn type_node(&mut self, kind: TypeSpec) -> TypeNode {
        ast::Node { id: self.ids.next(), loc: self.loc(), kind }
    }

    pub fn lower_unit(&mut self, unit: &lc::TranslationUnit) -> CcResult<ast::TranslationUnit> {
        let mut items = Vec::new();
        for ext in &unit.0 {
            self.lower_external(&ext.node, &mut items)?;
        }
        Ok(ast::TranslationUnit { items })
    }

    fn lower_external(
        &mut self,
        ext: &lc::ExternalDeclaration,
        out: &mut Vec<ExternalDecl>,
    ) -> CcResult<()> {
        match ext {
            lc::ExternalDeclaration::Declaration(d) => {
                for decl in self.lower_declaration(&d.node)? {
                    out.push(ExternalDecl::Decl(decl));
                }
                Ok(())
            }
            lc::ExternalDeclaration::FunctionDefinition(f) => {
                out.push(ExternalDecl::FunctionDef(self.lower_function_def(&f.node)?));
                Ok(())
            }
            lc::ExternalDeclaration::StaticAssert(_) => Ok(()),
        }
    }

    fn lower_function_def(&mut self, f: &lc::FunctionDefinition) -> CcResult<FunctionDef> {
        let base = self.base_type_spec(&specifiers_from_declaration_specifiers(&f.specifiers))?;
        let storage = storage_from_specifiers(&f.specifiers);
        let (name, ret, params, ellipsis) = self.apply_declarator(base, &f.declarator.node)?;
        let name = name.ok_or_else(|| CcError::NotImplemented("anonymous function definition".into()))?;
        let body = self.lower_statement(&f.statement.node)?;
        Ok(FunctionDef { name, ret, params, ellipsis, storage, body })
    }

    /// Lower one `Declaration`, which may bind several names sharing one set of
    /// specifiers (`int a, *b, c[3];`).
    fn lower_declaration(&mut self, d: &lc::Declaration) -> CcResult<Vec<DeclNode>> {
        let base = self.base_type_spec(&specifiers_from_declaration_specifiers(&d.specifiers))?;
        let storage = storage_from_specifiers(&d.specifiers);
        let mut out = Vec::new();
        for init_decl in &d.declarators {
            let (name, ty, params, ellipsis) =
                self.apply_declarator(base.clone(), &init_decl.node.declarator.node)?;
            let ty = if !params.is_empty() || ellipsis {
                self.type_node(TypeSpec::Function {
                    ret: Box::new(ty),
                    params: params
                        .into_iter()
                        .map(|(n, t)| (n, t))
                        .collect(),
                    ellipsis,
                })
            } else {
                ty
            };
            let init = match &init_decl.node.initializer {
                Some(i) => Some(self.lower_initializer(&i.node)?),
                None => None,
            };
            out.push(self.decl_node(Decl { name, ty, storage, init, bitsize: None }));
        }
        Ok(out)
    }

    fn lower_initializer(&mut self, init: &lc::Initializer) -> CcResult<Initializer> {
        match init {
            lc::Initializer::Expression(e) => {
                Ok(Initializer::Expr(Box::new(self.lower_expression(&e.node)?)))
            }
            lc::Initializer::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.push(self.lower_initializer(&item.node.initializer.node)?);
                }
                Ok(Initializer::List(out))
            }
        }
    }

    /// Fold a base type through a declarator's derived chain (pointer/array/function
    /// wrappers), returning the bound name (if any), the resulting type, and — for a
    /// function declarator — its parameter list and ellipsis flag.
    fn apply_declarator(
        &mut self,
        base: TypeSpec,
        d: &lc::Declarator,
    ) -> CcResult<(Option<String>, TypeNode, Vec<(Option<String>, TypeNode)>, bool)> {
        let mut ty = self.type_node(base);
        let mut params = Vec::new();
        let mut ellipsis = false;
        for derived in &d.derived {
            match &derived.node {
                lc::DerivedDeclarator::Pointer(_) => {
                    ty = self.type_node(TypeSpec::Pointer(Box::new(ty)));
                }
                lc::DerivedDeclarator::Array(arr) => {
                    let size = match &arr.node.size {
                        lc::ArraySize::VariableExpression(e) | lc::ArraySize::StaticExpression(e) => {
                            Some(Box::new(self.lower_expression(&e.node)?))
                        }
                        _ => None,
                    };
                    ty = self.type_node(TypeSpec::Array(Box::new(ty), size));
                }
                lc::DerivedDeclarator::Function(fd) => {
                    params = self.lower_params(&fd.node.parameters)?;
                    ellipsis = matches!(fd.node.ellipsis, lc::Ellipsis::Some);
                }
                lc::DerivedDeclarator::KRFunction(_) => {}
                lc::DerivedDeclarator::Block(_) => {}
            }
        }
        let name = match &d.kind.node {
            lc::DeclaratorKind::Identifier(id) => Some(id.node.name.clone()),
            lc::DeclaratorKind::Declarator(inner) => {
                let (n, inner_ty, inner_params, inner_ellipsis) =
                    self.apply_declarator(ty.kind.clone(), &inner.node)?;
                ty = inner_ty;
                if !inner_params.is_empty() || inner_ellipsis {
                    params = inner_params;
                    ellipsis = inner_ellipsis;
                }
                n
            }
            lc::DeclaratorKind::Abstract => None,
        };
        Ok((name, ty, params, ellipsis))
    }

    fn lower_params(
        &mut self,
        params: &[LcNode<lc::ParameterDeclaration>],
    ) -> CcResult<Vec<(Option<String>, TypeNode)>> {
        let mut out = Vec::new();
        for p in params {
            let base = self.base_type_spec(&specifiers_from_declaration_specifiers(&p.node.specifiers))?;
            match &p.node.declarator {
                Some(d) => {
                    let (name, ty, _, _) = self.apply_declarator(base, &d.node)?;
                    out.push((name, ty));
                }
                None => {
                    out.push((None, self.type_node(base)));
                }
            }
        }
        Ok(out)
    }

    /// Build the un-derived base type from a specifier list: `int`, `struct Foo`,
    /// `unsigned long`, etc. Only the combinations spec §3/GLOSSARY names are
    /// recognized; anything else is rejected up front rather than silently guessed.
    fn base_type_spec(&mut self, specs: &[&lc::TypeSpecifier]) -> CcResult<TypeSpec> {
        if let Some(lc::TypeSpecifier::Struct(s)) = specs.iter().find(|s| matches!(s, lc::TypeSpecifier::Struct(_))).copied() {
            let fields = match &s.node.declarations {
                Some(decls) => {
                    let mut out = Vec::new();
                    for sd in decls {
                        if let lc::StructDeclaration::Field(f) = &sd.node {
                            let base = self.base_type_spec(&specifier_qualifiers_to_type_specs(&f.node.specifiers))?;
                            for decl in &f.node.declarators {
                                if let Some(d) = &decl.node.declarator {
                                    let (name, ty, _, _) = self.apply_declarator(base.clone(), &d.node)?;
                                    let name = name.ok_or_else(|| {
                                        CcError::NotImplemented("unnamed struct field".into())
                                    })?;
                                    out.push((name, ty));
                                }
                            }
                        }
                    }
                    Some(out)
                }
                None => None,
            };
            let name = s.node.identifier.as_ref().map(|i| i.node.name.clone());
            return Ok(TypeSpec::Struct { name, fields });
        }
        let name = keyword_name(specs)?;
        Ok(TypeSpec::Named(name))
    }

    pub fn lower_statement(&mut self, s: &lc::Statement) -> CcResult<StmtNode> {
        let kind = match s {
            lc::Statement::Compound(items) => {
                let mut out = Vec::new();
                for item in items {
                    match &item.node {
                        lc::BlockItem::Declaration(d) => {
                            let decls = self.lower_declaration(&d.node)?;
                            out.push(self.stmt_node(Stmt::Decl(decls)));
                        }
                        lc::BlockItem::Statement(st) => out.push(self.lower_statement(&st.node)?),
                        lc::BlockItem::StaticAssert(_) => {}
                    }
                }
                Stmt::Compound(out)
            }
            lc::Statement::Expression(e) => {
                Stmt::Expr(match e {
                    Some(e) => Some(self.lower_expression(&e.node)?),
                    None => None,
                })
            }
            lc::Statement::If(i) => {
                let cond = self.lower_expression(&i.node.condition.node)?;
                let then_branch = Box::new(self.lower_statement(&i.node.then_statement.node)?);
                let else_branch = match &i.node.else_statement {
                    Some(e) => Some(Box::new(self.lower_statement(&e.node)?)),
                    None => None,
                };
                Stmt::If { cond, then_branch, else_branch }
            }
            lc::Statement::While(w) => {
                let cond = self.lower_expression(&w.node.expression.node)?;
                let body = Box::new(self.lower_statement(&w.node.statement.node)?);
                Stmt::While { cond, body }
            }
            lc::Statement::DoWhile(w) => {
                let body = Box::new(self.lower_statement(&w.node.statement.node)?);
                let cond = self.lower_expression(&w.node.expression.node)?;
                Stmt::DoWhile { body, cond }
            }
            lc::Statement::For(f) => {
                let init = match &f.node.initializer.node {
                    lc::ForInitializer::Empty => None,
                    lc::ForInitializer::Expression(e) => {
                        let e = self.lower_expression(&e.node)?;
                        Some(Box::new(self.stmt_node(Stmt::Expr(Some(e)))))
                    }
                    lc::ForInitializer::Declaration(d) => {
                        let decls = self.lower_declaration(&d.node)?;
                        Some(Box::new(self.stmt_node(Stmt::Decl(decls))))
                    }
                    lc::ForInitializer::StaticAssert(_) => None,
                };
                let cond = match &f.node.condition {
                    Some(e) => Some(self.lower_expression(&e.node)?),
                    None => None,
                };
                let step = match &f.node.step {
                    Some(e) => Some(self.lower_expression(&e.node)?),
                    None => None,
                };
                let body = Box::new(self.lower_statement(&f.node.statement.node)?);
                Stmt::For { init, cond, step, body }
            }
            lc::Statement::Switch(sw) => {
                let expr = self.lower_expression(&sw.node.expression.node)?;
                let body = Box::new(self.lower_statement(&sw.node.statement.node)?);
                Stmt::Switch { expr, body }
            }
            lc::Statement::Labeled(l) => match &l.node.label.node {
                lc::Label::Identifier(id) => Stmt::Label {
                    name: id.node.name.clone(),
                    stmt: Box::new(self.lower_statement(&l.node.statement.node)?),
                },
                lc::Label::Case(e) => {
                    let value = self.lower_expression(&e.node)?;
                    let stmt = Box::new(self.lower_statement(&l.node.statement.node)?);
                    Stmt::Case { value, stmt }
                }
                lc::Label::Default => Stmt::Default(Box::new(self.lower_statement(&l.node.statement.node)?)),
                lc::Label::CaseRange(_) => {
                    return Err(CcError::NotImplemented("case range labels".into()))
                }
            },
            lc::Statement::Goto(id) => Stmt::Goto(id.node.name.clone()),
            lc::Statement::Continue => Stmt::Continue,
            lc::Statement::Break => Stmt::Break,
            lc::Statement::Return(e) => Stmt::Return(match e {
                Some(e) => Some(self.lower_expression(&e.node)?),
                None => None,
            }),
            lc::Statement::Asm(a) => Stmt::Pragma(format!("{:?}", a.node)),
        };
        Ok(self.stmt_node(kind))
    }

    fn lower_expression(&mut self, e: &lc::Expression) -> CcResult<ExprNode> {
        let kind = match e {
            lc::Expression::Identifier(id) => Expr::Ident(id.node.name.clone()),
            lc::Expression::Constant(c) => self.lower_constant(&c.node)?,
            lc::Expression::StringLiteral(s) => Expr::StrLiteral(s.node.join("")),
            lc::Expression::Member(m) => {
                let base = Box::new(self.lower_expression(&m.node.expression.node)?);
                let arrow = matches!(m.node.operator.node, lc::MemberOperator::Indirect);
                Expr::Member { base, field: m.node.identifier.node.name.clone(), arrow }
            }
            lc::Expression::Call(c) => {
                let callee = Box::new(self.lower_expression(&c.node.callee.node)?);
                let mut args = Vec::new();
                for a in &c.node.arguments {
                    args.push(self.lower_expression(&a.node)?);
                }
                Expr::Call { callee, args }
            }
            lc::Expression::SizeOfTy(t) => Expr::SizeofType(self.lower_type_name(&t.node.0.node)?),
            lc::Expression::UnaryOperator(u) => {
                let operand = Box::new(self.lower_expression(&u.node.operand.node)?);
                match u.node.operator.node {
                    lc::UnaryOperator::PostIncrement => Expr::PostIncDec { inc: true, expr: operand },
                    lc::UnaryOperator::PostDecrement => Expr::PostIncDec { inc: false, expr: operand },
                    lc::UnaryOperator::PreIncrement => Expr::PreIncDec { inc: true, expr: operand },
                    lc::UnaryOperator::PreDecrement => Expr::PreIncDec { inc: false, expr: operand },
                    lc::UnaryOperator::Address => Expr::AddrOf(operand),
                    lc::UnaryOperator::Indirection => Expr::Deref(operand),
                    lc::UnaryOperator::Plus => return Ok(*operand),
                    lc::UnaryOperator::Minus => Expr::Unary { op: UnaryOp::Neg, expr: operand },
                    lc::UnaryOperator::Complement => Expr::Unary { op: UnaryOp::Not, expr: operand },
                    lc::UnaryOperator::Negate => Expr::Unary { op: UnaryOp::LogicalNot, expr: operand },
                }
            }
            lc::Expression::Cast(c) => {
                let ty = self.lower_type_name(&c.node.type_name.node)?;
                let expr = Box::new(self.lower_expression(&c.node.expression.node)?);
                Expr::Cast { ty, expr }
            }
            lc::Expression::BinaryOperator(b) => {
                let lhs = Box::new(self.lower_expression(&b.node.lhs.node)?);
                let rhs = Box::new(self.lower_expression(&b.node.rhs.node)?);
                return Ok(self.lower_binary(b.node.operator.node.clone(), lhs, rhs));
            }
            lc::Expression::Conditional(c) => {
                let cond = Box::new(self.lower_expression(&c.node.condition.node)?);
                let t = Box::new(self.lower_expression(&c.node.then_expression.node)?);
                let f = Box::new(self.lower_expression(&c.node.else_expression.node)?);
                Expr::Ternary { cond, t, f }
            }
            lc::Expression::Comma(items) => {
                let mut out = Vec::new();
                for e in items.iter() {
                    out.push(self.lower_expression(&e.node)?);
                }
                Expr::Comma(out)
            }
            other => return Err(CcError::NotImplemented(format!("expression form {other:?}"))),
        };
        Ok(self.expr_node(kind))
    }

    fn lower_binary(&mut self, op: lc::BinaryOperator, lhs: Box<ExprNode>, rhs: Box<ExprNode>) -> ExprNode {
        use lc::BinaryOperator as B;
        let kind = match op {
            B::Index => Expr::Index { base: lhs, index: rhs },
            B::Assign => Expr::Assign { lhs, rhs },
            B::Multiply => return self.binop(BinaryOp::Mul, lhs, rhs),
            B::Divide => return self.binop(BinaryOp::Div, lhs, rhs),
            B::Modulo => return self.binop(BinaryOp::Mod, lhs, rhs),
            B::Plus => return self.binop(BinaryOp::Add, lhs, rhs),
            B::Minus => return self.binop(BinaryOp::Sub, lhs, rhs),
            B::ShiftLeft => return self.binop(BinaryOp::Shl, lhs, rhs),
            B::ShiftRight => return self.binop(BinaryOp::Shr, lhs, rhs),
            B::Less => return self.binop(BinaryOp::Lt, lhs, rhs),
            B::Greater => return self.binop(BinaryOp::Gt, lhs, rhs),
            B::LessOrEqual => return self.binop(BinaryOp::Le, lhs, rhs),
            B::GreaterOrEqual => return self.binop(BinaryOp::Ge, lhs, rhs),
            B::Equals => return self.binop(BinaryOp::Eq, lhs, rhs),
            B::NotEquals => return self.binop(BinaryOp::Ne, lhs, rhs),
            B::BitwiseAnd => return self.binop(BinaryOp::BitAnd, lhs, rhs),
            B::BitwiseXor => return self.binop(BinaryOp::BitXor, lhs, rhs),
            B::BitwiseOr => return self.binop(BinaryOp::BitOr, lhs, rhs),
            B::LogicalAnd => return self.binop(BinaryOp::LogicalAnd, lhs, rhs),
            B::LogicalOr => return self.binop(BinaryOp::LogicalOr, lhs, rhs),
            B::AssignMultiply => Expr::CompoundAssign { op: BinaryOp::Mul, lhs, rhs },
            B::AssignDivide => Expr::CompoundAssign { op: BinaryOp::Div, lhs, rhs },
            B::AssignModulo => Expr::CompoundAssign { op: BinaryOp::Mod, lhs, rhs },
            B::AssignPlus => Expr::CompoundAssign { op: BinaryOp::Add, lhs, rhs },
            B::AssignMinus => Expr::CompoundAssign { op: BinaryOp::Sub, lhs, rhs },
            B::AssignShiftLeft => Expr::CompoundAssign { op: BinaryOp::Shl, lhs, rhs },
            B::AssignShiftRight => Expr::CompoundAssign { op: BinaryOp::Shr, lhs, rhs },
            B::AssignBitwiseAnd => Expr::CompoundAssign { op: BinaryOp::BitAnd, lhs, rhs },
            B::AssignBitwiseXor => Expr::CompoundAssign { op: BinaryOp::BitXor, lhs, rhs },
            B::AssignBitwiseOr => Expr::CompoundAssign { op: BinaryOp::BitOr, lhs, rhs },
        };
        self.expr_node(kind)
    }

    fn binop(&mut self, op: BinaryOp, lhs: Box<ExprNode>, rhs: Box<ExprNode>) -> ExprNode {
        self.expr_node(Expr::Binary { op, lhs, rhs })
    }

    fn lower_constant(&mut self, c: &lc::Constant) -> CcResult<Expr> {
        match c {
            lc::Constant::Integer(i) => {
                let radix = match i.base {
                    lc::IntegerBase::Decimal => 10,
                    lc::IntegerBase::Octal => 8,
                    lc::IntegerBase::Hexadecimal => 16,
                    lc::IntegerBase::Binary => 2,
                };
                let value = i64::from_str_radix(&i.number, radix)
                    .map_err(|e| CcError::NotImplemented(format!("integer literal: {e}")))?;
                Ok(Expr::IntLiteral {
                    value,
                    suffix_unsigned: i.suffix.unsigned,
                    suffix_long: !matches!(i.suffix.size, lc::IntegerSize::Int),
                })
            }
            lc::Constant::Character(s) => Ok(Expr::CharLiteral(s.clone())),
            lc::Constant::Float(_) => Err(CcError::NotImplemented("floating-point constant".into())),
        }
    }

    fn lower_type_name(&mut self, t: &lc::TypeName) -> CcResult<TypeNode> {
        let base = self.base_type_spec(&specifier_qualifiers_to_type_specs(&t.specifiers))?;
        match &t.declarator {
            Some(d) => {
                let (_, ty, _, _) = self.apply_declarator(base, &d.node)?;
                Ok(ty)
            }
            None => Ok(self.type_node(base)),
        }
    }
}

fn keyword_name(specs: &[&lc::TypeSpecifier]) -> CcResult<String> {
    use lc::TypeSpecifier as T;
    if let Some(T::TypedefName(id)) = specs.iter().find(|s| matches!(s, T::TypedefName(_))).copied() {
        return Ok(id.node.name.clone());
    }
    let mut unsigned = false;
    let mut long_count = 0;
    let mut short = false;
    let mut base = "int";
    for s in specs {
        match s {
            T::Void => base = "void",
            T::Char => base = "char",
            T::Int => {}
            T::Short => short = true,
            T::Long => long_count += 1,
            T::Unsigned => unsigned = true,
            T::Signed => {}
            T::Bool => base = "int",
            other => return Err(CcError::NotImplemented(format!("type specifier {other:?}"))),
        }
    }
    let name = match (base, short, long_count, unsigned) {
        ("void", _, _, _) => "void",
        ("char", _, _, true) => "unsigned char",
        ("char", _, _, false) => "char",
        (_, true, _, true) => "unsigned short",
        (_, true, _, false) => "short",
        (_, _, n, true) if n >= 2 => "unsigned long long",
        (_, _, n, false) if n >= 2 => "long long",
        (_, _, 1, true) => "unsigned long",
        (_, _, 1, false) => "long",
        (_, _, _, true) => "unsigned int",
        _ => "int",
    };
    Ok(name.to_string())
}

fn storage_from_specifiers(specs: &[LcNode<lc::DeclarationSpecifier>]) -> Storage {
    for s in specs {
        if let lc::DeclarationSpecifier::StorageClass(sc) = &s.node {
            return match sc.node {
                lc::StorageClassSpecifier::Typedef => Storage::Typedef,
                lc::StorageClassSpecifier::Extern => Storage::Extern,
                lc::StorageClassSpecifier::Static => Storage::Static,
                _ => Storage::Default,
            };
        }
    }
    Storage::Default
}

fn specifiers_from_declaration_specifiers(
    specs: &[LcNode<lc::DeclarationSpecifier>],
) -> Vec<&lc::TypeSpecifier> {
    specs
        .iter()
        .filter_map(|s| match &s.node {
            lc::DeclarationSpecifier::TypeSpecifier(t) => Some(&t.node),
            _ => None,
        })
        .collect()
}

fn specifier_qualifiers_to_type_specs(specs: &[LcNode<lc::SpecifierQualifier>]) -> Vec<&lc::TypeSpecifier> {
    specs
        .iter()
        .filter_map(|s| match &s.node {
            lc::SpecifierQualifier::TypeSpecifier(t) => Some(&t.node),
            _ => None,
        })
        .collect()
}

/// Parse already-preprocessed C source text and lower it, end to end.
pub fn lower_source(source: &str, file: std::path::PathBuf) -> CcResult<(ast::TranslationUnit, usize)> {
    let config = Config::default();
    let parsed = parse_preprocessed(&config, source.to_string())
        .map_err(|e| CcError::NotImplemented(format!("parse error: {e}")))?;
    let mut lowerer = Lowerer::new(file);
    let unit = lowerer.lower_unit(&parsed.unit)?;
    Ok((unit, lowerer.id_count()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_a_trivial_function() {
        let src = "int add(int a, int b) { return a + b; }";
        let (unit, n) = lower_source(src, "t.c".into()).unwrap();
        assert_eq!(unit.items.len(), 1);
        assert!(n > 0);
        match &unit.items[0] {
            ExternalDecl::FunctionDef(f) => assert_eq!(f.name, "add"),
            _ => panic!("expected a function definition"),
        }
    }

    #[test]
    fn lowers_a_global_declaration() {
        let src = "int x;";
        let (unit, _) = lower_source(src, "t.c".into()).unwrap();
        match &unit.items[0] {
            ExternalDecl::Decl(d) => assert_eq!(d.kind.name.as_deref(), Some("x")),
            _ => panic!("expected a declaration"),
        }
    }
}
