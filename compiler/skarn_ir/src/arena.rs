//! Arena allocation for the flat AST.
//!
//! One arena per module: contiguous storage for every node kind, with
//! side tables for lists so a range never requires its elements to be
//! allocated contiguously in the node tables.

use crate::ast::{
    ExprKind, FieldDef, Func, MatchArm, Param, Stmt, TemplatePart, TypeExpr, VariantDef,
};
use crate::{
    ArmRange, ExprId, ExprRange, FieldRange, FuncId, FuncRange, Name, NameRange, ParamRange,
    PartRange, StmtId, StmtRange, TypeExprId, TypeExprRange, VariantRange,
};
use std::fmt;

/// Contiguous storage for all AST nodes in a module.
#[derive(Clone, Default)]
pub struct Arena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<ExprKind>,

    /// All statements (indexed by `StmtId`).
    stmts: Vec<Stmt>,

    /// All type expressions (indexed by `TypeExprId`).
    type_exprs: Vec<TypeExpr>,

    /// All functions (indexed by `FuncId`): top-level, methods, nested.
    funcs: Vec<Func>,

    /// Flattened expression lists (call arguments, bound arguments).
    expr_lists: Vec<ExprId>,

    /// Flattened statement lists (bodies and blocks).
    stmt_lists: Vec<StmtId>,

    /// Flattened type-expression lists (generic fills, extern signatures).
    type_expr_lists: Vec<TypeExprId>,

    /// Flattened function lists (aggregate method tables).
    func_lists: Vec<FuncId>,

    /// Flattened name lists (generic parameters, overload-set members).
    names: Vec<Name>,

    /// All declared parameters.
    params: Vec<Param>,

    /// All struct fields.
    fields: Vec<FieldDef>,

    /// All enum variants.
    variants: Vec<VariantDef>,

    /// All match arms.
    arms: Vec<MatchArm>,

    /// All template-string parts.
    parts: Vec<TemplatePart>,
}

impl Arena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Expressions =====

    /// Allocate an expression, return its ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: ExprKind) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Get an expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds or the sentinel.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()]
    }

    /// Allocate an expression list, return its range.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len() as u32;
        self.expr_lists.extend(exprs);
        let len = (self.expr_lists.len() as u32 - start) as u16;
        ExprRange::new(start, len)
    }

    /// Get an expression list by range.
    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    // ===== Statements =====

    /// Allocate a statement, return its ID.
    #[inline]
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    /// Get a statement by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Allocate a statement list, return its range.
    pub fn alloc_stmt_list(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = self.stmt_lists.len() as u32;
        self.stmt_lists.extend(stmts);
        let len = (self.stmt_lists.len() as u32 - start) as u16;
        StmtRange::new(start, len)
    }

    /// Get a statement list by range.
    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    // ===== Type expressions =====

    /// Allocate a type expression, return its ID.
    #[inline]
    pub fn alloc_type_expr(&mut self, ty: TypeExpr) -> TypeExprId {
        let id = TypeExprId::new(self.type_exprs.len() as u32);
        self.type_exprs.push(ty);
        id
    }

    /// Get a type expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds or the sentinel.
    #[inline]
    #[track_caller]
    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id.index()]
    }

    /// Allocate a type-expression list, return its range.
    pub fn alloc_type_expr_list(
        &mut self,
        tys: impl IntoIterator<Item = TypeExprId>,
    ) -> TypeExprRange {
        let start = self.type_expr_lists.len() as u32;
        self.type_expr_lists.extend(tys);
        let len = (self.type_expr_lists.len() as u32 - start) as u16;
        TypeExprRange::new(start, len)
    }

    /// Get a type-expression list by range.
    #[inline]
    pub fn type_expr_list(&self, range: TypeExprRange) -> &[TypeExprId] {
        let start = range.start as usize;
        &self.type_expr_lists[start..start + range.len()]
    }

    // ===== Functions =====

    /// Allocate a function, return its ID.
    #[inline]
    pub fn alloc_func(&mut self, func: Func) -> FuncId {
        let id = FuncId::new(self.funcs.len() as u32);
        self.funcs.push(func);
        id
    }

    /// Get a function by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn func(&self, id: FuncId) -> &Func {
        &self.funcs[id.index()]
    }

    /// Allocate a function list, return its range.
    pub fn alloc_func_list(&mut self, funcs: impl IntoIterator<Item = FuncId>) -> FuncRange {
        let start = self.func_lists.len() as u32;
        self.func_lists.extend(funcs);
        let len = (self.func_lists.len() as u32 - start) as u16;
        FuncRange::new(start, len)
    }

    /// Get a function list by range.
    #[inline]
    pub fn func_list(&self, range: FuncRange) -> &[FuncId] {
        let start = range.start as usize;
        &self.func_lists[start..start + range.len()]
    }

    // ===== Names =====

    /// Allocate a name list, return its range.
    pub fn alloc_names(&mut self, names: impl IntoIterator<Item = Name>) -> NameRange {
        let start = self.names.len() as u32;
        self.names.extend(names);
        let len = (self.names.len() as u32 - start) as u16;
        NameRange::new(start, len)
    }

    /// Get a name list by range.
    #[inline]
    pub fn name_list(&self, range: NameRange) -> &[Name] {
        let start = range.start as usize;
        &self.names[start..start + range.len()]
    }

    // ===== Parameters =====

    /// Allocate a parameter list, return its range.
    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Param>) -> ParamRange {
        let start = self.params.len() as u32;
        self.params.extend(params);
        let len = (self.params.len() as u32 - start) as u16;
        ParamRange::new(start, len)
    }

    /// Get parameters by range.
    #[inline]
    pub fn param_list(&self, range: ParamRange) -> &[Param] {
        let start = range.start as usize;
        &self.params[start..start + range.len()]
    }

    // ===== Fields =====

    /// Allocate a field list, return its range.
    pub fn alloc_fields(&mut self, fields: impl IntoIterator<Item = FieldDef>) -> FieldRange {
        let start = self.fields.len() as u32;
        self.fields.extend(fields);
        let len = (self.fields.len() as u32 - start) as u16;
        FieldRange::new(start, len)
    }

    /// Get fields by range.
    #[inline]
    pub fn field_list(&self, range: FieldRange) -> &[FieldDef] {
        let start = range.start as usize;
        &self.fields[start..start + range.len()]
    }

    // ===== Variants =====

    /// Allocate a variant list, return its range.
    pub fn alloc_variants(
        &mut self,
        variants: impl IntoIterator<Item = VariantDef>,
    ) -> VariantRange {
        let start = self.variants.len() as u32;
        self.variants.extend(variants);
        let len = (self.variants.len() as u32 - start) as u16;
        VariantRange::new(start, len)
    }

    /// Get variants by range.
    #[inline]
    pub fn variant_list(&self, range: VariantRange) -> &[VariantDef] {
        let start = range.start as usize;
        &self.variants[start..start + range.len()]
    }

    // ===== Match arms =====

    /// Allocate a match-arm list, return its range.
    pub fn alloc_arms(&mut self, arms: impl IntoIterator<Item = MatchArm>) -> ArmRange {
        let start = self.arms.len() as u32;
        self.arms.extend(arms);
        let len = (self.arms.len() as u32 - start) as u16;
        ArmRange::new(start, len)
    }

    /// Get match arms by range.
    #[inline]
    pub fn arm_list(&self, range: ArmRange) -> &[MatchArm] {
        let start = range.start as usize;
        &self.arms[start..start + range.len()]
    }

    // ===== Template parts =====

    /// Allocate a template-part list, return its range.
    pub fn alloc_parts(&mut self, parts: impl IntoIterator<Item = TemplatePart>) -> PartRange {
        let start = self.parts.len() as u32;
        self.parts.extend(parts);
        let len = (self.parts.len() as u32 - start) as u16;
        PartRange::new(start, len)
    }

    /// Get template parts by range.
    #[inline]
    pub fn part_list(&self, range: PartRange) -> &[TemplatePart] {
        let start = range.start as usize;
        &self.parts[start..start + range.len()]
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arena {{ {} exprs, {} stmts, {} type exprs, {} funcs }}",
            self.exprs.len(),
            self.stmts.len(),
            self.type_exprs.len(),
            self.funcs.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alloc_expr_assigns_sequential_ids() {
        let mut arena = Arena::new();

        let one = arena.alloc_expr(ExprKind::Int(1));
        let two = arena.alloc_expr(ExprKind::Int(2));

        assert_eq!(one.index(), 0);
        assert_eq!(two.index(), 1);
        assert!(matches!(arena.expr(one), ExprKind::Int(1)));
        assert!(matches!(arena.expr(two), ExprKind::Int(2)));
    }

    #[test]
    fn expr_list_preserves_order() {
        let mut arena = Arena::new();

        let one = arena.alloc_expr(ExprKind::Int(1));
        let two = arena.alloc_expr(ExprKind::Int(2));
        let three = arena.alloc_expr(ExprKind::Int(3));

        let range = arena.alloc_expr_list([three, one, two]);

        assert_eq!(range.len(), 3);
        assert_eq!(arena.expr_list(range), &[three, one, two]);
    }

    #[test]
    fn stmt_list_allows_noncontiguous_blocks() {
        let mut arena = Arena::new();

        let a = arena.alloc_expr(ExprKind::Bool(true));
        let s1 = arena.alloc_stmt(Stmt::Expr(a));
        let b = arena.alloc_expr(ExprKind::Bool(false));
        let s2 = arena.alloc_stmt(Stmt::Expr(b));

        let range = arena.alloc_stmt_list([s2, s1]);
        assert_eq!(arena.stmt_list(range), &[s2, s1]);
    }

    #[test]
    fn empty_ranges_are_empty_slices() {
        let arena = Arena::new();

        assert!(arena.expr_list(ExprRange::EMPTY).is_empty());
        assert!(arena.stmt_list(StmtRange::EMPTY).is_empty());
        assert!(arena.name_list(NameRange::EMPTY).is_empty());
    }
}
