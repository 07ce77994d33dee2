//! Expression nodes.

use crate::{ExprId, ExprRange, Name, PartRange, TypeExprRange};

use super::operators::{BinaryOp, UnaryOp};

/// Expression variants.
///
/// All children are indices into the owning module's [`Arena`](crate::Arena).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    // ===== Literals =====
    /// Boolean literal: `true`, `false`.
    Bool(bool),

    /// Integer literal.
    Int(i64),

    /// Character literal (one byte).
    Char(u8),

    /// String literal (interned content, escapes already processed).
    Str(Name),

    // ===== References =====
    /// Name reference, resolved through the two-tier scope at lowering.
    Ident(Name),

    /// Member access: struct field, method, or imported-module item.
    /// Which one it is falls out of the base expression's type.
    Field { base: ExprId, name: Name },

    // ===== Compound =====
    /// Indexing: pointer/array element access, or the receiver's
    /// `subscript` capability when the base is a struct.
    Index { base: ExprId, index: ExprId },

    /// Call. Construction `Type(args...)` is this node with a callee
    /// that resolves to a struct kind.
    Call { callee: ExprId, args: ExprRange },

    /// Explicit generic fill: `callee[int, str]`.
    Fill { target: ExprId, args: TypeExprRange },

    /// Partial application: bind leading arguments, yield a callable pair.
    Bind { callee: ExprId, args: ExprRange },

    /// Unary operation.
    Unary { op: UnaryOp, operand: ExprId },

    /// Binary operation.
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },

    /// Template string. `formatter` of `Name::EMPTY` selects the module
    /// default formatter.
    Template { parts: PartRange, formatter: Name },
}

/// One piece of a template string: a literal fragment or an interpolated
/// expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TemplatePart {
    Lit(Name),
    Expr(ExprId),
}
