//! Statement nodes.

use crate::{ArmRange, ExprId, FuncId, Name, StmtRange, TypeExprId};

/// Statement variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Stmt {
    /// Expression evaluated for effect.
    Expr(ExprId),

    /// Declaration without an initializer: storage sized from the
    /// declared type (an array declaration allocates the whole run).
    Decl { name: Name, ty: TypeExprId },

    /// Declaration with an initializer. `ty` of `TypeExprId::INVALID`
    /// sizes storage from the value's type.
    Init { name: Name, ty: TypeExprId, value: ExprId },

    /// Dynamically-shaped save: fresh storage on the first write to a
    /// name, store-in-place thereafter.
    Save { name: Name, value: ExprId },

    /// Assignment through an lvalue (name, field, or index).
    Assign { target: ExprId, value: ExprId },

    /// Two-way branch. Either body may be empty; all three labels are
    /// emitted regardless.
    If {
        cond: ExprId,
        then_body: StmtRange,
        else_body: StmtRange,
    },

    /// Loop with the condition re-evaluated each iteration.
    While { cond: ExprId, body: StmtRange },

    /// Enum match. `has_default` records whether the source supplied a
    /// default arm; the lowered switch gets a default block either way.
    Match {
        scrutinee: ExprId,
        arms: ArmRange,
        default_body: StmtRange,
        has_default: bool,
    },

    /// Return. `ExprId::INVALID` returns void.
    Return(ExprId),

    /// Named nested function; captures the locals live at this point.
    Func(FuncId),
}

/// One arm of an enum match: the variant name, an optional payload
/// binding (`Name::EMPTY` when absent), and the arm body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MatchArm {
    pub variant: Name,
    pub binding: Name,
    pub body: StmtRange,
}
