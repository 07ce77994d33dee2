//! Type annotations as written in source.
//!
//! A `TypeExpr` is syntax; the backend resolves it against the current
//! scope (type parameters, aggregates, aliases, imports) to a concrete
//! `Type` at lowering time.

use crate::{Name, TypeExprId, TypeExprRange};

/// A source-level type annotation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeExpr {
    /// A bare name: primitive, type parameter, aggregate, or alias.
    Named(Name),

    /// A member of an imported module: `alias.Type`.
    Qual { module: Name, name: Name },

    /// Pointer: `*T`.
    Ptr(TypeExprId),

    /// Fixed-length array: `[n]T`.
    Array { elem: TypeExprId, len: u32 },

    /// Function type. `ret` of `TypeExprId::INVALID` means void.
    Fun { params: TypeExprRange, ret: TypeExprId },

    /// Generic application: `head[args...]`.
    Apply { head: TypeExprId, args: TypeExprRange },
}
