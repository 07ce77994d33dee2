//! Skarn IR - typed AST and string interning.
//!
//! This crate contains the data structures the backend consumes:
//! - Names for interned identifiers
//! - AST nodes (items, statements, expressions, type annotations)
//! - Arena allocation with flat ID/range indexing
//!
//! # Design Philosophy
//!
//! - **Intern everything**: strings become `Name(u32)`
//! - **Flatten everything**: no `Box<Expr>`, children are `ExprId(u32)`
//!   indices into a per-module arena
//!
//! The AST arrives fully type-checked; the backend trusts that and treats
//! any violation as an internal inconsistency (see [`ice!`]).

/// Abort on an internal consistency failure.
///
/// For guarantees the checking pass was supposed to establish: an
/// unresolved name, a missing capability, a call-site type mismatch.
/// These are never caught or retried; the whole output is discarded.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        panic!("internal compiler error: {}", format_args!($($arg)*))
    };
}

pub mod ast;

mod arena;
mod ids;
mod interner;
mod name;

pub use arena::Arena;
pub use ids::{
    ArmRange, ExprId, ExprRange, FieldRange, FuncId, FuncRange, NameRange, ParamRange, PartRange,
    StmtId, StmtRange, TypeExprId, TypeExprRange, VariantRange,
};
pub use interner::StringInterner;
pub use name::Name;
