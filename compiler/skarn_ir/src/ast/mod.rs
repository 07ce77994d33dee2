//! AST node types.
//!
//! The backend consumes a fully type-checked AST; these are the shapes the
//! front end hands over. All children are arena indices, not boxes: nodes
//! are `Copy` and live in flat per-module tables (see [`Arena`]).

mod expr;
mod items;
mod operators;
mod stmt;
mod type_expr;

pub use expr::{ExprKind, TemplatePart};
pub use items::{
    AliasDef, ConstDef, EnumDef, ExternDef, FieldDef, Func, ImportDef, Item, MixDef, Param,
    StructDef, VarDef, VariantDef,
};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{MatchArm, Stmt};
pub use type_expr::TypeExpr;

use crate::Arena;

/// One source file, fully parsed and type-checked.
///
/// Items appear in source order; the orchestrator walks them twice
/// (declare, then define) so forward references within a module work.
/// The arena owns every node the items reference.
#[derive(Debug, Default)]
pub struct Module {
    pub items: Vec<Item>,
    pub arena: Arena,
}
