//! ID and range newtypes for the flat AST.
//!
//! These types provide type-safe indices into [`Arena`](crate::Arena)
//! storage. Child references use 4-byte IDs instead of boxed nodes, and
//! node lists use `(start: u32, len: u16)` ranges into flattened side
//! tables, so equal-shaped trees compare with integer equality.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Index into the expression arena.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Sentinel value indicating "no expression". Used for optional child
    /// expressions (a bare `return`, a declaration without an initializer).
    pub const INVALID: ExprId = ExprId(u32::MAX);

    /// Create a new `ExprId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is a valid (non-sentinel) ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for ExprId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ExprId({})", self.0)
        } else {
            write!(f, "ExprId::INVALID")
        }
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Range of expression IDs in the arena's `expr_lists` table.
///
/// Used for call arguments and other expression lists.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct ExprRange {
    pub start: u32,
    pub len: u16,
}

impl ExprRange {
    /// Empty range.
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        ExprRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of expressions.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for ExprRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExprRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Index into the statement arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    /// Create a new `StmtId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        StmtId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

/// Range of statement IDs in the arena's `stmt_lists` table.
///
/// Used for function bodies and every nested block (branch bodies, loop
/// bodies, match arms).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct StmtRange {
    pub start: u32,
    pub len: u16,
}

impl StmtRange {
    /// Empty range.
    pub const EMPTY: StmtRange = StmtRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        StmtRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of statements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for StmtRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StmtRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Index into the type-expression arena.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct TypeExprId(u32);

impl TypeExprId {
    /// Sentinel value indicating "no annotation". A function return slot
    /// holding this means `void`; a binding slot means "infer from the
    /// initializer".
    pub const INVALID: TypeExprId = TypeExprId(u32::MAX);

    /// Create a new `TypeExprId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeExprId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is a valid (non-sentinel) ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for TypeExprId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for TypeExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "TypeExprId({})", self.0)
        } else {
            write!(f, "TypeExprId::INVALID")
        }
    }
}

impl Default for TypeExprId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Range of type-expression IDs in the arena's `type_expr_lists` table.
///
/// Used for generic argument lists and external-declaration signatures.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct TypeExprRange {
    pub start: u32,
    pub len: u16,
}

impl TypeExprRange {
    /// Empty range.
    pub const EMPTY: TypeExprRange = TypeExprRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        TypeExprRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of type expressions.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for TypeExprRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypeExprRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Index into the function arena.
///
/// Both top-level functions and named nested functions live in the same
/// table; a nested function statement references its definition by ID.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct FuncId(u32);

impl FuncId {
    /// Create a new `FuncId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        FuncId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncId({})", self.0)
    }
}

/// Range of function IDs in the arena's `func_lists` table.
///
/// Used for the method lists of struct and enum definitions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct FuncRange {
    pub start: u32,
    pub len: u16,
}

impl FuncRange {
    /// Empty range.
    pub const EMPTY: FuncRange = FuncRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        FuncRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of functions.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for FuncRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FuncRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of names in the arena's `names` table.
///
/// Used for generic parameter lists and overload-set member lists.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct NameRange {
    pub start: u32,
    pub len: u16,
}

impl NameRange {
    /// Empty range.
    pub const EMPTY: NameRange = NameRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        NameRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of names.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for NameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NameRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of parameters in the arena's `params` table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct ParamRange {
    pub start: u32,
    pub len: u16,
}

impl ParamRange {
    /// Empty range.
    pub const EMPTY: ParamRange = ParamRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        ParamRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of parameters.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for ParamRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParamRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of struct fields in the arena's `fields` table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct FieldRange {
    pub start: u32,
    pub len: u16,
}

impl FieldRange {
    /// Empty range.
    pub const EMPTY: FieldRange = FieldRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        FieldRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of fields.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of enum variants in the arena's `variants` table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct VariantRange {
    pub start: u32,
    pub len: u16,
}

impl VariantRange {
    /// Empty range.
    pub const EMPTY: VariantRange = VariantRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        VariantRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of variants.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for VariantRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VariantRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of match arms in the arena's `arms` table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct ArmRange {
    pub start: u32,
    pub len: u16,
}

impl ArmRange {
    /// Empty range.
    pub const EMPTY: ArmRange = ArmRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        ArmRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of arms.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for ArmRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArmRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// Range of template-string parts in the arena's `parts` table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct PartRange {
    pub start: u32,
    pub len: u16,
}

impl PartRange {
    /// Empty range.
    pub const EMPTY: PartRange = PartRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        PartRange { start, len }
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of parts.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for PartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PartRange({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}
