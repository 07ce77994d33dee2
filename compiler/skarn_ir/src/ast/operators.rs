//! Binary and unary operators.

/// Binary operators.
///
/// Which operand-type pairs each operator accepts is decided by the
/// lowering table, not here; the checking pass has already rejected
/// anything the table will not hold.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical / bitwise
    And,
    Or,
    Xor,
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}
