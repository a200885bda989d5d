use crate::ast::{BinOp, LogicalOp, UnaryOp};

/// Expression node.
///
/// Identifiers keep the spelling they were written with; variable lookup is
/// case-insensitive, so `Var("Total")` and `Var("total")` refer to the same
/// binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Decimal literal
    ///
    /// # Example
    /// ```text
    /// 3.5
    /// ```
    Float(f64),

    /// String literal
    String(String),

    /// The unknown value (`?`)
    Unknown,

    /// Plain variable reference
    ///
    /// # Example
    /// ```text
    /// counter
    /// ```
    Var(String),

    /// Dotted field path. The first segment is the base name.
    ///
    /// # Example
    /// ```text
    /// customer.name
    /// order.customer.email
    /// ```
    Field(Vec<String>),

    /// Prefix operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Arithmetic or comparison
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `AND` / `OR`
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Built-in function call, name upper-cased
    ///
    /// # Example
    /// ```text
    /// ENTRY(2, "a,b,c")
    /// ```
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}
