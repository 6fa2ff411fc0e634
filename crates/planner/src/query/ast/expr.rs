//! Defines the AST for SQL expressions.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// A literal value, bound as a parameter when rendered.
    Value(Value),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)` or `MAX(price)`.
    FunctionCall(FunctionCall),

    /// An aliased expression, e.g. `COUNT(*) AS _total`
    Alias { expr: Box<Expr>, alias: String },

    /// `expr IS NULL` / `expr IS NOT NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// `expr IN (a, b)` / `expr NOT IN (a, b)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'users' in 'users.id'
    pub name: String,              // e.g., the 'id' in 'users.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,      // =
    NotEq,   // <>
    Lt,      // <
    LtEq,    // <=
    Gt,      // >
    GtEq,    // >=
    Like,    // LIKE
    NotLike, // NOT LIKE

    // Logical
    And,
    Or,
}

impl Expr {
    /// The label this expression is returned under, if it is aliased.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Expr::Alias { alias, .. } => Some(alias),
            _ => None,
        }
    }
}
