//! Defines the Abstract Syntax Tree (AST) for a SELECT query.

use crate::query::ast::{
    common::{JoinKind, OrderDir, TableRef},
    expr::Expr,
};
use model::query::term::Term;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    /// The list of columns or expressions to be returned.
    /// e.g., `users.id AS id`, `COUNT(*) AS _total`
    pub columns: Vec<Expr>,

    /// The primary table for the query.
    /// e.g., `FROM users`
    pub from: Option<FromClause>,

    /// A list of JOIN clauses.
    pub joins: Vec<JoinClause>,

    /// The filter term tree. Leaf columns are fully qualified.
    pub terms: Vec<Term>,

    /// The ORDER BY clause.
    pub order_by: Vec<OrderByExpr>,

    /// The LIMIT clause.
    pub limit: Option<usize>,

    /// The OFFSET clause.
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    pub alias: Option<String>,
    /// The join condition as a term tree, e.g. `j_0.user_id = users.id`.
    pub on: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
}

impl Select {
    /// Result labels of the selected columns, in select order.
    pub fn column_labels(&self) -> Vec<&str> {
        self.columns.iter().filter_map(Expr::alias).collect()
    }

    pub fn join(&self, alias: &str) -> Option<&JoinClause> {
        self.joins
            .iter()
            .find(|j| j.alias.as_deref() == Some(alias))
    }
}
