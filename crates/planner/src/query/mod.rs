use crate::query::ast::expr::{Expr, FunctionCall, Ident};
use model::core::value::Value;

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod macros;
pub mod renderer;

pub fn ident(name: &str) -> Expr {
    Expr::Identifier(Ident {
        qualifier: None,
        name: name.to_string(),
    })
}

pub fn qualified(qualifier: &str, name: &str) -> Expr {
    Expr::Identifier(Ident {
        qualifier: Some(qualifier.to_string()),
        name: name.to_string(),
    })
}

/// Builds an identifier from a `qualifier.column` path. The split happens on
/// the first dot only.
pub fn column_path(path: &str) -> Expr {
    match path.split_once('.') {
        Some((qualifier, name)) => qualified(qualifier, name),
        None => ident(path),
    }
}

pub fn value(val: Value) -> Expr {
    Expr::Value(val)
}

pub fn aliased(expr: Expr, alias: &str) -> Expr {
    Expr::Alias {
        expr: Box::new(expr),
        alias: alias.to_string(),
    }
}

/// `COUNT(*) AS <alias>`
pub fn count_all(alias: &str) -> Expr {
    aliased(
        Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: Vec::new(),
            wildcard: true,
        }),
        alias,
    )
}
