//! Lowers filter term trees into SQL expressions.
//!
//! A term list is read left to right; each term's link says how it attaches
//! to what precedes it (the first term's link is ignored). AND binds tighter
//! than OR, so `a AND b OR c` becomes `(a AND b) OR c`.

use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr},
    column_path, value,
};
use model::{
    core::value::Value,
    query::term::{Link, Operand, Term, TermType},
};

pub fn terms_to_expr(terms: &[Term]) -> Option<Expr> {
    let mut chains: Vec<Vec<Expr>> = Vec::new();

    for term in terms {
        let Some(expr) = term_to_expr(term) else {
            continue;
        };
        match chains.last_mut() {
            Some(run) if term.link == Link::And => run.push(expr),
            _ => chains.push(vec![expr]),
        }
    }

    let ors = chains
        .into_iter()
        .filter_map(|run| fold(run, BinaryOperator::And));
    fold(ors.collect(), BinaryOperator::Or)
}

fn term_to_expr(term: &Term) -> Option<Expr> {
    if term.is_group() {
        return terms_to_expr(&term.terms);
    }

    let left = column_path(term.column.as_deref()?);
    let expr = match term.term_type {
        TermType::IsNull => is_null(left, false),
        TermType::NotNull => is_null(left, true),
        TermType::In => in_list(left, &term.value, false),
        TermType::NotIn => in_list(left, &term.value, true),
        TermType::Eq if is_null_operand(&term.value) => is_null(left, false),
        TermType::Not if is_null_operand(&term.value) => is_null(left, true),
        other => binary(left, operator(other), operand(&term.value)),
    };
    Some(expr)
}

fn operator(term_type: TermType) -> BinaryOperator {
    match term_type {
        TermType::Not => BinaryOperator::NotEq,
        TermType::Gt => BinaryOperator::Gt,
        TermType::Gte => BinaryOperator::GtEq,
        TermType::Lt => BinaryOperator::Lt,
        TermType::Lte => BinaryOperator::LtEq,
        TermType::Like => BinaryOperator::Like,
        TermType::NotLike => BinaryOperator::NotLike,
        _ => BinaryOperator::Eq,
    }
}

fn operand(op: &Operand) -> Expr {
    match op {
        Operand::Column(path) => column_path(path),
        Operand::Value(v) => value(v.clone()),
        Operand::Values(vs) => value(vs.first().cloned().unwrap_or(Value::Null)),
        Operand::None => value(Value::Null),
    }
}

fn is_null_operand(op: &Operand) -> bool {
    matches!(op, Operand::None | Operand::Value(Value::Null))
}

fn in_list(left: Expr, op: &Operand, negated: bool) -> Expr {
    let list = match op {
        Operand::Values(vs) => vs.iter().cloned().map(value).collect(),
        Operand::Value(Value::Json(serde_json::Value::Array(items))) => {
            items.iter().cloned().map(|v| value(Value::Json(v))).collect()
        }
        Operand::None => Vec::new(),
        single => vec![operand(single)],
    };
    Expr::InList {
        expr: Box::new(left),
        list,
        negated,
    }
}

fn is_null(expr: Expr, negated: bool) -> Expr {
    Expr::IsNull {
        expr: Box::new(expr),
        negated,
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
}

fn fold(exprs: Vec<Expr>, op: BinaryOperator) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, next| binary(acc, op, next))
}
