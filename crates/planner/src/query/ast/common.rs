//! Defines common, reusable AST nodes for building SQL queries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl From<model::query::sort::SortOrder> for OrderDir {
    fn from(order: model::query::sort::SortOrder) -> Self {
        match order {
            model::query::sort::SortOrder::Asc => OrderDir::Asc,
            model::query::sort::SortOrder::Desc => OrderDir::Desc,
        }
    }
}
