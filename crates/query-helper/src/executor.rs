//! The execution-engine seam: run a planned `Select` and stream raw rows.

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use model::{core::value::Value, records::row::RowData};
use planner::query::ast::select::Select;
use thiserror::Error;

pub type RowStream = BoxStream<'static, Result<RowData, ExecutorError>>;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The engine rejected or failed the statement.
    #[error("SQL error: {0}")]
    Sql(String),

    /// The engine could not reach the database.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs the query and streams its rows. Row labels are the select aliases.
    async fn fetch(&self, query: Select) -> Result<RowStream, ExecutorError>;

    /// Runs a scalar query and returns the value labelled `label` in the
    /// first row, or `None` when the query yields no row.
    async fn fetch_value(&self, query: Select, label: &str) -> Result<Option<Value>, ExecutorError> {
        let mut rows = self.fetch(query).await?;
        match rows.next().await {
            Some(row) => Ok(row?.get(label).and_then(|field| field.value.clone())),
            None => Ok(None),
        }
    }
}
