use crate::executor::ExecutorError;
use model::error::ModelError;
use std::fmt;
use thiserror::Error;

/// What kind of join reference failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Alias,
    Type,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Alias => write!(f, "join alias"),
            ReferenceKind::Type => write!(f, "join for type"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    /// A join alias or joined entity type was referenced but never declared
    /// (or was declared after the point of reference).
    #[error("Reference not found: {kind} [{key}]")]
    ReferenceNotFound { kind: ReferenceKind, key: String },

    /// The metadata provider knows no table for an entity or table name.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column [{column}] not found in [{table}]")]
    ColumnNotFound { table: String, column: String },

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Duplicate join alias: {0}")]
    DuplicateAlias(String),

    /// Empty or over-qualified column path.
    #[error("Invalid column path: [{0}]")]
    InvalidPath(String),

    /// A raw value could not be decoded by its column codec.
    #[error("Failed to decode [{label}]: {source}")]
    Decode {
        label: String,
        #[source]
        source: ModelError,
    },

    /// Failure reported by the execution engine, passed through unchanged.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutorError),
}

impl QueryError {
    pub(crate) fn alias_not_found(alias: &str) -> Self {
        QueryError::ReferenceNotFound {
            kind: ReferenceKind::Alias,
            key: alias.to_string(),
        }
    }

    pub(crate) fn type_not_found(type_name: &str) -> Self {
        QueryError::ReferenceNotFound {
            kind: ReferenceKind::Type,
            key: type_name.to_string(),
        }
    }

    /// Configuration errors are programming mistakes in the query
    /// declaration. They are raised before any query reaches the engine.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QueryError::ReferenceNotFound { .. }
                | QueryError::TableNotFound(_)
                | QueryError::ColumnNotFound { .. }
                | QueryError::InvalidMapping(_)
                | QueryError::DuplicateAlias(_)
                | QueryError::InvalidPath(_)
        )
    }
}
