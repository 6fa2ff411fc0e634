use crate::{
    core::{data_type::DataType, value::Value},
    error::ModelError,
};
use serde::{Deserialize, Serialize};

/// One column of a resolved table: its SQL name, the label used when the
/// column is flattened into a result row, and the codec driven by its type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnMetadata {
    pub ordinal: usize,
    pub name: String,
    pub alias: String,
    pub data_type: DataType,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnMetadata {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            ordinal: 0,
            name: name.to_string(),
            alias: name.to_string(),
            data_type,
            is_nullable: true,
            is_primary_key: false,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn decode(&self, raw: Value) -> Result<Value, ModelError> {
        self.data_type.decode(raw)
    }
}
