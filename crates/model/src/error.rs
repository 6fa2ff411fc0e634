use crate::core::data_type::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown term type: {0}")]
    UnknownTermType(String),

    #[error("Unknown column type: {0}")]
    UnknownDataType(String),

    #[error("Cannot decode value as {data_type}: {reason}")]
    Decode { data_type: DataType, reason: String },
}
