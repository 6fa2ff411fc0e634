use crate::{core::value::Value, error::ModelError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    Short,
    Int,
    Long,
    LongUnsigned,
    Float,
    Double,
    Decimal,
    Boolean,
    String,
    VarChar,
    Char,
    Json,
    Uuid,
    Bytes,
    Date,
    Timestamp,
    Null,
}

lazy_static! {
    static ref SQL_TYPE_MAP: HashMap<&'static str, DataType> = build_sql_type_map();
}

impl DataType {
    pub fn from_sql_name(type_name: &str) -> Result<Self, ModelError> {
        let normalized = type_name
            .split('(')
            .next()
            .unwrap_or(type_name)
            .trim()
            .to_ascii_lowercase();

        SQL_TYPE_MAP
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| ModelError::UnknownDataType(type_name.to_string()))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Short | DataType::Int | DataType::Long | DataType::LongUnsigned
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DataType::String | DataType::VarChar | DataType::Char)
    }

    /// Converts a raw value handed over by the execution engine into the
    /// value this column type stores. `Null` always passes through.
    pub fn decode(&self, raw: Value) -> Result<Value, ModelError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        let decoded = match self {
            DataType::Null => Some(Value::Null),
            DataType::LongUnsigned => raw.as_u64().map(Value::Uint),
            t if t.is_integer() => raw.as_i64().map(Value::Int),
            DataType::Float | DataType::Double | DataType::Decimal => {
                raw.as_f64().map(Value::Float)
            }
            DataType::Boolean => raw.as_bool().map(Value::Boolean),
            t if t.is_text() => match raw {
                Value::String(_) => Some(raw),
                Value::Bytes(bytes) => String::from_utf8(bytes).ok().map(Value::String),
                other => other.as_string().map(Value::String),
            },
            DataType::Json => match raw {
                Value::Json(_) => Some(raw),
                Value::String(text) => serde_json::from_str(&text).ok().map(Value::Json),
                other => serde_json::to_value(&other).ok().map(Value::Json),
            },
            DataType::Uuid => match raw {
                Value::Uuid(_) => Some(raw),
                Value::String(text) => Uuid::parse_str(text.trim()).ok().map(Value::Uuid),
                Value::Bytes(bytes) => Uuid::from_slice(&bytes).ok().map(Value::Uuid),
                _ => None,
            },
            DataType::Bytes => match raw {
                Value::Bytes(_) => Some(raw),
                Value::String(text) => Some(Value::Bytes(text.into_bytes())),
                _ => None,
            },
            DataType::Date => match raw {
                Value::Date(_) => Some(raw),
                Value::Timestamp(ts) => Some(Value::Date(ts.date_naive())),
                Value::String(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .ok()
                    .map(Value::Date),
                _ => None,
            },
            DataType::Timestamp => decode_timestamp(raw),
            _ => None,
        };

        decoded.ok_or_else(|| ModelError::Decode {
            data_type: *self,
            reason: "incompatible raw value".to_string(),
        })
    }
}

fn decode_timestamp(raw: Value) -> Option<Value> {
    match raw {
        Value::Timestamp(_) => Some(raw),
        Value::Int(millis) => DateTime::<Utc>::from_timestamp_millis(millis).map(Value::Timestamp),
        Value::Uint(millis) => i64::try_from(millis)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Value::Timestamp),
        Value::Date(date) => date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Value::Timestamp(dt.and_utc())),
        Value::String(text) => {
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|dt| dt.and_utc())
                })
                .map(Value::Timestamp)
        }
        _ => None,
    }
}

impl TryFrom<&str> for DataType {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DataType::from_sql_name(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Short => "SMALLINT",
            DataType::Int => "INTEGER",
            DataType::Long => "BIGINT",
            DataType::LongUnsigned => "BIGINT UNSIGNED",
            DataType::Float => "REAL",
            DataType::Double => "DOUBLE PRECISION",
            DataType::Decimal => "DECIMAL",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "TEXT",
            DataType::VarChar => "VARCHAR",
            DataType::Char => "CHAR",
            DataType::Json => "JSON",
            DataType::Uuid => "UUID",
            DataType::Bytes => "BYTEA",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Null => "NULL",
        };
        write!(f, "{name}")
    }
}

fn build_sql_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;
    HashMap::from([
        ("smallint", Short),
        ("int2", Short),
        ("tinyint", Short),
        ("int", Int),
        ("int4", Int),
        ("integer", Int),
        ("mediumint", Int),
        ("serial", Int),
        ("bigint", Long),
        ("int8", Long),
        ("bigserial", Long),
        ("bigint unsigned", LongUnsigned),
        ("real", Float),
        ("float", Float),
        ("float4", Float),
        ("double", Double),
        ("double precision", Double),
        ("float8", Double),
        ("decimal", Decimal),
        ("numeric", Decimal),
        ("bool", Boolean),
        ("boolean", Boolean),
        ("bit", Boolean),
        ("text", String),
        ("mediumtext", String),
        ("longtext", String),
        ("varchar", VarChar),
        ("character varying", VarChar),
        ("char", Char),
        ("character", Char),
        ("bpchar", Char),
        ("json", Json),
        ("jsonb", Json),
        ("uuid", Uuid),
        ("bytea", Bytes),
        ("blob", Bytes),
        ("binary", Bytes),
        ("varbinary", Bytes),
        ("date", Date),
        ("timestamp", Timestamp),
        ("timestamptz", Timestamp),
        ("datetime", Timestamp),
    ])
}
