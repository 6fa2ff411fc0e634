use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    /// Flattened result label, e.g. `status` or `user.name`.
    pub name: String,
    pub value: Option<Value>,
}

impl FieldValue {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        FieldValue {
            name: name.to_string(),
            value: (!value.is_null()).then_some(value),
        }
    }
}

/// One flat row as delivered by the execution engine, in column order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        RowData { field_values }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.field_values.push(FieldValue::new(name, value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.field_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }
}

impl IntoIterator for RowData {
    type Item = FieldValue;
    type IntoIter = std::vec::IntoIter<FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.field_values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_is_case_insensitive() {
        let row = RowData::default().with("user.Name", "ann").with("_total", 3i64);
        assert_eq!(row.get_value("USER.name"), Value::String("ann".into()));
        assert_eq!(row.get_value("_total"), Value::Int(3));
        assert_eq!(row.get_value("missing"), Value::Null);
    }

    #[test]
    fn test_null_field_stored_as_none() {
        let row = RowData::default().with("deleted_at", Value::Null);
        assert_eq!(row.get("deleted_at").map(|f| f.value.is_none()), Some(true));
    }
}
