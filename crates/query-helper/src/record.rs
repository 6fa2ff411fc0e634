//! Result-side property access used by the row wrapper.

use model::core::value::Value;
use std::collections::BTreeMap;

/// Named property access on a result object. Implemented per result type
/// instead of reflecting over it at runtime.
pub trait Properties: Send {
    /// Assigns a decoded value. Returns `false` when the property is unknown.
    fn set_property(&mut self, name: &str, value: Value) -> bool;

    /// Returns the nested object stored under `name`, creating it first if it
    /// does not exist yet. `None` when the property is unknown or not an object.
    fn property_or_new(&mut self, name: &str) -> Option<&mut dyn Properties>;
}

/// A result type the query helper can materialize rows into.
pub trait Record: Properties + Default + Send + 'static {}

impl<T: Properties + Default + Send + 'static> Record for T {}

/// Map-backed result for schema-less queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    fields: BTreeMap<String, Value>,
    nested: BTreeMap<String, DynamicRecord>,
}

impl DynamicRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn nested(&self, name: &str) -> Option<&DynamicRecord> {
        self.nested.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.nested.is_empty()
    }
}

impl Properties for DynamicRecord {
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        self.fields.insert(name.to_string(), value);
        true
    }

    fn property_or_new(&mut self, name: &str) -> Option<&mut dyn Properties> {
        Some(self.nested.entry(name.to_string()).or_default())
    }
}
