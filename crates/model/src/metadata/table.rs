use super::column::ColumnMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableMetadata {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(name: &str, columns: Vec<ColumnMetadata>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(ordinal, mut col)| {
                col.ordinal = ordinal;
                col
            })
            .collect();

        Self {
            name: name.to_string(),
            schema: None,
            columns,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Finds a column by SQL name first, then by its result alias.
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .or_else(|| self.columns.iter().find(|c| c.alias.eq_ignore_ascii_case(name)))
    }

    pub fn column_by_alias(&self, alias: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|c| c.alias.eq_ignore_ascii_case(alias))
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(alias)))
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TableMetadata;
    use crate::{core::data_type::DataType, metadata::column::ColumnMetadata};

    fn users() -> TableMetadata {
        TableMetadata::new(
            "users",
            vec![
                ColumnMetadata::new("id", DataType::Long).primary_key(),
                ColumnMetadata::new("user_name", DataType::VarChar).with_alias("userName"),
            ],
        )
    }

    #[test]
    fn test_column_lookup_by_name_or_alias() {
        let table = users();
        assert_eq!(table.column("USER_NAME").map(|c| c.ordinal), Some(1));
        assert_eq!(table.column("userName").map(|c| c.name.as_str()), Some("user_name"));
        assert_eq!(table.column_by_alias("username").map(|c| c.name.as_str()), Some("user_name"));
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(users().qualified_name(), "users");
        assert_eq!(users().with_schema("app").qualified_name(), "app.users");
    }
}
