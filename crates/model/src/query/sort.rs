use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(column: &str) -> Self {
        Sort {
            column: column.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Sort {
            column: column.to_string(),
            order: SortOrder::Desc,
        }
    }
}
