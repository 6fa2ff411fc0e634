use model::{
    pagination::page::PageWindow,
    query::param::{DEFAULT_PAGE_INDEX, DEFAULT_PAGE_SIZE},
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by every query built from one `QueryHelper`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Page index used by paged fetches without filter parameters.
    pub page_index: usize,
    /// Page size used by paged fetches without filter parameters.
    pub page_size: usize,
    /// Result label of the row-count pseudo column.
    pub count_alias: String,
    /// Prefix of generated join aliases (`j_0`, `j_1`, ...).
    pub join_alias_prefix: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        HelperConfig {
            page_index: DEFAULT_PAGE_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
            count_alias: "_total".to_string(),
            join_alias_prefix: "j_".to_string(),
        }
    }
}

impl HelperConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: HelperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be greater than 0".into()));
        }
        validate_label("count_alias", &self.count_alias)?;
        validate_label("join_alias_prefix", &self.join_alias_prefix)?;
        Ok(())
    }

    pub fn default_window(&self) -> PageWindow {
        PageWindow::new(self.page_index, self.page_size)
    }

    pub fn join_alias(&self, index: usize) -> String {
        format!("{}{index}", self.join_alias_prefix)
    }
}

fn validate_label(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if value.contains('.') {
        return Err(ConfigError::Invalid(format!(
            "{field} must not contain '.': {value}"
        )));
    }
    Ok(())
}
