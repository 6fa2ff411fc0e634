use crate::{
    config::{ConfigError, HelperConfig},
    executor::QueryExecutor,
    metadata::{MetadataProvider, TableCache},
    record::Record,
    spec::SelectSpec,
};
use std::sync::Arc;

/// Entry point. Owns the executor, the table cache and the configuration
/// shared by every query it starts. Cloning is cheap.
#[derive(Clone)]
pub struct QueryHelper {
    executor: Arc<dyn QueryExecutor>,
    tables: Arc<TableCache>,
    config: Arc<HelperConfig>,
}

impl QueryHelper {
    pub fn new(executor: Arc<dyn QueryExecutor>, provider: Arc<dyn MetadataProvider>) -> Self {
        QueryHelper {
            executor,
            tables: Arc::new(TableCache::new(provider)),
            config: Arc::new(HelperConfig::default()),
        }
    }

    /// Shares an existing table cache and applies a validated configuration.
    pub fn with_config(
        executor: Arc<dyn QueryExecutor>,
        tables: Arc<TableCache>,
        config: HelperConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(QueryHelper {
            executor,
            tables,
            config: Arc::new(config),
        })
    }

    pub fn select<R: Record>(&self) -> SelectSpec<R> {
        SelectSpec::new(self.clone())
    }

    /// Starts a query whose mappings are declared by `mapper`.
    pub fn select_with<R: Record>(
        &self,
        mapper: impl FnOnce(SelectSpec<R>) -> SelectSpec<R>,
    ) -> SelectSpec<R> {
        mapper(self.select())
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    pub(crate) fn executor(&self) -> &dyn QueryExecutor {
        self.executor.as_ref()
    }
}
