//! Table metadata lookup and the per-type table cache.

use crate::{entity::EntityType, error::QueryError};
use model::metadata::table::TableMetadata;
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

/// Source of table and column metadata (usually backed by schema discovery).
pub trait MetadataProvider: Send + Sync {
    fn table(&self, schema: Option<&str>, name: &str) -> Option<Arc<TableMetadata>>;
}

/// In-memory provider over a fixed set of tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaMetadata {
    tables: Vec<Arc<TableMetadata>>,
}

impl SchemaMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.add_table(table);
        self
    }

    pub fn add_table(&mut self, table: TableMetadata) {
        self.tables.push(Arc::new(table));
    }
}

impl MetadataProvider for SchemaMetadata {
    fn table(&self, schema: Option<&str>, name: &str) -> Option<Arc<TableMetadata>> {
        self.tables
            .iter()
            .find(|t| {
                t.name.eq_ignore_ascii_case(name)
                    && match (schema, t.schema.as_deref()) {
                        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
                        (Some(_), None) => false,
                        (None, _) => true,
                    }
            })
            .cloned()
    }
}

/// Resolves entity types to table metadata once and keeps the result for
/// the lifetime of the cache. Concurrent first lookups of the same type may
/// both hit the provider; the first stored entry wins.
pub struct TableCache {
    provider: Arc<dyn MetadataProvider>,
    by_type: RwLock<HashMap<TypeId, Arc<TableMetadata>>>,
}

impl TableCache {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        TableCache {
            provider,
            by_type: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, entity: &EntityType) -> Result<Arc<TableMetadata>, QueryError> {
        if let Some(table) = self
            .by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity.id())
        {
            return Ok(table.clone());
        }

        let table = self.resolve_name(entity.schema(), entity.table())?;
        debug!("Cached table metadata for {}: {}", entity.type_name(), table.qualified_name());

        let mut cache = self.by_type.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(entity.id()).or_insert(table).clone())
    }

    /// Looks a table up by name without caching it.
    pub fn resolve_name(
        &self,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Arc<TableMetadata>, QueryError> {
        self.provider.table(schema, name).ok_or_else(|| {
            QueryError::TableNotFound(match schema {
                Some(schema) => format!("{schema}.{name}"),
                None => name.to_string(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.by_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use model::{core::data_type::DataType, metadata::column::ColumnMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct User;
    impl Entity for User {
        const TABLE: &'static str = "users";
    }

    struct Audit;
    impl Entity for Audit {
        const TABLE: &'static str = "audit";
        const SCHEMA: Option<&'static str> = Some("ops");
    }

    struct Ghost;
    impl Entity for Ghost {
        const TABLE: &'static str = "ghosts";
    }

    struct CountingProvider {
        inner: SchemaMetadata,
        calls: AtomicUsize,
    }

    impl MetadataProvider for CountingProvider {
        fn table(&self, schema: Option<&str>, name: &str) -> Option<Arc<TableMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.table(schema, name)
        }
    }

    fn provider() -> Arc<CountingProvider> {
        let inner = SchemaMetadata::new()
            .with_table(TableMetadata::new(
                "users",
                vec![ColumnMetadata::new("id", DataType::Long)],
            ))
            .with_table(
                TableMetadata::new("audit", vec![ColumnMetadata::new("id", DataType::Long)])
                    .with_schema("ops"),
            );
        Arc::new(CountingProvider {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_resolve_is_computed_once() {
        let provider = provider();
        let cache = TableCache::new(provider.clone());

        let first = cache.resolve(&EntityType::of::<User>()).unwrap();
        let second = cache.resolve(&EntityType::of::<User>()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_with_schema() {
        let cache = TableCache::new(provider());
        let audit = cache.resolve(&EntityType::of::<Audit>()).unwrap();
        assert_eq!(audit.qualified_name(), "ops.audit");
        assert!(cache.resolve_name(Some("public"), "audit").is_err());
    }

    #[test]
    fn test_missing_table() {
        let cache = TableCache::new(provider());
        let err = cache.resolve(&EntityType::of::<Ghost>()).unwrap_err();
        assert!(matches!(err, QueryError::TableNotFound(name) if name == "ghosts"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_population() {
        let cache = Arc::new(TableCache::new(provider()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.resolve(&EntityType::of::<User>()).map(|t| t.name.clone()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "users");
        }
        assert_eq!(cache.len(), 1);
    }
}
