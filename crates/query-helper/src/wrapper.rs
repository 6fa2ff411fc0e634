//! Row Wrapper: turns one flat engine row into a populated result.

use crate::{error::QueryError, mapping::ResolvedMapping, record::Record};
use model::records::row::RowData;
use std::sync::Arc;
use tracing::trace;

/// Applies the resolved mappings of one plan to rows. Cheap to clone; every
/// stream produced from the plan holds its own handle.
pub struct RowWrapper<R> {
    mappings: Arc<Vec<ResolvedMapping<R>>>,
}

impl<R> Clone for RowWrapper<R> {
    fn clone(&self) -> Self {
        RowWrapper {
            mappings: Arc::clone(&self.mappings),
        }
    }
}

impl<R: Record> RowWrapper<R> {
    pub(crate) fn new(mappings: Vec<ResolvedMapping<R>>) -> Self {
        RowWrapper {
            mappings: Arc::new(mappings),
        }
    }

    pub fn mappings(&self) -> &[ResolvedMapping<R>] {
        &self.mappings
    }

    /// Builds one result from `row`. Labels no mapping accepts are dropped and
    /// null values leave the property at its default.
    pub fn wrap(&self, row: RowData) -> Result<R, QueryError> {
        let mut record = R::default();

        for field in row {
            let Some(value) = field.value else {
                continue;
            };

            let matched = self
                .mappings
                .iter()
                .find_map(|mapping| mapping.matches(&field.name).map(|key| (mapping, key)));

            match matched {
                Some((mapping, key)) => mapping.apply(&mut record, &field.name, key, value)?,
                None => trace!("No mapping for column [{}], dropping", field.name),
            }
        }

        Ok(record)
    }
}
