//! Column Mapping Resolver.
//!
//! A mapping is declared against names only and resolved at plan time into
//! select expressions plus the rule that writes returned values back onto a
//! result. Two variants exist:
//!
//! - *Direct*: one column onto one property (or through a typed setter),
//!   returned under a single-segment label.
//! - *Whole-table*: every column of a table, returned under
//!   `prefix.columnAlias` labels and written onto the result itself or onto
//!   a nested object.

use crate::{
    conditional::ColumnSource,
    entity::EntityType,
    error::QueryError,
    record::{Properties, Record},
    scope::Scope,
};
use model::{
    core::value::Value,
    metadata::{column::ColumnMetadata, table::TableMetadata},
};
use planner::query::{aliased, ast::expr::Expr, qualified};
use std::{fmt, sync::Arc};
use tracing::trace;

pub type Setter<R> = Arc<dyn Fn(&mut R, Value) + Send + Sync>;

pub(crate) const WHOLE_TABLE_PREFIX: &str = "all";

/// Which table a whole-table mapping expands.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TableSource {
    Entity(EntityType),
    Alias(String),
}

pub(crate) enum MappingDecl<R> {
    Direct {
        source: ColumnSource,
        alias: Option<String>,
        setter: Option<Setter<R>>,
    },
    WholeTable {
        source: TableSource,
        target: Option<String>,
        prefix: String,
    },
}

impl<R> MappingDecl<R> {
    /// `index` is the number of mappings declared before this one and
    /// `taken` holds the prefixes of earlier whole-table mappings. The suffix
    /// starts at `index` and grows until the prefix is free.
    pub fn whole_table(
        source: TableSource,
        target: Option<&str>,
        index: usize,
        taken: &[&str],
    ) -> Self {
        let base = target.unwrap_or(WHOLE_TABLE_PREFIX);
        let candidate = |n: usize| match n {
            0 => base.to_string(),
            n => format!("{base}_{n}"),
        };

        let mut suffix = index;
        let mut prefix = candidate(suffix);
        while taken.contains(&prefix.as_str()) {
            suffix += 1;
            prefix = candidate(suffix);
        }

        MappingDecl::WholeTable {
            source,
            target: target.map(str::to_string),
            prefix,
        }
    }
}

pub enum ResolvedMapping<R> {
    Direct {
        alias: String,
        column: ColumnMetadata,
        setter: Option<Setter<R>>,
    },
    WholeTable {
        prefix: String,
        qualifier: String,
        table: Arc<TableMetadata>,
        target: Option<String>,
    },
}

impl<R> fmt::Debug for ResolvedMapping<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedMapping::Direct { alias, column, setter } => f
                .debug_struct("Direct")
                .field("alias", alias)
                .field("column", &column.name)
                .field("setter", &setter.is_some())
                .finish(),
            ResolvedMapping::WholeTable {
                prefix,
                qualifier,
                target,
                ..
            } => f
                .debug_struct("WholeTable")
                .field("prefix", prefix)
                .field("qualifier", qualifier)
                .field("target", target)
                .finish(),
        }
    }
}

impl<R: Record> ResolvedMapping<R> {
    /// Returns the lookup key when this mapping owns `label`.
    pub fn matches<'l>(&self, label: &'l str) -> Option<&'l str> {
        match self {
            ResolvedMapping::Direct { alias, .. } => (label == alias).then_some(label),
            ResolvedMapping::WholeTable { prefix, .. } => match label.split_once('.') {
                Some((head, key)) if head == prefix => Some(key),
                _ => None,
            },
        }
    }

    pub fn apply(&self, record: &mut R, label: &str, key: &str, raw: Value) -> Result<(), QueryError> {
        match self {
            ResolvedMapping::Direct { alias, column, setter } => {
                let value = decode(column, label, raw)?;
                match setter {
                    Some(setter) => setter(record, value),
                    None => assign(record, alias, value, label),
                }
            }
            ResolvedMapping::WholeTable { table, target, .. } => {
                let Some(column) = table.column_by_alias(key) else {
                    trace!("No column [{key}] in [{}], dropping [{label}]", table.name);
                    return Ok(());
                };
                let value = decode(column, label, raw)?;
                match target {
                    None => assign(record, &column.alias, value, label),
                    Some(target) => match record.property_or_new(target) {
                        Some(nested) => assign(nested, &column.alias, value, label),
                        None => trace!("Result has no nested property [{target}], dropping [{label}]"),
                    },
                }
            }
        }
        Ok(())
    }
}

fn decode(column: &ColumnMetadata, label: &str, raw: Value) -> Result<Value, QueryError> {
    column.decode(raw).map_err(|source| QueryError::Decode {
        label: label.to_string(),
        source,
    })
}

fn assign<P: Properties + ?Sized>(target: &mut P, property: &str, value: Value, label: &str) {
    if !target.set_property(property, value) {
        trace!("Result has no property [{property}], dropping [{label}]");
    }
}

fn single_segment(what: &str, name: &str) -> Result<(), QueryError> {
    if name.trim().is_empty() || name.contains('.') {
        return Err(QueryError::InvalidMapping(format!(
            "{what} [{name}] must be a single non-empty segment"
        )));
    }
    Ok(())
}

/// Resolves one declaration into its select expressions and write rule.
pub(crate) fn resolve<R>(
    decl: &MappingDecl<R>,
    scope: &Scope<'_>,
) -> Result<(Vec<Expr>, ResolvedMapping<R>), QueryError> {
    match decl {
        MappingDecl::Direct {
            source,
            alias,
            setter,
        } => {
            let resolved = scope.resolve_source(source)?;
            let alias = match alias {
                Some(alias) => alias.clone(),
                None => resolved.column.alias.clone(),
            };
            single_segment("result alias", &alias)?;

            let expr = aliased(qualified(resolved.qualifier, &resolved.column.name), &alias);
            let mapping = ResolvedMapping::Direct {
                alias,
                column: resolved.column.clone(),
                setter: setter.clone(),
            };
            Ok((vec![expr], mapping))
        }
        MappingDecl::WholeTable {
            source,
            target,
            prefix,
        } => {
            if let Some(target) = target {
                single_segment("target property", target)?;
            }
            let (qualifier, table) = match source {
                TableSource::Entity(entity) => scope.table_of(entity)?,
                TableSource::Alias(alias) => scope.table_for(alias)?,
            };

            let exprs = table
                .columns
                .iter()
                .map(|column| {
                    aliased(
                        qualified(qualifier, &column.name),
                        &format!("{prefix}.{}", column.alias),
                    )
                })
                .collect();

            let mapping = ResolvedMapping::WholeTable {
                prefix: prefix.clone(),
                qualifier: qualifier.to_string(),
                table: Arc::new(table.clone()),
                target: target.clone(),
            };
            Ok((exprs, mapping))
        }
    }
}
