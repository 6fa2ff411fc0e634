//! The single resolution step: declarations in, executable plan out.

use crate::{
    conditional::{ColumnSource, CondDecl},
    entity::EntityType,
    error::QueryError,
    join::{JoinDecl, JoinEntry, JoinRegistry, JoinTarget},
    mapping::{self, MappingDecl, ResolvedMapping, TableSource},
    metadata::TableCache,
    rewrite::PathRewriter,
    scope::Scope,
    wrapper::RowWrapper,
};
use model::{metadata::table::TableMetadata, pagination::page::PageWindow, query::sort::SortOrder};
use planner::{
    query::{
        ast::{common::OrderDir, expr::Expr, select::Select},
        builder::select::{FromState, SelectBuilder},
        column_path, count_all,
    },
    table_ref,
};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct SortDecl {
    pub source: ColumnSource,
    pub order: SortOrder,
}

/// Everything a query spec accumulates before it is planned.
pub(crate) struct Declarations<R> {
    pub from: EntityType,
    pub mappings: Vec<MappingDecl<R>>,
    pub joins: Vec<JoinDecl>,
    pub filters: Vec<CondDecl>,
    pub sorts: Vec<SortDecl>,
}

impl<R> Declarations<R> {
    pub fn new(from: EntityType, mappings: Vec<MappingDecl<R>>) -> Self {
        Declarations {
            from,
            mappings,
            joins: Vec::new(),
            filters: Vec::new(),
            sorts: Vec::new(),
        }
    }
}

/// A resolved query: the base plan without result columns, the columns every
/// mapping contributes, and the wrapper that reads them back.
pub struct QueryPlan<R> {
    base: SelectBuilder<FromState>,
    columns: Vec<Expr>,
    wrapper: RowWrapper<R>,
}

impl<R> QueryPlan<R> {
    /// Clones the base plan, applies the mapping columns in declaration
    /// order and bounds it to `window` when given.
    pub fn data_query(&self, window: Option<PageWindow>) -> Select {
        let builder = self.base.clone().columns(self.columns.iter().cloned());
        match window {
            Some(window) => builder.limit(window.size).offset(window.offset()).build(),
            None => builder.build(),
        }
    }

    /// `SELECT COUNT(*) AS <alias>` over the same joins and filters.
    pub fn count_query(&self, alias: &str) -> Select {
        self.base
            .clone()
            .replace_columns(vec![count_all(alias)])
            .clear_order_by()
            .unbounded()
            .build()
    }

    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    pub fn wrapper(&self) -> &RowWrapper<R> {
        &self.wrapper
    }
}

pub(crate) fn build<R: crate::record::Record>(
    decls: &Declarations<R>,
    tables: &TableCache,
) -> Result<QueryPlan<R>, QueryError> {
    let main = tables.resolve(&decls.from)?;
    let joins = resolve_joins(decls, &main, tables)?;

    let scope = Scope {
        from: decls.from,
        main: &main,
        joins: &joins,
        current: None,
    };

    let implicit;
    let mapping_decls: &[MappingDecl<R>] = if decls.mappings.is_empty() {
        implicit = [MappingDecl::whole_table(TableSource::Entity(decls.from), None, 0, &[])];
        &implicit
    } else {
        &decls.mappings
    };

    let mut columns = Vec::new();
    let mut resolved = Vec::with_capacity(mapping_decls.len());
    let mut rewriter = PathRewriter::new();
    let mut aliases = HashSet::new();

    for decl in mapping_decls {
        let (exprs, mapping) = mapping::resolve(decl, &scope)?;
        match &mapping {
            ResolvedMapping::Direct { alias, .. } => {
                if !aliases.insert(alias.clone()) {
                    return Err(QueryError::InvalidMapping(format!(
                        "duplicate result alias [{alias}]"
                    )));
                }
            }
            ResolvedMapping::WholeTable {
                qualifier,
                target: Some(target),
                ..
            } => rewriter.register(target, qualifier),
            ResolvedMapping::WholeTable { .. } => {}
        }
        columns.extend(exprs);
        resolved.push(mapping);
    }

    let terms = scope.resolve_terms(&decls.filters, Some(&rewriter))?;

    let mut base = SelectBuilder::new()
        .select(Vec::new())
        .from(table_ref!(main.schema.as_deref(), &main.name), None);

    for entry in joins.entries() {
        base = base.join(
            entry.kind,
            table_ref!(entry.table.schema.as_deref(), &entry.table.name),
            Some(&entry.alias),
            entry.on.clone(),
        );
    }

    base = base.terms(terms);

    for sort in &decls.sorts {
        let path = scope.qualify(&sort.source, Some(&rewriter))?;
        base = base.order_by(column_path(&path), Some(OrderDir::from(sort.order)));
    }

    debug!(
        "Planned query on [{}] with {} join(s) and {} mapping(s)",
        main.name,
        joins.len(),
        resolved.len()
    );

    Ok(QueryPlan {
        base,
        columns,
        wrapper: RowWrapper::new(resolved),
    })
}

/// Registers joins in declaration order. Each condition resolves right after
/// its own join is registered, so it sees earlier joins and itself only.
fn resolve_joins<R>(
    decls: &Declarations<R>,
    main: &TableMetadata,
    tables: &TableCache,
) -> Result<JoinRegistry, QueryError> {
    let mut joins = JoinRegistry::new();

    for decl in &decls.joins {
        let table = match &decl.target {
            JoinTarget::Entity(entity) => tables.resolve(entity)?,
            JoinTarget::Table { schema, name } => tables.resolve_name(schema.as_deref(), name)?,
        };
        joins.register(
            JoinEntry {
                entity: decl.entity(),
                table,
                alias: decl.alias.clone(),
                kind: decl.kind,
                on: Vec::new(),
            },
            &main.name,
        )?;

        let on = Scope {
            from: decls.from,
            main,
            joins: &joins,
            current: joins.entries().last(),
        }
        .resolve_terms(&decl.on, None)?;

        if let Some(entry) = joins.last_mut() {
            entry.on = on;
        }
    }

    Ok(joins)
}
