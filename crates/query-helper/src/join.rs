//! Join declarations and the per-query join registry.

use crate::{
    conditional::{ColumnSource, CondDecl, Conditional, Conditions},
    entity::EntityType,
    error::QueryError,
};
use model::{
    metadata::table::TableMetadata,
    query::term::{Term, TermType},
};
use planner::query::ast::common::JoinKind;
use std::sync::Arc;

/// Builder handed to a join's `on` callback. Shares the condition DSL and
/// can override the generated alias.
pub struct JoinConditional {
    inner: Conditional,
    alias: String,
}

impl JoinConditional {
    pub(crate) fn new(alias: String) -> Self {
        JoinConditional {
            inner: Conditional::new(),
            alias,
        }
    }

    /// Replaces the generated alias of the join being declared.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    pub fn current_alias(&self) -> &str {
        &self.alias
    }

    /// Compares `left` with `column` of the join registered as `alias`.
    pub fn apply_column_in(
        self,
        left: impl Into<ColumnSource>,
        term_type: TermType,
        alias: &str,
        column: &str,
    ) -> Self {
        self.apply_column(left, term_type, format!("{alias}.{column}"))
    }
}

impl Conditions for JoinConditional {
    fn conditional(&mut self) -> &mut Conditional {
        &mut self.inner
    }
}

/// What a join attaches: an entity type, or a table addressed only by alias.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JoinTarget {
    Entity(EntityType),
    Table { schema: Option<String>, name: String },
}

/// A join as declared, before any metadata is resolved.
#[derive(Debug, Clone)]
pub(crate) struct JoinDecl {
    pub target: JoinTarget,
    pub alias: String,
    pub kind: JoinKind,
    pub on: Vec<CondDecl>,
}

impl JoinDecl {
    /// Runs the `on` callback right away; the alias it ends with is final.
    pub fn declare(
        target: JoinTarget,
        kind: JoinKind,
        alias: String,
        on: impl FnOnce(JoinConditional) -> JoinConditional,
    ) -> Self {
        let spec = on(JoinConditional::new(alias));
        JoinDecl {
            target,
            alias: spec.alias,
            kind,
            on: spec.inner.into_decls(),
        }
    }

    pub fn entity(&self) -> Option<EntityType> {
        match &self.target {
            JoinTarget::Entity(entity) => Some(*entity),
            JoinTarget::Table { .. } => None,
        }
    }
}

/// A resolved join.
#[derive(Debug, Clone)]
pub struct JoinEntry {
    pub entity: Option<EntityType>,
    pub table: Arc<TableMetadata>,
    pub alias: String,
    pub kind: JoinKind,
    pub on: Vec<Term>,
}

/// Joins of one query in declaration order.
#[derive(Debug, Default)]
pub struct JoinRegistry {
    entries: Vec<JoinEntry>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a join. `main_table` is the name the main table is
    /// addressed by, which no join alias may shadow.
    pub fn register(&mut self, entry: JoinEntry, main_table: &str) -> Result<&JoinEntry, QueryError> {
        if entry.alias.is_empty() || entry.alias.contains('.') {
            return Err(QueryError::InvalidPath(entry.alias));
        }
        if entry.alias.eq_ignore_ascii_case(main_table)
            || self.entries.iter().any(|e| e.alias.eq_ignore_ascii_case(&entry.alias))
        {
            return Err(QueryError::DuplicateAlias(entry.alias));
        }
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// First join registered for the given entity type.
    pub fn resolve_by_type(&self, entity: &EntityType) -> Result<&JoinEntry, QueryError> {
        self.entries
            .iter()
            .find(|e| e.entity.as_ref() == Some(entity))
            .ok_or_else(|| QueryError::type_not_found(entity.type_name()))
    }

    pub fn resolve_by_alias(&self, alias: &str) -> Result<&JoinEntry, QueryError> {
        self.find_alias(alias)
            .ok_or_else(|| QueryError::alias_not_found(alias))
    }

    pub(crate) fn find_alias(&self, alias: &str) -> Option<&JoinEntry> {
        self.entries
            .iter()
            .find(|e| e.alias.eq_ignore_ascii_case(alias))
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut JoinEntry> {
        self.entries.last_mut()
    }

    pub fn entries(&self) -> &[JoinEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
