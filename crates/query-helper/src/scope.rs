//! Name resolution while a query is planned: the main table plus the joins
//! registered so far.

use crate::{
    conditional::{ColumnSource, CondDecl, OperandDecl},
    entity::{ColumnRef, EntityType},
    error::QueryError,
    join::{JoinEntry, JoinRegistry},
    rewrite::PathRewriter,
};
use model::{
    metadata::{column::ColumnMetadata, table::TableMetadata},
    query::term::{Operand, Term},
};

/// A column bound to the qualifier it is addressed by.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'a> {
    pub qualifier: &'a str,
    pub column: &'a ColumnMetadata,
}

impl Resolved<'_> {
    pub fn path(&self) -> String {
        format!("{}.{}", self.qualifier, self.column.name)
    }
}

pub(crate) struct Scope<'a> {
    pub from: EntityType,
    pub main: &'a TableMetadata,
    pub joins: &'a JoinRegistry,
    /// Join whose condition is being resolved. Unqualified paths and
    /// references owned by its entity resolve against it.
    pub current: Option<&'a JoinEntry>,
}

impl<'a> Scope<'a> {
    /// The table addressed by a qualifier: the main table name or a join alias.
    pub fn table_for(&self, qualifier: &str) -> Result<(&'a str, &'a TableMetadata), QueryError> {
        if qualifier.eq_ignore_ascii_case(&self.main.name) {
            return Ok((self.main.name.as_str(), self.main));
        }
        let join = self.joins.resolve_by_alias(qualifier)?;
        Ok((join.alias.as_str(), join.table.as_ref()))
    }

    /// The table an entity type resolves to: the main table for the `from`
    /// entity, otherwise the first join registered for that type.
    pub fn table_of(&self, entity: &EntityType) -> Result<(&'a str, &'a TableMetadata), QueryError> {
        if *entity == self.from {
            return Ok((self.main.name.as_str(), self.main));
        }
        let join = self.joins.resolve_by_type(entity)?;
        Ok((join.alias.as_str(), join.table.as_ref()))
    }

    fn default_table(&self) -> (&'a str, &'a TableMetadata) {
        match self.current {
            Some(join) => (join.alias.as_str(), join.table.as_ref()),
            None => (self.main.name.as_str(), self.main),
        }
    }

    pub fn resolve_path(&self, path: &str) -> Result<Resolved<'a>, QueryError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(QueryError::InvalidPath(path.to_string()));
        }
        let ((qualifier, table), column) = match segments.as_slice() {
            [column] => (self.default_table(), *column),
            [qualifier, column] => (self.table_for(qualifier)?, *column),
            _ => return Err(QueryError::InvalidPath(path.to_string())),
        };
        column_in(qualifier, table, column)
    }

    pub fn resolve_ref(&self, column: &ColumnRef) -> Result<Resolved<'a>, QueryError> {
        let (qualifier, table) = match self.current {
            Some(join) if join.entity.as_ref() == Some(&column.owner) => {
                (join.alias.as_str(), join.table.as_ref())
            }
            _ => self.table_of(&column.owner)?,
        };
        column_in(qualifier, table, column.column)
    }

    pub fn resolve_source(&self, source: &ColumnSource) -> Result<Resolved<'a>, QueryError> {
        match source {
            ColumnSource::Path(path) => self.resolve_path(path),
            ColumnSource::Ref(column) => self.resolve_ref(column),
        }
    }

    /// Resolves a filter column to its qualified path. Paths pass through
    /// the rewriter first; typed references do not need it.
    pub fn qualify(
        &self,
        source: &ColumnSource,
        rewriter: Option<&PathRewriter>,
    ) -> Result<String, QueryError> {
        match (source, rewriter) {
            (ColumnSource::Path(path), Some(rewriter)) => {
                Ok(self.resolve_path(&rewriter.rewrite(path))?.path())
            }
            _ => Ok(self.resolve_source(source)?.path()),
        }
    }

    pub fn resolve_terms(
        &self,
        decls: &[CondDecl],
        rewriter: Option<&PathRewriter>,
    ) -> Result<Vec<Term>, QueryError> {
        decls
            .iter()
            .map(|decl| self.resolve_term(decl, rewriter))
            .collect()
    }

    fn resolve_term(
        &self,
        decl: &CondDecl,
        rewriter: Option<&PathRewriter>,
    ) -> Result<Term, QueryError> {
        match decl {
            CondDecl::Leaf {
                link,
                column,
                term_type,
                operand,
            } => {
                let value = match operand {
                    OperandDecl::Fixed(operand) => operand.clone(),
                    OperandDecl::Column(right) => Operand::Column(self.qualify(right, rewriter)?),
                };
                let column = self.qualify(column, rewriter)?;
                Ok(Term::leaf(&column, *term_type, value).with_link(*link))
            }
            CondDecl::Group { link, terms } => {
                Ok(Term::group(*link, self.resolve_terms(terms, rewriter)?))
            }
            CondDecl::Raw(term) => self.resolve_raw(term.clone(), rewriter),
        }
    }

    /// Qualifies every column of a prebuilt term tree.
    pub fn resolve_raw(
        &self,
        mut term: Term,
        rewriter: Option<&PathRewriter>,
    ) -> Result<Term, QueryError> {
        term.try_for_each_column(&mut |column: &mut String| {
            let source = ColumnSource::Path(std::mem::take(column));
            *column = self.qualify(&source, rewriter)?;
            Ok::<(), QueryError>(())
        })?;
        Ok(term)
    }
}

fn column_in<'a>(
    qualifier: &'a str,
    table: &'a TableMetadata,
    column: &str,
) -> Result<Resolved<'a>, QueryError> {
    table
        .column(column)
        .map(|column| Resolved { qualifier, column })
        .ok_or_else(|| QueryError::ColumnNotFound {
            table: table.name.clone(),
            column: column.to_string(),
        })
}
