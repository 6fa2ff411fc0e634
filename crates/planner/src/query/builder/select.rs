//! Provides a type-safe, fluent builder for constructing `Select` ASTs.

// --- Typestate Marker Structs ---
// These zero-sized structs represent the state of the builder.
// They ensure that methods are called in the correct SQL order at compile time.

use crate::query::ast::{
    common::{JoinKind, OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, JoinClause, OrderByExpr, Select},
};
use model::query::term::Term;

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

// --- The Main Builder ---

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implementation for the initial state of the builder.
impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            state: InitialState,
        }
    }

    /// Adds a `SELECT` clause with a list of columns. The list may start
    /// empty and be extended later through [`SelectBuilder::columns`].
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            state: SelectState,
        }
    }
}

/// Implementation for the state after `SELECT` has been called.
/// The only valid next step is to specify a `FROM` table.
impl SelectBuilder<SelectState> {
    /// Adds a `FROM` clause specifying the primary table.
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            state: FromState,
        }
    }
}

/// Implementation for the state after `FROM` has been called.
/// From here, we can add optional clauses like `JOIN`, `WHERE`, etc.
impl SelectBuilder<FromState> {
    /// Appends columns to the `SELECT` list.
    pub fn columns(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.ast.columns.extend(columns);
        self
    }

    /// Replaces the `SELECT` list.
    pub fn replace_columns(mut self, columns: Vec<Expr>) -> Self {
        self.ast.columns = columns;
        self
    }

    /// Adds a `JOIN` clause to the query.
    pub fn join(
        mut self,
        kind: JoinKind,
        table: TableRef,
        alias: Option<&str>,
        on: Vec<Term>,
    ) -> Self {
        self.ast.joins.push(JoinClause {
            kind,
            table,
            alias: alias.map(String::from),
            on,
        });
        self
    }

    /// Appends filter terms. They are linked to the existing ones by each
    /// term's own link.
    pub fn terms(mut self, terms: impl IntoIterator<Item = Term>) -> Self {
        self.ast.terms.extend(terms);
        self
    }

    /// Adds an `ORDER BY` clause to the query.
    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    pub fn clear_order_by(mut self) -> Self {
        self.ast.order_by.clear();
        self
    }

    /// Adds a `LIMIT` clause to the query.
    pub fn limit(mut self, limit: usize) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    /// Adds an `OFFSET` clause to the query.
    pub fn offset(mut self, offset: usize) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    /// Drops `LIMIT` and `OFFSET`.
    pub fn unbounded(mut self) -> Self {
        self.ast.limit = None;
        self.ast.offset = None;
        self
    }

    pub fn ast(&self) -> &Select {
        &self.ast
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            ast::common::{JoinKind, OrderDir},
            builder::select::SelectBuilder,
            ident, qualified,
        },
        table_ref,
    };
    use model::query::term::Term;

    #[test]
    fn test_build_simple_select() {
        let ast = SelectBuilder::new()
            .select(vec![ident("id"), ident("name")])
            .from(table_ref!("users"), None)
            .build();

        assert_eq!(ast.columns, vec![ident("id"), ident("name")]);
        assert_eq!(ast.from.unwrap().table.name, "users");
        assert!(ast.terms.is_empty());
    }

    #[test]
    fn test_build_with_terms() {
        let ast = SelectBuilder::new()
            .select(vec![ident("email")])
            .from(table_ref!("users"), Some("u"))
            .terms(vec![Term::eq("u.status", "active")])
            .build();

        assert_eq!(ast.from.unwrap().alias, Some("u".to_string()));
        assert_eq!(ast.terms.len(), 1);
    }

    #[test]
    fn test_build_with_join_and_ordering() {
        let ast = SelectBuilder::new()
            .select(vec![qualified("u", "name"), qualified("p", "title")])
            .from(table_ref!("users"), Some("u"))
            .join(
                JoinKind::Left,
                table_ref!("posts"),
                Some("p"),
                vec![Term::leaf(
                    "p.user_id",
                    model::query::term::TermType::Eq,
                    model::query::term::Operand::Column("u.id".into()),
                )],
            )
            .order_by(qualified("p", "created_at"), Some(OrderDir::Desc))
            .build();

        assert_eq!(ast.joins.len(), 1);
        assert!(ast.join("p").is_some());
        assert_eq!(ast.order_by[0].direction, Some(OrderDir::Desc));
    }

    #[test]
    fn test_clone_then_extend_leaves_base_untouched() {
        let base = SelectBuilder::new()
            .select(vec![])
            .from(table_ref!("products"), None)
            .order_by(ident("id"), None);

        let page = base.clone().columns(vec![ident("id")]).limit(50).offset(100).build();
        let count = base.clone().clear_order_by().build();

        assert_eq!((page.limit, page.offset), (Some(50), Some(100)));
        assert!(count.order_by.is_empty());
        assert!(base.ast().columns.is_empty());
        assert_eq!(base.ast().order_by.len(), 1);
    }
}
