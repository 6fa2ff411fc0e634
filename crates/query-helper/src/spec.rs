//! The fluent query surface.
//!
//! A query is declared in stages. [`SelectSpec`] collects column mappings
//! until `from` names the main entity. The resulting [`QuerySpec`] starts in
//! the [`Joining`] stage (joins, filters, ordering, fetch); adding filters
//! or ordering moves it to [`Sorting`], where only ordering and fetching
//! remain. Nothing is resolved until [`QuerySpec::plan`] runs, which every
//! fetch does first.

use crate::{
    QueryHelper,
    conditional::{ColumnSource, Conditional, CondDecl},
    entity::{ColumnRef, Entity, EntityType},
    error::QueryError,
    join::{JoinConditional, JoinDecl, JoinTarget},
    mapping::{MappingDecl, Setter, TableSource},
    pager::{self, RecordStream},
    plan::{self, Declarations, QueryPlan, SortDecl},
    record::Record,
};
use futures::TryStreamExt;
use model::{
    core::value::Value,
    pagination::page::{PageWindow, PagerResult},
    query::{param::QueryParam, sort::SortOrder},
};
use planner::query::{ast::common::JoinKind, dialect::Dialect, renderer::to_sql};
use std::{marker::PhantomData, sync::Arc};

mod private {
    pub trait Sealed {}
}

/// Stage of a [`QuerySpec`] that can still fetch.
pub trait Stage: private::Sealed {}

/// Joins, filters and ordering may be added.
#[derive(Debug)]
pub struct Joining;

/// Filters are set; only ordering may be added.
#[derive(Debug)]
pub struct Sorting;

impl private::Sealed for Joining {}
impl private::Sealed for Sorting {}
impl Stage for Joining {}
impl Stage for Sorting {}

/// Column mappings declared before the main entity is known.
pub struct SelectSpec<R> {
    helper: QueryHelper,
    mappings: Vec<MappingDecl<R>>,
}

impl<R: Record> SelectSpec<R> {
    pub(crate) fn new(helper: QueryHelper) -> Self {
        SelectSpec {
            helper,
            mappings: Vec::new(),
        }
    }

    /// Selects one column into the property named after the column's alias.
    pub fn column(self, source: impl Into<ColumnSource>) -> Self {
        self.push_direct(source.into(), None, None)
    }

    /// Selects one column into `property`.
    pub fn column_as(self, source: impl Into<ColumnSource>, property: &str) -> Self {
        self.push_direct(source.into(), Some(property.to_string()), None)
    }

    /// Selects one column under the result label `alias` and hands every
    /// decoded value to `setter`.
    pub fn column_with(
        self,
        source: impl Into<ColumnSource>,
        alias: &str,
        setter: impl Fn(&mut R, Value) + Send + Sync + 'static,
    ) -> Self {
        let setter: Setter<R> = Arc::new(setter);
        self.push_direct(source.into(), Some(alias.to_string()), Some(setter))
    }

    /// Every column of the table of `E` onto the result itself.
    pub fn all<E: Entity>(self) -> Self {
        self.push_whole_table(TableSource::Entity(EntityType::of::<E>()), None)
    }

    /// Every column of the table of `E` onto the nested object `target`.
    pub fn all_as<E: Entity>(self, target: &str) -> Self {
        self.push_whole_table(TableSource::Entity(EntityType::of::<E>()), Some(target))
    }

    /// Every column of the join (or main table) named `alias`.
    pub fn all_from(self, alias: &str) -> Self {
        self.push_whole_table(TableSource::Alias(alias.to_string()), None)
    }

    pub fn all_from_as(self, alias: &str, target: &str) -> Self {
        self.push_whole_table(TableSource::Alias(alias.to_string()), Some(target))
    }

    /// Names the main entity. Without any mapping every column of its table
    /// is selected onto the result.
    pub fn from<E: Entity>(self) -> QuerySpec<R, Joining> {
        QuerySpec {
            helper: self.helper,
            decls: Declarations::new(EntityType::of::<E>(), self.mappings),
            param: None,
            _stage: PhantomData,
        }
    }

    fn push_direct(
        mut self,
        source: ColumnSource,
        alias: Option<String>,
        setter: Option<Setter<R>>,
    ) -> Self {
        self.mappings.push(MappingDecl::Direct {
            source,
            alias,
            setter,
        });
        self
    }

    fn push_whole_table(mut self, source: TableSource, target: Option<&str>) -> Self {
        let index = self.mappings.len();
        let taken: Vec<&str> = self
            .mappings
            .iter()
            .filter_map(|decl| match decl {
                MappingDecl::WholeTable { prefix, .. } => Some(prefix.as_str()),
                MappingDecl::Direct { .. } => None,
            })
            .collect();
        let decl = MappingDecl::whole_table(source, target, index, &taken);
        self.mappings.push(decl);
        self
    }
}

pub struct QuerySpec<R, S = Joining> {
    helper: QueryHelper,
    decls: Declarations<R>,
    param: Option<QueryParam>,
    _stage: PhantomData<S>,
}

impl<R: Record> QuerySpec<R, Joining> {
    pub fn join<E: Entity>(
        self,
        kind: JoinKind,
        on: impl FnOnce(JoinConditional) -> JoinConditional,
    ) -> Self {
        self.push_join(JoinTarget::Entity(EntityType::of::<E>()), kind, on)
    }

    pub fn inner_join<E: Entity>(self, on: impl FnOnce(JoinConditional) -> JoinConditional) -> Self {
        self.join::<E>(JoinKind::Inner, on)
    }

    pub fn left_join<E: Entity>(self, on: impl FnOnce(JoinConditional) -> JoinConditional) -> Self {
        self.join::<E>(JoinKind::Left, on)
    }

    pub fn right_join<E: Entity>(self, on: impl FnOnce(JoinConditional) -> JoinConditional) -> Self {
        self.join::<E>(JoinKind::Right, on)
    }

    pub fn full_join<E: Entity>(self, on: impl FnOnce(JoinConditional) -> JoinConditional) -> Self {
        self.join::<E>(JoinKind::Full, on)
    }

    /// Joins a table that has no entity type. It can only be addressed by
    /// its alias. `table` is `name` or `schema.name`.
    pub fn join_table(
        self,
        kind: JoinKind,
        table: &str,
        on: impl FnOnce(JoinConditional) -> JoinConditional,
    ) -> Self {
        let target = match table.split_once('.') {
            Some((schema, name)) => JoinTarget::Table {
                schema: Some(schema.to_string()),
                name: name.to_string(),
            },
            None => JoinTarget::Table {
                schema: None,
                name: table.to_string(),
            },
        };
        self.push_join(target, kind, on)
    }

    pub fn where_(
        mut self,
        conditions: impl FnOnce(Conditional) -> Conditional,
    ) -> QuerySpec<R, Sorting> {
        self.decls.filters = conditions(Conditional::default()).into_decls();
        self.into_stage()
    }

    /// Applies caller-supplied filter parameters: their terms filter, their
    /// sorts order, and their window and total drive paged fetches.
    pub fn where_param(mut self, param: &QueryParam) -> QuerySpec<R, Sorting> {
        let param = param.clone();
        self.decls
            .filters
            .extend(param.terms.iter().cloned().map(CondDecl::Raw));
        self.decls
            .sorts
            .extend(param.sorts.iter().map(|sort| SortDecl {
                source: ColumnSource::Path(sort.column.clone()),
                order: sort.order,
            }));
        self.param = Some(param);
        self.into_stage()
    }

    fn push_join(
        mut self,
        target: JoinTarget,
        kind: JoinKind,
        on: impl FnOnce(JoinConditional) -> JoinConditional,
    ) -> Self {
        let alias = self.helper.config().join_alias(self.decls.joins.len());
        self.decls
            .joins
            .push(JoinDecl::declare(target, kind, alias, on));
        self
    }
}

impl<R: Record, S: Stage> QuerySpec<R, S> {
    pub fn order_by(mut self, path: &str, order: SortOrder) -> QuerySpec<R, Sorting> {
        self.decls.sorts.push(SortDecl {
            source: ColumnSource::Path(path.to_string()),
            order,
        });
        self.into_stage()
    }

    pub fn order_by_ref(mut self, column: ColumnRef, order: SortOrder) -> QuerySpec<R, Sorting> {
        self.decls.sorts.push(SortDecl {
            source: ColumnSource::Ref(column),
            order,
        });
        self.into_stage()
    }

    pub fn param(&self) -> Option<&QueryParam> {
        self.param.as_ref()
    }

    /// Resolves every join, mapping, filter and sort. Configuration errors
    /// surface here, before anything reaches the executor.
    pub fn plan(&self) -> Result<QueryPlan<R>, QueryError> {
        plan::build(&self.decls, self.helper.tables())
    }

    /// Renders the data query `fetch` would run.
    pub fn render(&self, dialect: &dyn Dialect) -> Result<(String, Vec<Value>), QueryError> {
        let query = self.plan()?.data_query(self.param_window());
        Ok(to_sql(&query, dialect))
    }

    /// Streams every matching row. Filter parameters with paging enabled
    /// bound the query to their window.
    pub async fn fetch(&self) -> Result<RecordStream<R>, QueryError> {
        let plan = self.plan()?;
        pager::fetch_rows(self.helper.executor(), &plan, self.param_window()).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<R>, QueryError> {
        self.fetch().await?.try_collect().await
    }

    /// Fetches one page using the window of the filter parameters, or the
    /// configured default window when there are none.
    pub async fn fetch_paged(&self) -> Result<PagerResult<R>, QueryError> {
        let window = match &self.param {
            Some(param) => PageWindow::new(param.page_index, param.page_size),
            None => self.helper.config().default_window(),
        };
        self.fetch_window(window).await
    }

    pub async fn fetch_paged_at(
        &self,
        page_index: usize,
        page_size: usize,
    ) -> Result<PagerResult<R>, QueryError> {
        self.fetch_window(PageWindow::new(page_index, page_size))
            .await
    }

    async fn fetch_window(&self, window: PageWindow) -> Result<PagerResult<R>, QueryError> {
        let plan = self.plan()?;
        let total = self.param.as_ref().and_then(|param| param.total);
        pager::fetch_page(
            self.helper.executor(),
            &plan,
            window,
            total,
            &self.helper.config().count_alias,
        )
        .await
    }

    fn param_window(&self) -> Option<PageWindow> {
        self.param
            .as_ref()
            .filter(|param| param.paging)
            .map(|param| PageWindow::new(param.page_index, param.page_size))
    }

    fn into_stage<T: Stage>(self) -> QuerySpec<R, T> {
        QuerySpec {
            helper: self.helper,
            decls: self.decls,
            param: self.param,
            _stage: PhantomData,
        }
    }
}
