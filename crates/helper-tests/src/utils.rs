#![allow(dead_code)]

use async_trait::async_trait;
use futures::{StreamExt, stream};
use model::{
    core::{data_type::DataType, value::Value},
    metadata::{column::ColumnMetadata, table::TableMetadata},
    records::row::{FieldValue, RowData},
};
use planner::query::ast::{expr::Expr, select::Select};
use query_helper::{
    QueryHelper,
    entity::Entity,
    executor::{ExecutorError, QueryExecutor, RowStream},
    metadata::SchemaMetadata,
    record::Properties,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Barrier;

pub const COUNT_ALIAS: &str = "_total";

pub struct User;
impl Entity for User {
    const TABLE: &'static str = "users";
}

pub struct Post;
impl Entity for Post {
    const TABLE: &'static str = "posts";
}

pub struct Author;
impl Entity for Author {
    const TABLE: &'static str = "authors";
}

pub struct Tag;
impl Entity for Tag {
    const TABLE: &'static str = "tags";
    const SCHEMA: Option<&'static str> = Some("blog");
}

/// users(id, user_name -> name, status), posts(id, user_id, author_id,
/// status, title, published), authors(id, pen_name -> name),
/// blog.tags(id, post_id, label).
pub fn schema() -> SchemaMetadata {
    SchemaMetadata::new()
        .with_table(TableMetadata::new(
            "users",
            vec![
                ColumnMetadata::new("id", DataType::Long).primary_key(),
                ColumnMetadata::new("user_name", DataType::VarChar).with_alias("name"),
                ColumnMetadata::new("status", DataType::Int),
            ],
        ))
        .with_table(TableMetadata::new(
            "posts",
            vec![
                ColumnMetadata::new("id", DataType::Long).primary_key(),
                ColumnMetadata::new("user_id", DataType::Long),
                ColumnMetadata::new("author_id", DataType::Long),
                ColumnMetadata::new("status", DataType::Int),
                ColumnMetadata::new("title", DataType::VarChar),
                ColumnMetadata::new("published", DataType::Boolean),
            ],
        ))
        .with_table(TableMetadata::new(
            "authors",
            vec![
                ColumnMetadata::new("id", DataType::Long).primary_key(),
                ColumnMetadata::new("pen_name", DataType::VarChar).with_alias("name"),
            ],
        ))
        .with_table(
            TableMetadata::new(
                "tags",
                vec![
                    ColumnMetadata::new("id", DataType::Long).primary_key(),
                    ColumnMetadata::new("post_id", DataType::Long),
                    ColumnMetadata::new("label", DataType::VarChar),
                ],
            )
            .with_schema("blog"),
        )
}

pub fn helper(executor: Arc<MemoryExecutor>) -> QueryHelper {
    QueryHelper::new(executor, Arc::new(schema()))
}

pub fn row(fields: &[(&str, Value)]) -> RowData {
    RowData::new(
        fields
            .iter()
            .map(|(name, value)| FieldValue::new(name, value.clone()))
            .collect(),
    )
}

/// Scripted executor. Records every query it receives, answers data
/// queries with fixed rows and count queries with a fixed value.
#[derive(Default)]
pub struct MemoryExecutor {
    rows: Vec<RowData>,
    count: Option<Value>,
    gate: Option<Barrier>,
    failure: Option<String>,
    queries: Mutex<Vec<Select>>,
    in_flight: AtomicUsize,
    served: AtomicUsize,
}

/// Counts a query as in flight until its future completes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<RowData>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_count(mut self, count: impl Into<Value>) -> Self {
        self.count = Some(count.into());
        self
    }

    /// Every query waits until `parties` queries are in flight at once.
    pub fn gated(mut self, parties: usize) -> Self {
        self.gate = Some(Barrier::new(parties));
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn queries(&self) -> Vec<Select> {
        self.queries.lock().unwrap().clone()
    }

    /// Queries received but not yet answered or cancelled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Queries that got past the gate and returned a row stream.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    pub fn count_queries(&self) -> usize {
        self.queries().iter().filter(|q| is_count(q)).count()
    }

    pub fn data_queries(&self) -> Vec<Select> {
        self.queries().into_iter().filter(|q| !is_count(q)).collect()
    }
}

fn is_count(query: &Select) -> bool {
    matches!(
        query.columns.as_slice(),
        [Expr::Alias { expr, .. }] if matches!(**expr, Expr::FunctionCall(_))
    )
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch(&self, query: Select) -> Result<RowStream, ExecutorError> {
        let count = is_count(&query);
        let label = query.column_labels().first().map(|l| l.to_string());
        self.queries.lock().unwrap().push(query);
        let _in_flight = InFlight::enter(&self.in_flight);

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(message) = &self.failure {
            return Err(ExecutorError::Sql(message.clone()));
        }
        self.served.fetch_add(1, Ordering::SeqCst);

        let rows = match (count, &self.count, label) {
            (true, Some(total), Some(label)) => vec![row(&[(label.as_str(), total.clone())])],
            (true, _, _) => Vec::new(),
            (false, _, _) => self.rows.clone(),
        };
        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AuthorView {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl Properties for AuthorView {
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        match name {
            "id" => self.id = value.as_i64(),
            "name" => self.name = value.as_string(),
            _ => return false,
        }
        true
    }

    fn property_or_new(&mut self, _name: &str) -> Option<&mut dyn Properties> {
        None
    }
}

#[derive(Debug, Default)]
pub struct PostView {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub published: Option<bool>,
    pub author: Option<AuthorView>,
    pub authors_created: usize,
}

impl Properties for PostView {
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        match name {
            "id" => self.id = value.as_i64(),
            "title" => self.title = value.as_string(),
            "published" => self.published = value.as_bool(),
            _ => return false,
        }
        true
    }

    fn property_or_new(&mut self, name: &str) -> Option<&mut dyn Properties> {
        match name {
            "author" => {
                if self.author.is_none() {
                    self.authors_created += 1;
                }
                Some(self.author.get_or_insert_with(AuthorView::default))
            }
            _ => None,
        }
    }
}
