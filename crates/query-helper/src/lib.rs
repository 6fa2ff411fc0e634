pub mod conditional;
pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod helper;
pub mod join;
pub mod mapping;
pub mod metadata;
pub mod pager;
pub mod plan;
pub mod record;
pub mod rewrite;
pub(crate) mod scope;
pub mod spec;
pub mod wrapper;

pub use helper::QueryHelper;

pub mod prelude {
    pub use crate::{
        QueryHelper, col,
        conditional::{ColumnSource, Conditional, Conditions},
        entity::{ColumnRef, Entity},
        error::QueryError,
        executor::{QueryExecutor, RowStream},
        join::JoinConditional,
        record::{DynamicRecord, Properties, Record},
        spec::{Joining, QuerySpec, SelectSpec, Sorting},
    };
    pub use model::{
        core::value::Value,
        query::{param::QueryParam, sort::SortOrder, term::TermType},
    };
    pub use planner::query::ast::common::JoinKind;
}
