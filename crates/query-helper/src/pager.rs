//! Pagination Orchestrator: one count query and one bounded data query,
//! run concurrently and merged into a `PagerResult`.

use crate::{
    error::QueryError,
    executor::{QueryExecutor, RowStream},
    plan::QueryPlan,
    record::Record,
    wrapper::RowWrapper,
};
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use model::pagination::page::{PageWindow, PagerResult};
use tracing::{debug, trace};

pub type RecordStream<R> = BoxStream<'static, Result<R, QueryError>>;

pub(crate) fn wrap_rows<R: Record>(rows: RowStream, wrapper: RowWrapper<R>) -> RecordStream<R> {
    rows.map(move |row| {
        row.map_err(QueryError::from)
            .and_then(|row| wrapper.wrap(row))
    })
    .boxed()
}

pub(crate) async fn fetch_rows<R: Record>(
    executor: &dyn QueryExecutor,
    plan: &QueryPlan<R>,
    window: Option<PageWindow>,
) -> Result<RecordStream<R>, QueryError> {
    let query = plan.data_query(window);
    debug!("Fetching {} column(s), window {:?}", query.columns.len(), window);
    let rows = executor.fetch(query).await?;
    Ok(wrap_rows(rows, plan.wrapper().clone()))
}

/// Fetches one page. A known `total` replaces the count query entirely.
pub(crate) async fn fetch_page<R: Record>(
    executor: &dyn QueryExecutor,
    plan: &QueryPlan<R>,
    window: PageWindow,
    total: Option<u64>,
    count_alias: &str,
) -> Result<PagerResult<R>, QueryError> {
    let data = async {
        let rows = fetch_rows(executor, plan, Some(window)).await?;
        rows.try_collect::<Vec<R>>().await
    };

    if let Some(total) = total {
        debug!("Using supplied total {total}, count query skipped");
        return Ok(PagerResult::new(total, data.await?, window));
    }

    let count = async {
        let value = executor
            .fetch_value(plan.count_query(count_alias), count_alias)
            .await?;
        Ok::<_, QueryError>(match value.as_ref().and_then(|v| v.as_u64()) {
            Some(total) => total,
            None => {
                trace!("Count query returned {value:?}, using 0");
                0
            }
        })
    };

    let (total, data) = futures::try_join!(count, data)?;
    Ok(PagerResult::new(total, data, window))
}
