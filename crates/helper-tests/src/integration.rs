#[cfg(test)]
mod tests {
    use crate::utils::{
        Author, AuthorView, COUNT_ALIAS, MemoryExecutor, Post, PostView, Tag, User, helper, row,
        schema,
    };
    use futures::TryStreamExt;
    use model::{
        core::value::Value,
        pagination::page::PageWindow,
        query::{
            param::QueryParam,
            sort::SortOrder,
            term::{Link, Operand, Term, TermType},
        },
    };
    use planner::query::{
        aliased,
        ast::common::{JoinKind, TableRef},
        dialect::Postgres,
        qualified,
    };
    use query_helper::{
        QueryHelper, col,
        conditional::Conditions,
        config::{ConfigError, HelperConfig},
        entity::EntityType,
        error::QueryError,
        executor::ExecutorError,
        join::{JoinEntry, JoinRegistry},
        metadata::TableCache,
        record::{DynamicRecord, Properties},
        rewrite::PathRewriter,
    };
    use std::{io::Write, sync::Arc, time::Duration};
    use tracing_test::traced_test;

    // Test Settings: Two joins registered directly on a registry.
    // Scenario: Resolve the second join by alias and by entity type, then look up unknown keys.
    // Expected Outcome: Both lookups return the same entry; unknown keys fail with ReferenceNotFound.
    #[traced_test]
    #[tokio::test]
    async fn tc01() {
        let tables = TableCache::new(Arc::new(schema()));
        let mut registry = JoinRegistry::new();
        for (entity, alias) in [
            (EntityType::of::<Post>(), "j_0"),
            (EntityType::of::<Author>(), "j_1"),
        ] {
            registry
                .register(
                    JoinEntry {
                        entity: Some(entity),
                        table: tables.resolve(&entity).unwrap(),
                        alias: alias.to_string(),
                        kind: JoinKind::Left,
                        on: Vec::new(),
                    },
                    "users",
                )
                .unwrap();
        }

        let by_alias = registry.resolve_by_alias("j_1").unwrap();
        let by_type = registry.resolve_by_type(&EntityType::of::<Author>()).unwrap();
        assert!(std::ptr::eq(by_alias, by_type));
        assert_eq!(by_alias.table.name, "authors");

        assert!(matches!(
            registry.resolve_by_alias("j_2"),
            Err(QueryError::ReferenceNotFound { .. })
        ));
        assert!(matches!(
            registry.resolve_by_type(&EntityType::of::<Tag>()),
            Err(QueryError::ReferenceNotFound { .. })
        ));
    }

    // Test Settings: Whole-table mapping of a joined table onto the nested `author` property.
    // Scenario: One row carries both `author.*` labels and top-level labels.
    // Expected Outcome:
    // - Select labels are `author.id` and `author.name`.
    // - The nested author is created once and receives both values.
    #[traced_test]
    #[tokio::test]
    async fn tc02() {
        let executor = Arc::new(MemoryExecutor::new().with_rows(vec![row(&[
            ("author.id", Value::Int(3)),
            ("author.name", Value::String("Le Guin".into())),
            ("id", Value::Int(10)),
            ("title", Value::String("Earthsea".into())),
            ("published", Value::Int(1)),
        ])]));

        let posts = helper(executor.clone())
            .select::<PostView>()
            .all_as::<Author>("author")
            .column("id")
            .column("title")
            .column("published")
            .from::<Post>()
            .left_join::<Author>(|j| j.apply_column("id", TermType::Eq, col!(Post, author_id)))
            .fetch_all()
            .await
            .unwrap();

        let queries = executor.data_queries();
        let query = &queries[0];
        assert_eq!(
            query.column_labels()[..2].to_vec(),
            vec!["author.id", "author.name"]
        );
        assert_eq!(
            query.columns[1],
            aliased(qualified("j_0", "pen_name"), "author.name")
        );
        assert_eq!(query.joins[0].on[0].column.as_deref(), Some("j_0.id"));
        assert_eq!(
            query.joins[0].on[0].value,
            Operand::Column("posts.author_id".into())
        );

        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.authors_created, 1);
        assert_eq!(
            post.author,
            Some(AuthorView {
                id: Some(3),
                name: Some("Le Guin".into()),
            })
        );
        assert_eq!(post.id, Some(10));
        assert_eq!(post.published, Some(true));
    }

    // Test Settings: Two whole-table mappings without a target property.
    // Scenario: Map the main table and the `j_0` join onto the top-level result.
    // Expected Outcome: Prefixes are `all` and `all_1`; unmapped labels are dropped.
    #[traced_test]
    #[tokio::test]
    async fn tc03() {
        let executor = Arc::new(MemoryExecutor::new().with_rows(vec![row(&[
            ("all.title", Value::String("Dune".into())),
            ("all_1.name", Value::String("ann".into())),
            ("_extra", Value::Int(1)),
        ])]));

        let records = helper(executor.clone())
            .select::<DynamicRecord>()
            .all::<Post>()
            .all_from("j_0")
            .from::<Post>()
            .inner_join::<User>(|j| j.apply_column("id", TermType::Eq, "posts.user_id"))
            .fetch_all()
            .await
            .unwrap();

        let labels: Vec<String> = executor.data_queries()[0]
            .column_labels()
            .iter()
            .map(|label| label.to_string())
            .collect();
        assert!(labels.contains(&"all.title".to_string()));
        assert!(labels.contains(&"all_1.name".to_string()));

        assert_eq!(records[0].get("title"), Some(&Value::String("Dune".into())));
        assert_eq!(records[0].get("name"), Some(&Value::String("ann".into())));
        assert!(records[0].get("_extra").is_none());
    }

    // Test Settings: No filter parameters, executor gated on two in-flight queries.
    // Scenario: fetch_paged() with the default window.
    // Expected Outcome:
    // - Count and data queries run concurrently (the gate opens).
    // - One count query without ordering or bounds, one data query bounded to 25 rows.
    // - Page metadata is index 0, size 25.
    #[traced_test]
    #[tokio::test]
    async fn tc04() {
        let executor = Arc::new(
            MemoryExecutor::new()
                .with_count(Value::Int(42))
                .with_rows(vec![
                    row(&[("all.id", Value::Int(1))]),
                    row(&[("all.id", Value::Int(2))]),
                ])
                .gated(2),
        );
        let spec = helper(executor.clone())
            .select::<DynamicRecord>()
            .from::<User>();

        let page = tokio::time::timeout(Duration::from_secs(5), spec.fetch_paged())
            .await
            .expect("count and data queries did not run concurrently")
            .unwrap();

        assert_eq!(page.total, 42);
        assert_eq!((page.page_index, page.page_size), (0, 25));
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].get("id"), Some(&Value::Int(2)));

        assert_eq!(executor.count_queries(), 1);
        let data = executor.data_queries();
        assert_eq!(data.len(), 1);
        assert_eq!((data[0].limit, data[0].offset), (Some(25), Some(0)));

        let count = executor
            .queries()
            .into_iter()
            .find(|q| q.column_labels() == vec![COUNT_ALIAS])
            .unwrap();
        assert!(count.order_by.is_empty());
        assert!(count.limit.is_none());
    }

    // Test Settings: Filter parameters carry a pre-computed total and page 1 of size 5.
    // Scenario: fetch_paged().
    // Expected Outcome: No count query is issued; the supplied total and window are returned.
    #[traced_test]
    #[tokio::test]
    async fn tc05() {
        let executor = Arc::new(
            MemoryExecutor::new()
                .with_count(Value::Int(99))
                .with_rows(vec![row(&[("all.id", Value::Int(6))])]),
        );
        let param = QueryParam::new().page(1, 5).with_total(7);

        let page = helper(executor.clone())
            .select::<DynamicRecord>()
            .from::<User>()
            .where_param(&param)
            .fetch_paged()
            .await
            .unwrap();

        assert_eq!(page.total, 7);
        assert_eq!((page.page_index, page.page_size), (1, 5));
        assert_eq!(executor.count_queries(), 0);
        assert_eq!(executor.queries().len(), 1);
        let data = executor.data_queries();
        assert_eq!((data[0].limit, data[0].offset), (Some(5), Some(5)));
    }

    // Test Settings: Whole-table mapping onto `author`, filter parameters using `author.*` paths.
    // Scenario: A grouped parameter term and a sort reference the nested property.
    // Expected Outcome:
    // - `author.name` becomes `j_0.pen_name`, plain columns stay on the main table.
    // - Rewriting is idempotent and leaves unknown prefixes alone.
    #[traced_test]
    #[tokio::test]
    async fn tc06() {
        let executor = Arc::new(MemoryExecutor::new());
        let param = QueryParam::new()
            .term(Term::group(
                Link::And,
                vec![Term::eq("author.name", "ann"), Term::eq("title", "x").or()],
            ))
            .order_by("author.id", SortOrder::Desc);

        helper(executor.clone())
            .select::<PostView>()
            .column("id")
            .all_as::<Author>("author")
            .from::<Post>()
            .inner_join::<Author>(|j| {
                j.apply_column(col!(Author, id), TermType::Eq, col!(Post, author_id))
            })
            .where_param(&param)
            .fetch_all()
            .await
            .unwrap();

        let queries = executor.data_queries();
        let query = &queries[0];
        assert_eq!(query.terms[0].columns(), vec!["j_0.pen_name", "posts.title"]);
        assert_eq!(query.order_by[0].expr, qualified("j_0", "id"));

        let mut rewriter = PathRewriter::new();
        rewriter.register("author", "j_0");
        for path in ["author.name", "j_0.name", "status", "other.name"] {
            let once = rewriter.rewrite(path).into_owned();
            assert_eq!(rewriter.rewrite(&once), once);
        }
        assert_eq!(rewriter.rewrite("author.name"), "j_0.name");
        assert_eq!(rewriter.rewrite("other.name"), "other.name");
    }

    // Test Settings: Main table and joined table both have a `status` column.
    // Scenario: Direct mapping of `j_0.status` next to a plain `status` mapping.
    // Expected Outcome: The dotted path resolves against the join, the plain one against the main table.
    #[traced_test]
    #[tokio::test]
    async fn tc07() {
        let executor = Arc::new(MemoryExecutor::new().with_rows(vec![row(&[
            ("postStatus", Value::Int(2)),
            ("status", Value::Int(1)),
        ])]));

        let records = helper(executor.clone())
            .select::<DynamicRecord>()
            .column_as("j_0.status", "postStatus")
            .column("status")
            .from::<User>()
            .left_join::<Post>(|j| j.apply_column("user_id", TermType::Eq, col!(User, id)))
            .fetch_all()
            .await
            .unwrap();

        let queries = executor.data_queries();
        assert_eq!(
            queries[0].columns,
            vec![
                aliased(qualified("j_0", "status"), "postStatus"),
                aliased(qualified("users", "status"), "status"),
            ]
        );
        assert_eq!(records[0].get("postStatus"), Some(&Value::Int(2)));
        assert_eq!(records[0].get("status"), Some(&Value::Int(1)));
    }

    // Test Settings: Executor that fails every query.
    // Scenario: fetch_all() on a valid spec, then specs with configuration mistakes.
    // Expected Outcome:
    // - The engine error comes back unchanged inside QueryError::Execution.
    // - Configuration errors fail before any query reaches the executor.
    #[traced_test]
    #[tokio::test]
    async fn tc08() {
        let executor = Arc::new(MemoryExecutor::new().failing("relation does not exist"));
        let helper = helper(executor.clone());

        let err = helper
            .select::<DynamicRecord>()
            .from::<User>()
            .fetch_all()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Execution(ExecutorError::Sql(ref message)) if message == "relation does not exist"
        ));
        assert!(!err.is_configuration());
        let issued = executor.queries().len();

        let err = helper
            .select::<DynamicRecord>()
            .column("missing")
            .from::<User>()
            .fetch_paged()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::ColumnNotFound { ref table, ref column } if table == "users" && column == "missing"
        ));
        assert!(err.is_configuration());

        let err = helper
            .select::<DynamicRecord>()
            .from::<User>()
            .where_(|c| c.eq("j_3.id", 1))
            .fetch()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, QueryError::ReferenceNotFound { ref key, .. } if key == "j_3"));

        assert_eq!(executor.queries().len(), issued);
    }

    // Test Settings: Configuration loaded from a TOML file (page_size = 10, count_alias = "cnt").
    // Scenario: fetch_paged() without filter parameters, then an invalid configuration.
    // Expected Outcome: The configured window and count label are used; page_size = 0 is rejected.
    #[traced_test]
    #[tokio::test]
    async fn tc09() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 10\ncount_alias = \"cnt\"").unwrap();
        let config = HelperConfig::load(file.path()).unwrap();

        let executor = Arc::new(MemoryExecutor::new().with_count(Value::Int(3)));
        let tables = Arc::new(TableCache::new(Arc::new(schema())));
        let helper = QueryHelper::with_config(executor.clone(), tables, config).unwrap();

        let page = helper
            .select::<DynamicRecord>()
            .from::<User>()
            .fetch_paged()
            .await
            .unwrap();
        assert_eq!((page.page_index, page.page_size), (0, 10));
        assert_eq!(page.total, 3);
        assert!(
            executor
                .queries()
                .iter()
                .any(|q| q.column_labels() == vec!["cnt"])
        );

        let invalid = HelperConfig {
            page_size: 0,
            ..HelperConfig::default()
        };
        let tables = Arc::new(TableCache::new(Arc::new(schema())));
        assert!(matches!(
            QueryHelper::with_config(executor, tables, invalid),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[derive(Debug, Default)]
    struct StatusOnly {
        status: i64,
    }

    impl Properties for StatusOnly {
        fn set_property(&mut self, _name: &str, _value: Value) -> bool {
            false
        }

        fn property_or_new(&mut self, _name: &str) -> Option<&mut dyn Properties> {
            None
        }
    }

    // Test Settings: Direct mapping through a typed setter.
    // Scenario: The engine returns the status as text.
    // Expected Outcome: The column codec decodes it to an integer before the setter runs.
    #[traced_test]
    #[tokio::test]
    async fn tc10() {
        let executor = Arc::new(
            MemoryExecutor::new().with_rows(vec![row(&[("userStatus", Value::String("4".into()))])]),
        );

        let rows = helper(executor)
            .select::<StatusOnly>()
            .column_with(col!(User, status), "userStatus", |s: &mut StatusOnly, v: Value| {
                s.status = v.as_i64().unwrap_or_default()
            })
            .from::<User>()
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(rows[0].status, 4);
    }

    // Test Settings: Alias-only join of a schema-qualified table.
    // Scenario: Render a query with an IN filter through a target property and a nested OR group.
    // Expected Outcome: Exact SQL with numbered placeholders and parameters in order.
    #[test]
    fn tc11() {
        let (sql, params) = helper(Arc::new(MemoryExecutor::new()))
            .select::<DynamicRecord>()
            .column("title")
            .all_from_as("j_0", "tag")
            .from::<Post>()
            .join_table(JoinKind::Left, "blog.tags", |j| {
                j.apply_column("post_id", TermType::Eq, "posts.id")
            })
            .where_(|c| {
                c.in_list("tag.label", ["rust", "sql"])
                    .nest(|g| g.gt("id", 10).or().not_null("title"))
            })
            .render(&Postgres)
            .unwrap();

        assert_eq!(
            sql,
            concat!(
                r#"SELECT "posts"."title" AS "title", "j_0"."id" AS "tag_1.id", "#,
                r#""j_0"."post_id" AS "tag_1.post_id", "j_0"."label" AS "tag_1.label" "#,
                r#"FROM "posts" LEFT JOIN "blog"."tags" AS "j_0" ON ("j_0"."post_id" = "posts"."id") "#,
                r#"WHERE (("j_0"."label" IN ($1, $2)) AND (("posts"."id" > $3) OR ("posts"."title" IS NOT NULL)))"#
            )
        );
        assert_eq!(
            params,
            vec![
                Value::String("rust".into()),
                Value::String("sql".into()),
                Value::Int(10),
            ]
        );
    }

    // Test Settings: Schema-qualified main entity, parameters with paging disabled.
    // Scenario: Stream every row with fetch(); one row holds only a null value.
    // Expected Outcome: No LIMIT is applied, the FROM clause keeps the schema, nulls leave the result empty.
    #[traced_test]
    #[tokio::test]
    async fn tc12() {
        let executor = Arc::new(MemoryExecutor::new().with_rows(vec![
            row(&[("all.label", Value::String("rust".into()))]),
            row(&[("all.label", Value::Null)]),
        ]));
        let param = QueryParam::new().where_eq("label", "rust").no_paging();

        let records: Vec<DynamicRecord> = helper(executor.clone())
            .select::<DynamicRecord>()
            .from::<Tag>()
            .where_param(&param)
            .fetch()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("label"), Some(&Value::String("rust".into())));
        assert!(records[1].is_empty());

        let queries = executor.data_queries();
        assert!(queries[0].limit.is_none());
        assert_eq!(
            queries[0].from.as_ref().map(|from| from.table.clone()),
            Some(TableRef {
                schema: Some("blog".into()),
                name: "tags".into(),
            })
        );
    }

    // Test Settings: One helper used for two queries over the same entities.
    // Scenario: Plan a joined query twice and render it with the PostgreSQL dialect.
    // Expected Outcome: Each entity type is cached once and both renders are identical.
    #[traced_test]
    #[tokio::test]
    async fn tc13() {
        let helper = helper(Arc::new(MemoryExecutor::new()));
        let render = || {
            helper
                .select::<DynamicRecord>()
                .column("name")
                .from::<User>()
                .inner_join::<Post>(|j| j.apply_column("user_id", TermType::Eq, col!(User, id)))
                .order_by_ref(col!(Post, id), SortOrder::Asc)
                .render(&Postgres)
                .unwrap()
        };

        let (first, _) = render();
        let (second, _) = render();
        assert_eq!(first, second);
        assert_eq!(
            first,
            concat!(
                r#"SELECT "users"."user_name" AS "name" FROM "users" "#,
                r#"INNER JOIN "posts" AS "j_0" ON ("j_0"."user_id" = "users"."id") "#,
                r#"ORDER BY "j_0"."id" ASC"#
            )
        );
        assert_eq!(helper.tables().len(), 2);
    }

    // Test Settings: Executor gated on three parties, so count and data queries both block.
    // Scenario: Drop the fetch_paged() future through a timeout while both queries wait.
    // Expected Outcome:
    // - Both queries were issued and were in flight together.
    // - Dropping the outer future cancels both; no stream is served and no page is produced.
    #[traced_test]
    #[tokio::test]
    async fn tc14() {
        let executor = Arc::new(
            MemoryExecutor::new()
                .with_count(Value::Int(5))
                .with_rows(vec![row(&[("all.id", Value::Int(1))])])
                .gated(3),
        );
        let spec = helper(executor.clone())
            .select::<DynamicRecord>()
            .from::<User>();

        let outcome = tokio::time::timeout(Duration::from_millis(200), spec.fetch_paged()).await;

        assert!(outcome.is_err(), "page produced while the gate was closed");
        assert_eq!(executor.count_queries(), 1);
        assert_eq!(executor.data_queries().len(), 1);
        assert_eq!(executor.in_flight(), 0);
        assert_eq!(executor.served(), 0);
    }

    // Test Settings: Config default window 0/10, filter parameters asking for page 1 of size 5.
    // Scenario: fetch_paged_at(3, 4) with and without the parameters.
    // Expected Outcome:
    // - The explicit window bounds the data query (LIMIT 4 OFFSET 12) in both cases.
    // - The page metadata carries the explicit window; a supplied total still skips the count.
    #[traced_test]
    #[tokio::test]
    async fn tc15() {
        let executor = Arc::new(
            MemoryExecutor::new()
                .with_count(Value::Int(50))
                .with_rows(vec![row(&[("all.id", Value::Int(13))])]),
        );
        let config = HelperConfig {
            page_size: 10,
            ..HelperConfig::default()
        };
        let tables = Arc::new(TableCache::new(Arc::new(schema())));
        let helper = QueryHelper::with_config(executor.clone(), tables, config).unwrap();

        let page = helper
            .select::<DynamicRecord>()
            .from::<User>()
            .fetch_paged_at(3, 4)
            .await
            .unwrap();
        assert_eq!(page.window(), PageWindow::new(3, 4));
        assert_eq!(page.total, 50);
        assert_eq!(page.data[0].get("id"), Some(&Value::Int(13)));

        let param = QueryParam::new().page(1, 5).with_total(9);
        let page = helper
            .select::<DynamicRecord>()
            .from::<User>()
            .where_param(&param)
            .fetch_paged_at(3, 4)
            .await
            .unwrap();
        assert_eq!((page.page_index, page.page_size), (3, 4));
        assert_eq!(page.total, 9);

        assert_eq!(executor.count_queries(), 1);
        let data = executor.data_queries();
        assert_eq!(data.len(), 2);
        for query in &data {
            assert_eq!((query.limit, query.offset), (Some(4), Some(12)));
        }
    }
}
