//! Query Builder execution
//!
//! Runs compiled queries through a `DatabaseExecutor`. Row-level methods work
//! for any builder; the model-typed methods hydrate rows with `Model::from_row`.

use tracing::{debug, info};

use super::builder::QueryBuilder;
use super::types::QueryType;
use crate::backends::{DatabaseExecutor, DatabaseRow};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::pagination::SimplePaginator;

impl<M> QueryBuilder<M> {
    fn log_execution(&self, sql: &str) {
        let reporter = self.reporter.as_deref().unwrap_or("query");
        if self.debug {
            info!(reporter = %reporter, sql = %sql, "executing query");
        } else {
            debug!(reporter = %reporter, sql = %sql, "executing query");
        }
    }

    /// Execute the query and return raw rows
    pub async fn fetch_rows(&self, executor: &mut dyn DatabaseExecutor) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, params) = self.to_sql_with_params();
        self.log_execution(&sql);
        executor.fetch_all(&sql, &params).await
    }

    /// Execute a statement and return the affected row count
    pub async fn execute(&self, executor: &mut dyn DatabaseExecutor) -> ModelResult<u64> {
        let (sql, params) = self.to_sql_with_params();
        self.log_execution(&sql);
        executor.execute(&sql, &params).await
    }

    /// Query counting the rows this query would return
    ///
    /// Ordering and limits are dropped. Distinct, grouped or aggregate queries
    /// are counted through a sub-query so the count matches their row count.
    pub fn count_query(&self) -> QueryBuilder<()> {
        let base = self.clone().clear_order().clear_limit();

        if base.distinct || !base.group_by.is_empty() || base.has_aggregates {
            QueryBuilder::new()
                .select_raw("COUNT(*) AS total")
                .from_subquery(base, "count_subquery")
                .reporter(self.reporter.as_deref().unwrap_or("query"))
                .debug(self.debug)
        } else {
            base.clear_select().select_raw("COUNT(*) AS total").cast()
        }
    }

    /// Count the rows this query would return
    pub async fn count(&self, executor: &mut dyn DatabaseExecutor) -> ModelResult<u64> {
        if self.query_type != QueryType::Select {
            return Err(ModelError::Query("count() requires a SELECT query".to_string()));
        }

        let rows = self.count_query().fetch_rows(executor).await?;
        let Some(row) = rows.first() else {
            return Ok(0);
        };

        let value = row.get_by_index(0)?.to_json();
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| ModelError::Query(format!("Unexpected count value: {}", value)))
    }

    /// Fetch one page and wrap it in a paginator
    ///
    /// Issues a count query followed by the LIMIT/OFFSET query, hydrating
    /// every row with `hydrate`.
    pub async fn paginate_with<T, F>(
        self,
        executor: &mut dyn DatabaseExecutor,
        page: u64,
        per_page: u64,
        mut hydrate: F,
    ) -> ModelResult<SimplePaginator<T>>
    where
        F: FnMut(&dyn DatabaseRow) -> ModelResult<T>,
    {
        let page = page.max(1);
        let total = self.count(executor).await?;

        let rows = self.for_page(page, per_page).fetch_rows(executor).await?;
        let rows = rows
            .iter()
            .map(|row| hydrate(&**row))
            .collect::<ModelResult<Vec<T>>>()?;

        Ok(SimplePaginator::new(total, per_page, page, rows))
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Execute query and return models
    pub async fn get(self, executor: &mut dyn DatabaseExecutor) -> ModelResult<Vec<M>> {
        let rows = self.fetch_rows(executor).await?;
        rows.iter().map(|row| M::from_row(&**row)).collect()
    }

    /// Execute query and return first model
    pub async fn first(self, executor: &mut dyn DatabaseExecutor) -> ModelResult<Option<M>> {
        let mut results = self.limit(1).get(executor).await?;
        Ok(results.pop())
    }

    /// Execute query and return first model or error
    pub async fn first_or_fail(self, executor: &mut dyn DatabaseExecutor) -> ModelResult<M> {
        self.first(executor)
            .await?
            .ok_or_else(|| ModelError::NotFound(M::table_name().to_string()))
    }

    /// Fetch one page of models
    pub async fn paginate(
        self,
        executor: &mut dyn DatabaseExecutor,
        page: u64,
        per_page: u64,
    ) -> ModelResult<SimplePaginator<M>> {
        self.paginate_with(executor, page, per_page, |row| M::from_row(row)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryDatabase;
    use crate::backends::ValueRow;
    use crate::testing::User;

    fn user_row(id: i64, name: &str) -> ValueRow {
        ValueRow::new().with("id", id).with("name", name).with("team_id", None::<i64>)
    }

    #[tokio::test]
    async fn test_get_hydrates_models() {
        let db = MemoryDatabase::new();
        db.push_response(vec![user_row(1, "ann"), user_row(2, "bo")]);

        let mut conn = db.clone();
        let users = QueryBuilder::<User>::new()
            .from("users")
            .where_gt("id", 0)
            .get(&mut conn)
            .await
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "bo");
        assert_eq!(db.committed()[0].sql, "SELECT * FROM users WHERE id > $1");
    }

    #[tokio::test]
    async fn test_count_strips_order_and_limit() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("total", 12i64)]);

        let mut conn = db.clone();
        let total = QueryBuilder::<User>::new()
            .select("id, name")
            .from("users")
            .order_by("name")
            .limit(5)
            .count(&mut conn)
            .await
            .unwrap();

        assert_eq!(total, 12);
        assert_eq!(db.committed()[0].sql, "SELECT COUNT(*) AS total FROM users");
    }

    #[test]
    fn test_count_query_wraps_distinct() {
        let sql = QueryBuilder::<()>::new()
            .select_distinct("team_id")
            .from("users")
            .count_query()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS total FROM (SELECT DISTINCT team_id FROM users) AS count_subquery"
        );
    }

    #[tokio::test]
    async fn test_paginate_issues_count_then_page() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("total", 45i64)]);
        db.push_response(vec![user_row(11, "k"), user_row(12, "l")]);

        let mut conn = db.clone();
        let page = QueryBuilder::<User>::new()
            .from("users")
            .order_by("id")
            .paginate(&mut conn, 2, 10)
            .await
            .unwrap();

        assert_eq!(page.total(), 45);
        assert_eq!(page.last_page(), 5);
        assert_eq!(page.current_page(), 2);
        assert_eq!(page.len(), 2);

        let statements = db.committed();
        assert_eq!(statements[0].sql, "SELECT COUNT(*) AS total FROM users");
        assert_eq!(statements[1].sql, "SELECT * FROM users ORDER BY id ASC LIMIT 10 OFFSET 10");
    }

    #[tokio::test]
    async fn test_first_or_fail_not_found() {
        let db = MemoryDatabase::new();
        let mut conn = db.clone();
        let err = QueryBuilder::<User>::new()
            .from("users")
            .first_or_fail(&mut conn)
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::NotFound("users".to_string()));
    }
}
