//! Execution helpers: single row, all rows, count and existence.

use super::{Query, rebind};
use crate::client::GenericClient;
use crate::error::{ResultExt, SeekError, SeekResult};
use crate::record::FromRow;
use tokio_postgres::Row;

impl Query {
    /// Run `sql` with this query's arguments, honoring the tag.
    pub(crate) async fn fetch_rows(
        &self,
        conn: &impl GenericClient,
        sql: &str,
    ) -> SeekResult<Vec<Row>> {
        let params = self.params_ref();
        match self.tag() {
            Some(tag) => conn.query_tagged(tag, sql, &params).await,
            None => conn.query(sql, &params).await,
        }
    }

    async fn fetch_first(&self, conn: &impl GenericClient, sql: &str) -> SeekResult<Option<Row>> {
        let params = self.params_ref();
        match self.tag() {
            Some(tag) => conn.query_opt_tagged(tag, sql, &params).await,
            None => conn.query_opt(sql, &params).await,
        }
    }

    /// Scalar path: exactly one row is expected.
    async fn fetch_one(&self, conn: &impl GenericClient, sql: &str) -> SeekResult<Row> {
        let params = self.params_ref();
        match self.tag() {
            Some(tag) => conn.query_one_tagged(tag, sql, &params).await,
            None => conn.query_one(sql, &params).await,
        }
    }

    /// Fetch the first matching row mapped to `T`.
    ///
    /// Returns [`SeekError::NotFound`] when nothing matches.
    pub async fn get<T: FromRow>(&self, conn: &impl GenericClient) -> SeekResult<T> {
        let sql = self.to_sql();
        let row = self
            .fetch_first(conn, &sql)
            .await
            .and_then(|row| row.ok_or_else(|| SeekError::not_found("Expected one row, got none")))
            .context("execute get query")?;
        T::from_row(&row).context("execute get query")
    }

    /// Fetch the first matching row mapped to `T`, if any.
    pub async fn get_opt<T: FromRow>(&self, conn: &impl GenericClient) -> SeekResult<Option<T>> {
        let sql = self.to_sql();
        let row = self
            .fetch_first(conn, &sql)
            .await
            .context("execute get query")?;
        row.as_ref()
            .map(T::from_row)
            .transpose()
            .context("execute get query")
    }

    /// Fetch every matching row mapped to `T`.
    pub async fn get_all<T: FromRow>(&self, conn: &impl GenericClient) -> SeekResult<Vec<T>> {
        let sql = self.to_sql();
        let rows = self
            .fetch_rows(conn, &sql)
            .await
            .context("execute get all query")?;
        rows.iter()
            .map(T::from_row)
            .collect::<SeekResult<Vec<T>>>()
            .context("execute get all query")
    }

    /// `SELECT COUNT(*)` with this query's WHERE fragment and arguments.
    ///
    /// Select list, joins, grouping, ordering, limit and offset are ignored.
    pub async fn count(&self, conn: &impl GenericClient) -> SeekResult<i64> {
        let sql = self.to_count_sql();
        self.run_count(conn, &sql).await.context("execute count query")
    }

    pub(crate) async fn run_count(&self, conn: &impl GenericClient, sql: &str) -> SeekResult<i64> {
        let row = self.fetch_one(conn, sql).await?;
        row.try_get::<_, i64>(0)
            .map_err(|e| SeekError::decode("count", e.to_string()))
    }

    /// Whether at least one row matches.
    pub async fn exists(&self, conn: &impl GenericClient) -> SeekResult<bool> {
        let sql = rebind(&self.config().to_exists_sql(self.table()));
        match self.fetch_first(conn, &sql).await {
            Ok(row) => Ok(row.is_some()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.context("exists check failed")),
        }
    }
}
