//! SQL logging for any [`GenericClient`].
//!
//! [`TracingClient`] wraps a client and emits one `tracing` event per
//! statement on target `pgseek.sql`, after the statement finishes:
//!
//! ```rust,ignore
//! use pgseek::monitor::TracingClient;
//! use tracing::Level;
//!
//! let client = TracingClient::new(client).level(Level::INFO).max_sql_length(500);
//! let page: PageResult<User> = pgseek::table("users").limit(20).get_page(&client, true).await?;
//! ```
//!
//! Failed statements are always logged at `WARN`.

use crate::client::GenericClient;
use crate::error::{SeekError, SeekResult};
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// Truncate `sql` to at most `max_bytes`, on a char boundary.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A [`GenericClient`] that logs every statement it executes.
#[derive(Debug, Clone)]
pub struct TracingClient<C> {
    inner: C,
    /// Event level for successful statements.
    level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    max_sql_length: Option<usize>,
}

impl<C> TracingClient<C> {
    /// Wrap `inner`, logging at `DEBUG` with SQL truncated to 200 bytes.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn emit(
        &self,
        tag: Option<&str>,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        outcome: Result<u64, &SeekError>,
    ) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let tag = tag.unwrap_or("-");
        let sql = self.truncate_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match outcome {
            Ok(rows) => emit_at_level!(
                self.level,
                target: "pgseek.sql",
                tag,
                param_count,
                sql = %sql,
                elapsed_ms,
                rows,
            ),
            Err(error) => tracing::warn!(
                target: "pgseek.sql",
                tag,
                param_count,
                sql = %sql,
                elapsed_ms,
                error = %error,
                "statement failed"
            ),
        }
    }

    fn observe_rows(
        &self,
        tag: Option<&str>,
        sql: &str,
        param_count: usize,
        start: Instant,
        result: &SeekResult<Vec<Row>>,
    ) {
        let outcome = result.as_ref().map(|rows| rows.len() as u64);
        self.emit(tag, sql, param_count, start.elapsed(), outcome);
    }
}

impl<C: GenericClient> GenericClient for TracingClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SeekResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.inner.query(sql, params).await;
        self.observe_rows(None, sql, params.len(), start, &result);
        result
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> SeekResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.inner.query_tagged(tag, sql, params).await;
        self.observe_rows(Some(tag), sql, params.len(), start, &result);
        result
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SeekResult<u64> {
        let start = Instant::now();
        let result = self.inner.execute(sql, params).await;
        self.emit(None, sql, params.len(), start.elapsed(), result.as_ref().copied());
        result
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> SeekResult<u64> {
        let start = Instant::now();
        let result = self.inner.execute_tagged(tag, sql, params).await;
        self.emit(Some(tag), sql, params.len(), start.elapsed(), result.as_ref().copied());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::RecordingClient;
    use crate::query::table;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT * FROM users", 8), "SELECT *");
        // 'é' is two bytes; cutting inside it backs off to the previous boundary.
        assert_eq!(truncate_sql_bytes("café", 4), "caf");
    }

    #[test]
    fn truncate_sql_appends_ellipsis() {
        let client = TracingClient::new(()).max_sql_length(10);
        assert_eq!(client.truncate_sql("SELECT * FROM users"), "SELECT * F...");
        assert_eq!(client.truncate_sql("SELECT 1"), "SELECT 1");
        assert_eq!(
            client.no_truncate().truncate_sql("SELECT * FROM users"),
            "SELECT * FROM users"
        );
    }

    #[tokio::test]
    async fn wrapped_client_sees_same_statements_and_tags() {
        let client = TracingClient::new(RecordingClient::new()).level(Level::INFO);
        table("users")
            .tagged("users.exists")
            .exists(&client)
            .await
            .unwrap();

        let recorded = client.inner().recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].tag.as_deref(), Some("users.exists"));
        assert_eq!(recorded[0].sql, "SELECT 1 FROM users LIMIT 1");
    }

    #[tokio::test]
    async fn failures_pass_through_unchanged() {
        let client = TracingClient::new(RecordingClient::failing("down"));
        let err = client.query("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Connection error: down");
    }
}
