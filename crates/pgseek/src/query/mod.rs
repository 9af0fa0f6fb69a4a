//! Immutable SELECT query builder.
//!
//! Every mutator borrows the current [`Query`] and returns a new one, so a
//! base query can be shared and refined into many derived queries (one per
//! page, one for counting, ...) without the derived queries observing each
//! other.
//!
//! # Example
//!
//! ```ignore
//! use pgseek::{params, table};
//!
//! let active = table("users")
//!     .select(["id", "name"])
//!     .filter("status = $1 AND age > $2", params!["active", 18]);
//!
//! let newest = active.order_by("created_at DESC").limit(20);
//! let total = active.count(&client).await?;
//! ```

mod config;
mod exec;
mod render;

#[cfg(test)]
mod tests;

pub use config::QueryConfig;
pub use render::rebind;

use crate::cursor::Seek;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Start building a query against `table`.
pub fn table(name: impl Into<String>) -> Query {
    Query::new(name)
}

/// A SELECT query over one table: clause configuration plus bind arguments.
#[derive(Debug, Clone)]
#[must_use]
pub struct Query {
    table: String,
    config: QueryConfig,
    args: Vec<Value>,
    tag: Option<String>,
    pub(crate) seek: Option<Seek>,
}

impl Query {
    /// Create a new query for a table (or any FROM expression).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            config: QueryConfig::default(),
            args: Vec::new(),
            tag: None,
            seek: None,
        }
    }

    fn derive(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        f(&mut next);
        next
    }

    // ==================== Clause mutators ====================

    /// Replace the SELECT column list. An empty list selects `*`.
    pub fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into).collect();
        self.derive(|q| q.config.select_fields = fields)
    }

    /// Replace the WHERE fragment and its arguments.
    ///
    /// Placeholders may be written as `$1, $2, ...` or as `?` markers; both are
    /// numbered against `args` in order when the statement is rendered.
    /// Cursor predicates are ANDed onto this fragment later.
    #[doc(alias = "where")]
    pub fn filter<I>(&self, conditions: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let conditions = conditions.into();
        let args = args.into_iter().map(Into::into).collect();
        self.derive(|q| {
            q.config.where_clause = conditions;
            q.args = args;
        })
    }

    /// Replace the ORDER BY fragment, e.g. `"created_at DESC"`.
    pub fn order_by(&self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.derive(|q| q.config.order_by = fields)
    }

    /// Set LIMIT; `0` removes it.
    pub fn limit(&self, n: usize) -> Self {
        self.derive(|q| q.config.limit = n)
    }

    /// Set OFFSET; `0` removes it.
    pub fn offset(&self, n: usize) -> Self {
        self.derive(|q| q.config.offset = n)
    }

    /// Append a JOIN fragment, e.g. `"INNER JOIN roles r ON r.id = users.role_id"`.
    pub fn join(&self, join_clause: impl Into<String>) -> Self {
        let join_clause = join_clause.into();
        self.derive(|q| q.config.join_clauses.push(join_clause))
    }

    pub fn group_by(&self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.derive(|q| q.config.group_by = fields)
    }

    pub fn having(&self, conditions: impl Into<String>) -> Self {
        let conditions = conditions.into();
        self.derive(|q| q.config.having = conditions)
    }

    /// Lock the selected rows (`FOR UPDATE`). Only meaningful inside a transaction.
    pub fn for_update(&self) -> Self {
        self.derive(|q| q.config.for_update = true)
    }

    /// Associate a tag for monitoring/observability.
    ///
    /// The tag is passed to the `*_tagged` methods of [`GenericClient`](crate::GenericClient).
    pub fn tagged(&self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.derive(|q| q.tag = Some(tag))
    }

    // ==================== Accessors ====================

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Bind arguments, index-aligned with the placeholders of the WHERE fragment.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The executable SELECT statement (placeholders numbered `$1, $2, ...`).
    pub fn to_sql(&self) -> String {
        rebind(&self.config.to_select_sql(&self.table))
    }

    /// The executable `COUNT(*)` statement.
    pub fn to_count_sql(&self) -> String {
        rebind(&self.config.to_count_sql(&self.table))
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    // ==================== Internal helpers ====================

    pub(crate) fn config_mut(&mut self) -> &mut QueryConfig {
        &mut self.config
    }

    /// AND a generated predicate onto the WHERE fragment, appending its values
    /// after the existing arguments.
    pub(crate) fn push_predicate(
        &mut self,
        predicate: String,
        values: impl IntoIterator<Item = Value>,
    ) {
        if self.config.where_clause.is_empty() {
            self.config.where_clause = predicate;
            self.args = values.into_iter().collect();
        } else {
            self.config.where_clause =
                format!("({}) AND ({})", self.config.where_clause, predicate);
            self.args.extend(values);
        }
    }

    /// A copy with LIMIT/OFFSET cleared, used for total counts.
    pub(crate) fn without_paging(&self) -> Self {
        self.derive(|q| {
            q.config.limit = 0;
            q.config.offset = 0;
        })
    }
}
