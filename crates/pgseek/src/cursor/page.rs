use super::{CompositeCursor, Cursor, OrderField, Seek};
use crate::client::GenericClient;
use crate::error::{ResultExt, SeekError, SeekResult};
use crate::query::Query;
use crate::record::{FromRow, Record};
use crate::value::Value;
use futures_util::future::try_join;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One page of results plus the cursors to move away from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T, C = Cursor> {
    pub data: Vec<T>,
    /// Rows matching the page query without LIMIT/OFFSET, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<C>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<C>,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Drop the over-fetched row, if any. Returns whether one was dropped.
fn trim<T>(rows: &mut Vec<T>, page_limit: usize) -> bool {
    if page_limit > 0 && rows.len() > page_limit {
        rows.truncate(page_limit);
        true
    } else {
        false
    }
}

impl<T: Record> PageResult<T, Cursor> {
    /// Build a page from rows fetched with an over-fetching limit.
    ///
    /// `page_limit` is the requested page size (without the extra row) and
    /// `filtered` tells whether the executed query had a WHERE fragment.
    /// Cursor values are read from `key_field` of the last/first row; rows
    /// where it is missing or `NULL` yield no cursor.
    pub fn assemble(mut rows: Vec<T>, key_field: &str, page_limit: usize, filtered: bool) -> Self {
        let has_next = trim(&mut rows, page_limit);
        let has_prev = filtered && !rows.is_empty();

        let cursor_at = |row: Option<&T>, forward: bool| {
            let key_value = row?.value_for(key_field).filter(|v| !v.is_null())?;
            Some(Cursor {
                key_field: key_field.to_string(),
                key_value,
                forward,
                limit: page_limit,
            })
        };

        Self {
            next_cursor: if has_next { cursor_at(rows.last(), true) } else { None },
            prev_cursor: if has_prev { cursor_at(rows.first(), false) } else { None },
            data: rows,
            total_count: None,
            has_next,
            has_prev,
        }
    }
}

impl<T: Record> PageResult<T, CompositeCursor> {
    /// Composite-key counterpart of [`PageResult::assemble`].
    ///
    /// Cursors carry the value of every order field present on the row and
    /// the same `order_fields`.
    pub fn assemble_composite(
        mut rows: Vec<T>,
        order_fields: &[OrderField],
        page_limit: usize,
        filtered: bool,
    ) -> Self {
        let has_next = trim(&mut rows, page_limit);
        let has_prev = filtered && !rows.is_empty();

        let cursor_at = |row: Option<&T>, forward: bool| {
            let row = row?;
            let key_values: BTreeMap<String, Value> = order_fields
                .iter()
                .filter_map(|f| Some((f.name.clone(), row.value_for(&f.name)?)))
                .collect();
            if key_values.is_empty() {
                return None;
            }
            Some(CompositeCursor {
                key_values,
                order_fields: order_fields.to_vec(),
                forward,
                limit: page_limit,
            })
        };

        Self {
            next_cursor: if has_next { cursor_at(rows.last(), true) } else { None },
            prev_cursor: if has_prev { cursor_at(rows.first(), false) } else { None },
            data: rows,
            total_count: None,
            has_next,
            has_prev,
        }
    }
}

impl<T, C> PageResult<T, C> {
    fn with_total(mut self, total_count: Option<i64>) -> Self {
        self.total_count = total_count;
        self
    }
}

impl Query {
    /// Page size requested through a cursor, else the configured limit.
    ///
    /// Only a limit set by a cursor carries the extra row needed to detect a
    /// following page.
    fn page_limit(&self) -> usize {
        let limit = self.config().limit;
        match self.seek.as_ref().and_then(Seek::page_limit) {
            Some(page_limit) if limit == page_limit + 1 => page_limit,
            _ => limit,
        }
    }

    fn is_filtered(&self) -> bool {
        !self.config().where_clause.is_empty()
    }

    /// Run the page query, and the total count alongside it when asked.
    async fn fetch_page<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        with_count: bool,
    ) -> SeekResult<(Vec<T>, Option<i64>)> {
        let sql = self.to_sql();
        let rows = async {
            let rows = self
                .fetch_rows(conn, &sql)
                .await
                .context("execute page query")?;
            rows.iter()
                .map(T::from_row)
                .collect::<SeekResult<Vec<T>>>()
                .context("execute page query")
        };

        if !with_count {
            return Ok((rows.await?, None));
        }

        let counter = self.without_paging();
        let count_sql = counter.to_count_sql();
        let count = async {
            counter
                .run_count(conn, &count_sql)
                .await
                .context("count total records")
        };
        let (rows, total) = try_join(rows, count).await?;
        Ok((rows, Some(total)))
    }

    /// Fetch one page with single-key cursors.
    ///
    /// Apply [`Query::with_cursor`] first to page from a position; without a
    /// cursor the first field of `T` is used as key when deriving the next
    /// cursor. With `with_count`, a `COUNT(*)` over the same WHERE fragment
    /// runs concurrently with the page query.
    ///
    /// Fails with [`SeekError::InvalidArgument`] before querying if the cursor
    /// key is not a field of `T`.
    pub async fn get_page<T: FromRow + Record>(
        &self,
        conn: &impl GenericClient,
        with_count: bool,
    ) -> SeekResult<PageResult<T>> {
        let key_field = match &self.seek {
            Some(Seek::Key { field, .. }) => {
                if !T::has_field(field) {
                    return Err(SeekError::invalid_argument(format!(
                        "cursor key field '{field}' is not a field of the result type"
                    )));
                }
                field.as_str()
            }
            _ => T::field_names().first().copied().unwrap_or_default(),
        };

        let page_limit = self.page_limit();
        let (rows, total) = self.fetch_page::<T>(conn, with_count).await?;
        #[cfg(feature = "tracing")]
        let fetched = rows.len();
        let page = PageResult::assemble(rows, key_field, page_limit, self.is_filtered())
            .with_total(total);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgseek.page",
            table = self.table(),
            key_field,
            fetched,
            page_limit,
            has_next = page.has_next,
            has_prev = page.has_prev,
            total_count = ?page.total_count,
            "page assembled"
        );

        Ok(page)
    }

    /// Fetch one page with composite cursors.
    ///
    /// Order fields come from [`Query::with_composite_cursor`], or from the
    /// ORDER BY fragment when no cursor was applied (first page).
    pub async fn get_composite_page<T: FromRow + Record>(
        &self,
        conn: &impl GenericClient,
        with_count: bool,
    ) -> SeekResult<PageResult<T, CompositeCursor>> {
        let order_fields = match &self.seek {
            Some(Seek::Composite { order_fields, .. }) => order_fields.clone(),
            _ => OrderField::parse_list(&self.config().order_by),
        };
        if order_fields.is_empty() {
            return Err(SeekError::invalid_argument(
                "composite page requires order fields",
            ));
        }
        if let Some(missing) = order_fields.iter().find(|f| !T::has_field(&f.name)) {
            return Err(SeekError::invalid_argument(format!(
                "order field '{}' is not a field of the result type",
                missing.name
            )));
        }

        let page_limit = self.page_limit();
        let (rows, total) = self.fetch_page::<T>(conn, with_count).await?;
        let page =
            PageResult::assemble_composite(rows, &order_fields, page_limit, self.is_filtered())
                .with_total(total);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgseek.page",
            table = self.table(),
            order_fields = order_fields.len(),
            page_limit,
            has_next = page.has_next,
            has_prev = page.has_prev,
            total_count = ?page.total_count,
            "composite page assembled"
        );

        Ok(page)
    }

    /// Page forward from `key_value` on `key_field`.
    pub async fn page_by_key_since<T: FromRow + Record>(
        &self,
        conn: &impl GenericClient,
        key_field: &str,
        key_value: impl Into<Value>,
        limit: usize,
        with_count: bool,
    ) -> SeekResult<PageResult<T>> {
        let cursor = Cursor::after(key_value, limit);
        self.with_cursor(key_field, Some(&cursor))
            .get_page(conn, with_count)
            .await
    }

    /// Page backward from `key_value` on `key_field`.
    pub async fn page_by_key_before<T: FromRow + Record>(
        &self,
        conn: &impl GenericClient,
        key_field: &str,
        key_value: impl Into<Value>,
        limit: usize,
        with_count: bool,
    ) -> SeekResult<PageResult<T>> {
        let cursor = Cursor::before(key_value, limit);
        self.with_cursor(key_field, Some(&cursor))
            .get_page(conn, with_count)
            .await
    }
}
