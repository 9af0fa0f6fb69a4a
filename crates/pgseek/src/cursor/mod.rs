//! Keyset (cursor) pagination.
//!
//! A page request is a [`Query`](crate::Query) plus an optional cursor:
//!
//! - [`Cursor`]: a single sort key (`id > $1`).
//! - [`CompositeCursor`]: a tuple of sort keys (`(created_at, id) > ($1, $2)`),
//!   for sorts whose leading column is not unique.
//!
//! Applying a cursor over-fetches one row (`LIMIT n + 1`) so page assembly can
//! tell whether another page exists without a second query. Cursors returned
//! in a [`PageResult`] are serde-serializable and can be handed to clients
//! verbatim.
//!
//! ```ignore
//! let base = pgseek::table("posts").order_by("id DESC");
//!
//! // A plain `.limit(20)` would not over-fetch, so `next_cursor` would stay `None`.
//! let first: PageResult<Post> = base
//!     .with_cursor("id", Some(&Cursor::first(20)))
//!     .get_page(&client, true)
//!     .await?;
//! if let Some(next) = &first.next_cursor {
//!     let second: PageResult<Post> = base.with_cursor("id", Some(next)).get_page(&client, false).await?;
//! }
//! ```

mod apply;
mod page;


pub use page::PageResult;

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDir {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }

    /// Parse `ASC` / `DESC`, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(SortDir::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(SortDir::Desc)
        } else {
            None
        }
    }

    /// Direction of an ORDER BY fragment, read from its last token.
    ///
    /// `"created_at DESC"` is descending; `"id"` or anything unrecognized is
    /// ascending.
    pub fn from_order_by(order_by: &str) -> Self {
        order_by
            .split_whitespace()
            .next_back()
            .and_then(SortDir::parse)
            .unwrap_or_default()
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Comparison operator that seeks past the cursor in the given sort direction.
pub(crate) fn seek_cmp_op(dir: SortDir, forward: bool) -> &'static str {
    match (dir, forward) {
        (SortDir::Asc, true) => ">",
        (SortDir::Asc, false) => "<",
        (SortDir::Desc, true) => "<",
        (SortDir::Desc, false) => ">",
    }
}

/// Position marker for single-key pagination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// Column the key was read from. Informational; `with_cursor` takes the
    /// key column explicitly.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_field: String,
    /// Boundary value; `Null` means "start from the beginning".
    pub key_value: Value,
    /// `true` pages toward later rows in sort order, `false` toward earlier.
    pub forward: bool,
    /// Page size; `0` leaves the query's limit alone.
    pub limit: usize,
}

impl Cursor {
    /// Rows after `key_value` in sort order.
    pub fn after(key_value: impl Into<Value>, limit: usize) -> Self {
        Self {
            key_field: String::new(),
            key_value: key_value.into(),
            forward: true,
            limit,
        }
    }

    /// Rows before `key_value` in sort order.
    pub fn before(key_value: impl Into<Value>, limit: usize) -> Self {
        Self {
            forward: false,
            ..Self::after(key_value, limit)
        }
    }

    /// The first page: no boundary, only a page size.
    pub fn first(limit: usize) -> Self {
        Self::after(Value::Null, limit)
    }
}

/// One column of a composite sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderField {
    pub name: String,
    #[serde(default)]
    pub direction: SortDir,
}

impl OrderField {
    pub fn new(name: impl Into<String>, direction: SortDir) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self::new(name, SortDir::Asc)
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::new(name, SortDir::Desc)
    }

    /// Parse an ORDER BY fragment such as `"created_at DESC, id"`.
    pub fn parse_list(order_by: &str) -> Vec<OrderField> {
        order_by
            .split(',')
            .filter_map(|item| {
                let mut tokens = item.split_whitespace();
                let name = tokens.next()?;
                let direction = tokens.next().and_then(SortDir::parse).unwrap_or_default();
                Some(OrderField::new(name, direction))
            })
            .collect()
    }
}

/// Position marker for multi-column pagination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeCursor {
    /// Boundary values by column name.
    pub key_values: BTreeMap<String, Value>,
    /// Sort columns, most significant first.
    pub order_fields: Vec<OrderField>,
    pub forward: bool,
    pub limit: usize,
}

impl CompositeCursor {
    pub fn new(order_fields: Vec<OrderField>, limit: usize) -> Self {
        Self {
            key_values: BTreeMap::new(),
            order_fields,
            forward: true,
            limit,
        }
    }

    /// Set the boundary value of one sort column.
    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key_values.insert(name.into(), value.into());
        self
    }

    /// Page toward earlier rows.
    pub fn backward(mut self) -> Self {
        self.forward = false;
        self
    }
}

/// Cursor state remembered by a query so page assembly can derive the next
/// and previous cursors.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Seek {
    Key {
        field: String,
        page_limit: Option<usize>,
    },
    Composite {
        order_fields: Vec<OrderField>,
        page_limit: Option<usize>,
    },
}

impl Seek {
    /// The requested page size before the over-fetch bump, if any.
    pub(crate) fn page_limit(&self) -> Option<usize> {
        match self {
            Seek::Key { page_limit, .. } | Seek::Composite { page_limit, .. } => *page_limit,
        }
    }
}
