//! # pgseek
//!
//! An immutable PostgreSQL query builder with keyset (cursor) pagination.
//!
//! ## Features
//!
//! - **Copy-on-write builder**: every mutator returns a new [`Query`]; a base
//!   query can be shared and refined without the copies observing each other
//! - **SQL explicit**: predicates, joins and ordering are plain SQL fragments
//! - **Keyset pagination**: single-key ([`Cursor`]) and row-tuple
//!   ([`CompositeCursor`]) cursors, over-fetch based "has next" detection and
//!   an optional concurrent total count
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`] is expected
//! - **Observable**: [`monitor::TracingClient`] logs every statement via `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use pgseek::prelude::*;
//!
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! pgseek::impl_record!(User { id, name });
//!
//! let active = table("users").filter("status = $1", params!["active"]).order_by("id ASC");
//!
//! // First page, with the total. The cursor sets the page size.
//! let page: PageResult<User> = active
//!     .with_cursor("id", Some(&Cursor::first(20)))
//!     .get_page(&client, true)
//!     .await?;
//!
//! // Following page.
//! if let Some(next) = &page.next_cursor {
//!     let page: PageResult<User> = active.with_cursor("id", Some(next)).get_page(&client, false).await?;
//! }
//! ```
//!
//! Placeholders: write caller fragments with `$1, $2, ...` (or `?`); cursor
//! predicates are numbered after them when the statement is rendered.

pub mod client;
pub mod config;
pub mod cursor;
pub mod error;
pub mod prelude;
pub mod query;
pub mod record;
pub mod value;

#[cfg(feature = "tracing")]
pub mod monitor;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::GenericClient;
pub use config::PoolConfig;
pub use cursor::{CompositeCursor, Cursor, OrderField, PageResult, SortDir};
pub use error::{SeekError, SeekResult};
pub use query::{Query, QueryConfig, rebind, table};
pub use record::{FromRow, Record, RowExt};
pub use tokio_postgres::Row;
pub use value::Value;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
