//! Convenient imports for typical `pgseek` usage.
//!
//! ```ignore
//! use pgseek::prelude::*;
//! ```

pub use crate::{
    CompositeCursor, Cursor, FromRow, GenericClient, OrderField, PageResult, Query, Record,
    RowExt, SeekError, SeekResult, SortDir, Value, params, table,
};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool, create_pool_with_config};
