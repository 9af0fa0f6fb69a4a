//! Row mapping and record schema description.

use crate::error::{SeekError, SeekResult};
use crate::value::Value;
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use pgseek::{FromRow, RowExt, SeekResult};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &tokio_postgres::Row) -> SeekResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             username: row.try_get_column("username")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> SeekResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning SeekError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> SeekResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> SeekResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| SeekError::decode(column, e.to_string()))
    }
}

/// Static description of a record type's fields.
///
/// Page assembly uses this to read cursor key values by column name from the
/// first/last row of a page instead of guessing by field position.
pub trait Record {
    /// Column names in declaration order.
    fn field_names() -> &'static [&'static str];

    /// The value of the named field, or `None` if the record has no such field.
    fn value_for(&self, name: &str) -> Option<Value>;

    /// Whether `name` is one of [`Record::field_names`].
    fn has_field(name: &str) -> bool {
        Self::field_names().contains(&name)
    }
}

/// Implement [`FromRow`] and [`Record`] for a struct whose field names match
/// its column names.
///
/// Every listed field must implement `FromSql`, `Clone` and `Into<Value>`.
///
/// ```ignore
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// pgseek::impl_record!(User { id, name, email });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::FromRow for $ty {
            fn from_row(row: &$crate::Row) -> $crate::SeekResult<Self> {
                use $crate::RowExt as _;
                Ok(Self {
                    $($field: row.try_get_column(stringify!($field))?,)+
                })
            }
        }

        impl $crate::Record for $ty {
            fn field_names() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn value_for(&self, name: &str) -> Option<$crate::Value> {
                match name {
                    $(stringify!($field) => Some($crate::Value::from(self.$field.clone())),)+
                    _ => None,
                }
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod fixtures {
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Item {
        pub id: i64,
        pub name: String,
    }

    crate::impl_record!(Item { id, name });
}
