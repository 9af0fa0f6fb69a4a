//! Dynamically typed bind values.
//!
//! Builder arguments and cursor key values are stored as [`Value`] so a query
//! can be cloned, compared, logged and serialized (cursors travel to clients
//! and come back). Encoding follows the parameter type Postgres infers for the
//! placeholder, so `Value::Int(7)` binds to `int2`, `int4`, `int8` and
//! `numeric` columns alike. Conversions that would lose information (a
//! timestamp with a time of day bound to `date`) are rejected.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use crate::error::SeekError;

type BoxError = Box<dyn Error + Sync + Send>;

/// A bind value of any supported type, or SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    /// Timestamp without time zone.
    NaiveTimestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Uuid(_) => "uuid",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::NaiveTimestamp(_) => "naive timestamp",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }

    fn mismatch(&self, ty: &Type) -> BoxError {
        Box::new(SeekError::Encode(format!(
            "cannot bind {} value to parameter of type {}",
            self.type_name(),
            ty
        )))
    }

    /// The calendar date of `dt`, refusing to drop a time of day.
    fn date_only(&self, dt: NaiveDateTime) -> Result<NaiveDate, BoxError> {
        if dt.time() == NaiveTime::MIN {
            Ok(dt.date())
        } else {
            Err(Box::new(SeekError::Encode(format!(
                "{} value {dt} has a time of day; binding it to date would drop it",
                self.type_name()
            ))))
        }
    }
}

/// Accepts `2024-03-01T12:30:00[.fff]`, the space-separated form, or RFC 3339
/// (converted to UTC).
fn parse_naive_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    Ok(DateTime::parse_from_rfc3339(s)?.naive_utc())
}

fn is_text_like(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ if is_text_like(ty) => v.to_string().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Text(s) => match *ty {
                Type::UUID => Uuid::parse_str(s)?.to_sql(ty, out),
                Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(s)?
                    .with_timezone(&Utc)
                    .to_sql(ty, out),
                Type::TIMESTAMP => parse_naive_timestamp(s)?.to_sql(ty, out),
                Type::DATE => s.parse::<NaiveDate>()?.to_sql(ty, out),
                Type::NUMERIC => s.parse::<Decimal>()?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ if is_text_like(ty) => s.as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Uuid(u) => match *ty {
                Type::UUID => u.to_sql(ty, out),
                _ if is_text_like(ty) => u.to_string().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Decimal(d) => match *ty {
                Type::NUMERIC => d.to_sql(ty, out),
                _ if is_text_like(ty) => d.to_string().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.to_sql(ty, out),
                Type::TIMESTAMP => dt.naive_utc().to_sql(ty, out),
                Type::DATE => self.date_only(dt.naive_utc())?.to_sql(ty, out),
                _ if is_text_like(ty) => dt.to_rfc3339().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::NaiveTimestamp(dt) => match *ty {
                Type::TIMESTAMP => dt.to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => self.date_only(*dt)?.to_sql(ty, out),
                _ if is_text_like(ty) => dt
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string()
                    .as_str()
                    .to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Date(d) => match *ty {
                Type::DATE => d.to_sql(ty, out),
                Type::TIMESTAMP => d.and_time(NaiveTime::MIN).to_sql(ty, out),
                Type::TIMESTAMPTZ => d.and_time(NaiveTime::MIN).and_utc().to_sql(ty, out),
                _ if is_text_like(ty) => d.to_string().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ if is_text_like(ty) => v.to_string().as_str().to_sql(ty, out),
                _ => Err(self.mismatch(ty)),
            },
        }
    }

    // Mismatches are reported by `to_sql` with the offending value type.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::NaiveTimestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions.
///
/// ```ignore
/// let q = pgseek::table("users").filter("status = $1 AND age > $2", pgseek::params!["active", 18]);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
