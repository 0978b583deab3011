//! Owned SQL parameter values.
//!
//! The query builder accumulates parameters as owned values so that a built
//! query can outlive the filter it was derived from. At execution time the
//! vector is lowered to the `&[&dyn ToSql]` slice `may_postgres` expects.

use chrono::{DateTime, NaiveDate, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use uuid::Uuid;

/// An owned query parameter.
///
/// One variant per column type the filter model can bind. Everything here
/// has a `ToSql` impl via `postgres-types` (uuid, chrono and decimal support
/// come from the feature flags in Cargo.toml).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
    Int(i32),
    BigInt(i64),
    Bool(bool),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl SqlValue {
    /// Borrow the inner value as a `ToSql` trait object.
    pub fn as_sql(&self) -> &dyn ToSql {
        match self {
            SqlValue::Uuid(v) => v,
            SqlValue::Text(v) => v,
            SqlValue::Int(v) => v,
            SqlValue::BigInt(v) => v,
            SqlValue::Bool(v) => v,
            SqlValue::Decimal(v) => v,
            SqlValue::Timestamp(v) => v,
            SqlValue::Date(v) => v,
        }
    }

    /// Lower an owned parameter vector to the borrowed slice shape the
    /// executor takes.
    pub fn borrow_all(params: &[SqlValue]) -> Vec<&dyn ToSql> {
        params.iter().map(SqlValue::as_sql).collect()
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}
