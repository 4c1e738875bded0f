//! Column conversions shared by the repositories.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, err.into())
}

/// Unix seconds to a UTC timestamp.
pub(crate) fn timestamp(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        conversion_error(idx, Type::Integer, format!("timestamp out of range: {secs}"))
    })
}

pub(crate) fn opt_timestamp(
    idx: usize,
    secs: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    secs.map(|s| timestamp(idx, s)).transpose()
}

pub(crate) fn uuid(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| conversion_error(idx, Type::Text, e))
}

/// Parse a status column through its `FromStr` impl.
pub(crate) fn status<T: FromStr<Err = String>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    T::from_str(raw).map_err(|e| conversion_error(idx, Type::Text, e))
}

pub(crate) const fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) const fn int_to_bool(value: i64) -> bool {
    value != 0
}
