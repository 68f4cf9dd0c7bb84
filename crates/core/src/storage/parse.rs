//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::Error as SqlError;
use serde_json::Value;

use crate::models::{ChangeKind, Document};

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SqlError::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Parse an object's JSON property map
pub fn parse_properties(s: &str) -> Result<BTreeMap<String, Value>, SqlError> {
    serde_json::from_str(s).map_err(|e| SqlError::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Parse a journaled document snapshot
pub fn parse_snapshot(s: &str) -> Result<Document, SqlError> {
    serde_json::from_str(s).map_err(|e| SqlError::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Parse a stored change kind
pub fn parse_kind(s: &str) -> Result<ChangeKind, SqlError> {
    ChangeKind::parse(s).ok_or_else(|| {
        SqlError::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("unknown change kind '{}'", s).into(),
        )
    })
}

/// Render any SQLite value as the string a query row carries
pub fn value_to_string(value: SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s,
        SqlValue::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

/// Next minor revision: `2.5` -> `2.6`; anything unparseable restarts at `1.1`
pub fn next_version(current: &str) -> String {
    current
        .split_once('.')
        .and_then(|(major, minor)| {
            let major: u32 = major.parse().ok()?;
            let minor: u32 = minor.parse().ok()?;
            Some(format!("{}.{}", major, minor + 1))
        })
        .unwrap_or_else(|| "1.1".to_string())
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version() {
        assert_eq!(next_version("1.1"), "1.2");
        assert_eq!(next_version("2.9"), "2.10");
        assert_eq!(next_version("garbage"), "1.1");
        assert_eq!(next_version(""), "1.1");
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(SqlValue::Null), "");
        assert_eq!(value_to_string(SqlValue::Integer(1)), "1");
        assert_eq!(value_to_string(SqlValue::Text("x".into())), "x");
    }

    #[test]
    fn test_parse_kind_rejects_unknown() {
        assert_eq!(parse_kind("deleted").unwrap(), ChangeKind::Deleted);
        assert!(parse_kind("moved").is_err());
    }
}
