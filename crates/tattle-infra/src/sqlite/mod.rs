//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod actor;
pub mod gossip;
pub mod interaction;
pub mod message;
pub mod pool;
pub mod profile;
pub mod room;
pub mod story;
pub mod trend;

use chrono::{DateTime, Utc};
use tattle_types::error::RepositoryError;

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Format a timestamp for storage.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Decode a JSON-encoded id list column.
pub(crate) fn parse_id_list<T: std::str::FromStr>(json: &str) -> Result<Vec<T>, RepositoryError>
where
    T::Err: std::fmt::Display,
{
    let raw: Vec<String> = serde_json::from_str(json)
        .map_err(|e| RepositoryError::Query(format!("invalid id list JSON: {e}")))?;
    raw.iter()
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| RepositoryError::Query(format!("invalid id in list: {e}")))
        })
        .collect()
}

/// Encode an id list for storage.
pub(crate) fn encode_id_list<T: std::fmt::Display>(ids: &[T]) -> Result<String, RepositoryError> {
    let raw: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    serde_json::to_string(&raw).map_err(|e| RepositoryError::Query(e.to_string()))
}
