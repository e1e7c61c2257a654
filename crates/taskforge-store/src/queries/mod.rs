pub mod agent;
pub mod config;
pub mod dependency;
pub mod event;
pub mod learning;
pub mod resource;
pub mod story;
pub mod task;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Query(format!("Malformed timestamp '{}': {}", s, e)))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.map(|v| parse_ts(&v)).transpose()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Escape LIKE wildcards so user text matches literally (ESCAPE '\').
pub(crate) fn like_escape(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_escape() {
        assert_eq!(like_escape("50%_done"), "50\\%\\_done");
        assert_eq!(like_escape("plain"), "plain");
    }

    #[test]
    fn test_ts_round_trip() {
        let now = now_ts();
        assert!(parse_ts(&now).is_ok());
        assert!(parse_ts("not a timestamp").is_err());
    }
}
