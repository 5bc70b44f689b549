// src/source/mod.rs
pub mod supabase;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use supabase::SupabaseSource;

/// Upper bound on rows pulled per sync run.
pub const BATCH_SIZE: usize = 100;

/// Row identifier as the store returns it (bigint or uuid/text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub serde_json::Value);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(v.into())
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        Self(v.into())
    }
}

/// One source row. Extra columns returned by `select=*` are ignored.
///
/// A null or absent `created_at` still decodes; the row is forwarded as-is and
/// only its own page creation fails downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Newest `created_at` first, at most [`BATCH_SIZE`] rows.
    async fn fetch_recent(&self) -> Result<Vec<Record>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_with_nulls_and_extra_columns() {
        let raw = r#"{"id":2,"name":null,"status":null,"created_at":"2024-01-02","owner":"x"}"#;
        let r: Record = serde_json::from_str(raw).unwrap();
        assert_eq!(r.id, RecordId::from(2i64));
        assert!(r.name.is_none());
        assert!(r.status.is_none());
        assert_eq!(r.created_at.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn record_id_displays_without_quotes() {
        assert_eq!(RecordId::from("a1b2").to_string(), "a1b2");
        assert_eq!(RecordId::from(42i64).to_string(), "42");
    }

    #[test]
    fn null_or_missing_created_at_still_decodes() {
        let null: Record = serde_json::from_str(r#"{"id":1,"created_at":null}"#).unwrap();
        assert!(null.created_at.is_none());
        let absent: Record = serde_json::from_str(r#"{"id":2,"name":"A"}"#).unwrap();
        assert!(absent.created_at.is_none());
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(serde_json::from_str::<Record>(r#"{"name":"A"}"#).is_err());
    }
}
