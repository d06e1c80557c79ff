use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, FetchError};
use crate::state::Config;

pub mod http;
pub mod sqlite;

/// Upstream scoring verdict. The scoring itself happens upstream; these
/// values are opaque inputs here. Statuses this build does not know about
/// are preserved as `Unknown` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Normal,
    Fraud,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn is_fraud(&self) -> bool {
        matches!(self, Status::Fraud)
    }

    pub fn from_text(s: &str) -> Self {
        match s {
            "NORMAL" => Status::Normal,
            "FRAUD" => Status::Fraud,
            _ => Status::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "NORMAL",
            Status::Fraud => "FRAUD",
            Status::Unknown => "UNKNOWN",
        }
    }
}

/// One scored transaction. Immutable once fetched. Fields beyond the three
/// the dashboard computes over ride along in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub event_time: DateTime<Utc>,
    pub status: Status,
    pub fraud_score: f64,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// One batch of records returned by a single fetch, tagged with the offset
/// that produced it. Empty means "caught up to the live edge", not
/// end-of-stream: the source keeps growing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub offset: u64,
    pub records: Vec<Record>,
}

impl Page {
    pub fn empty(offset: u64) -> Self {
        Self {
            offset,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A paged view over the source's total ordered record set. `offset` and
/// `limit` must select a contiguous, non-overlapping slice so successive
/// fetches never duplicate or skip records.
#[async_trait]
pub trait RecordSource {
    async fn fetch(&self, offset: u64, limit: u32) -> Result<Page, FetchError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Sqlite,
}

impl SourceKind {
    pub fn from_env() -> Self {
        match std::env::var("SOURCE").unwrap_or_else(|_| "http".to_string()).as_str() {
            "sqlite" => SourceKind::Sqlite,
            _ => SourceKind::Http,
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Box<dyn RecordSource + Send + Sync>, ConfigError> {
        match self {
            SourceKind::Http => Ok(Box::new(http::HttpSource::new(cfg)?)),
            SourceKind::Sqlite => Ok(Box::new(sqlite::SqliteSource::open(cfg)?)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Http => "http",
            SourceKind::Sqlite => "sqlite",
        }
    }
}
