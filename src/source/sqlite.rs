use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::{Map, Number, Value};
use std::sync::Mutex;

use crate::error::{ConfigError, FetchError};
use crate::state::Config;

use super::{Page, Record, RecordSource, Status};

/// Record source backed by a relational table, paged by
/// `ORDER BY event_time LIMIT ? OFFSET ?`. Columns beyond the three the
/// dashboard computes over are carried through into `Record::extra`.
pub struct SqliteSource {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteSource {
    pub fn open(cfg: &Config) -> Result<Self, ConfigError> {
        let path = cfg
            .sqlite_path
            .clone()
            .ok_or(ConfigError::Missing("SQLITE_PATH"))?;
        let conn = Connection::open(&path).map_err(|e| ConfigError::Invalid {
            name: "SQLITE_PATH",
            value: format!("{}: {}", path, e),
        })?;
        if !cfg.source_table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Invalid {
                name: "SOURCE_TABLE",
                value: cfg.source_table.clone(),
            });
        }
        Ok(Self {
            conn: Mutex::new(conn),
            table: cfg.source_table.clone(),
        })
    }
}

#[async_trait]
impl RecordSource for SqliteSource {
    async fn fetch(&self, offset: u64, limit: u32) -> Result<Page, FetchError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| FetchError::SourceUnavailable("connection lock poisoned".into()))?;

        let sql = format!(
            "SELECT * FROM {} ORDER BY event_time LIMIT ?1 OFFSET ?2",
            self.table
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| FetchError::SourceUnavailable(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt
            .query(params![limit as i64, offset as i64])
            .map_err(|e| FetchError::SourceUnavailable(e.to_string()))?;

        let mut records = Vec::new();
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(FetchError::SourceUnavailable(e.to_string())),
            };

            let mut event_time: Option<DateTime<Utc>> = None;
            let mut status: Option<Status> = None;
            let mut fraud_score: Option<f64> = None;
            let mut extra = Map::new();

            for (i, name) in columns.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| FetchError::SourceDataInvalid(e.to_string()))?;
                match name.as_str() {
                    "event_time" => event_time = Some(parse_event_time(value)?),
                    "status" => {
                        let text = value.as_str().map_err(|e| {
                            FetchError::SourceDataInvalid(format!("status: {}", e))
                        })?;
                        status = Some(Status::from_text(text));
                    }
                    "fraud_score" => {
                        fraud_score = Some(match value {
                            ValueRef::Real(f) => f,
                            ValueRef::Integer(i) => i as f64,
                            other => {
                                return Err(FetchError::SourceDataInvalid(format!(
                                    "fraud_score has type {:?}",
                                    other.data_type()
                                )))
                            }
                        });
                    }
                    _ => {
                        extra.insert(name.clone(), value_to_json(value));
                    }
                }
            }

            records.push(Record {
                event_time: event_time
                    .ok_or_else(|| FetchError::SourceDataInvalid("missing event_time".into()))?,
                status: status
                    .ok_or_else(|| FetchError::SourceDataInvalid("missing status".into()))?,
                fraud_score: fraud_score
                    .ok_or_else(|| FetchError::SourceDataInvalid("missing fraud_score".into()))?,
                extra,
            });
        }

        Ok(Page { offset, records })
    }
}

/// Accepts epoch seconds (INTEGER) or RFC3339 / `YYYY-MM-DD HH:MM:SS` text.
fn parse_event_time(value: ValueRef<'_>) -> Result<DateTime<Utc>, FetchError> {
    match value {
        ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| FetchError::SourceDataInvalid(format!("event_time out of range: {}", secs))),
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| FetchError::SourceDataInvalid(format!("event_time: {}", e)))?;
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|n| n.and_utc())
                .map_err(|e| FetchError::SourceDataInvalid(format!("event_time '{}': {}", s, e)))
        }
        other => Err(FetchError::SourceDataInvalid(format!(
            "event_time has type {:?}",
            other.data_type()
        ))),
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}
