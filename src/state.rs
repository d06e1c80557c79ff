use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ConfigError;
use crate::source::{Page, Record};
use crate::summary::{summarize, Summary};
use crate::window;

/// Where the fraud subset is drawn from. The dashboard's revisions differed
/// on this; it is a single policy knob rather than two hardcoded variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FraudScope {
    /// All records accumulated this session.
    Full,
    /// Only the current display window.
    Window,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub poll_interval_secs: u64,
    pub page_size: u32,
    pub display_window_size: usize,
    pub fetch_timeout_secs: u64,
    pub fraud_scope: FraudScope,
    pub source_url: Option<String>,
    #[serde(skip_serializing)]
    pub source_token: Option<String>,
    pub sqlite_path: Option<String>,
    pub source_table: String,
    pub fraud_share_alert: f64,
    pub avg_score_alert: f64,
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
        Err(_) => Ok(default),
    }
}

fn env_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads configuration from the environment. Bad values are fatal here,
    /// before anything fetches or renders.
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_secs = env_u64("POLL_SECS", 60)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "POLL_SECS",
                value: "0".into(),
            });
        }
        let page_size = env_u64("PAGE_SIZE", 5000)?;
        if page_size == 0 || page_size > u32::MAX as u64 {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE",
                value: page_size.to_string(),
            });
        }
        let display_window_size = env_u64("WINDOW_SIZE", 1000)?;
        if display_window_size == 0 {
            return Err(ConfigError::Invalid {
                name: "WINDOW_SIZE",
                value: "0".into(),
            });
        }
        let fetch_timeout_secs = env_u64("FETCH_TIMEOUT_SECS", 10)?;
        if fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "FETCH_TIMEOUT_SECS",
                value: "0".into(),
            });
        }
        let fraud_scope = match std::env::var("FRAUD_SCOPE").as_deref() {
            Ok("window") => FraudScope::Window,
            Ok("full") | Err(_) => FraudScope::Full,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "FRAUD_SCOPE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            poll_interval_secs,
            page_size: page_size as u32,
            display_window_size: display_window_size as usize,
            fetch_timeout_secs,
            fraud_scope,
            source_url: std::env::var("SOURCE_URL").ok(),
            source_token: std::env::var("SOURCE_TOKEN").ok(),
            sqlite_path: std::env::var("SQLITE_PATH").ok(),
            source_table: std::env::var("SOURCE_TABLE")
                .unwrap_or_else(|_| "fraud_monitor_logs".to_string()),
            fraud_share_alert: env_f64("FRAUD_SHARE_ALERT", 0.25)?,
            avg_score_alert: env_f64("AVG_SCORE_ALERT", 0.8)?,
        })
    }

    /// Serialized config without credentials, for run manifests.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Hash of the effective configuration, for run provenance.
    pub fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Last fetch failure, surfaced to the renderer as a transient flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub kind: String,
    pub detail: String,
}

/// Per-session accumulation store. Owned by one session loop, passed by
/// `&mut` into each poll cycle. Append-only: nothing ever truncates or
/// reorders `all_records`, and `offset == all_records.len()` after every
/// completed cycle, failed ones included.
#[derive(Debug, Default)]
pub struct SessionState {
    all_records: Vec<Record>,
    offset: u64,
    last_error: Option<FetchFailure>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page and advances the offset in one step. Readers only see
    /// the store between cycles, never mid-append.
    pub fn append(&mut self, page: Page) -> usize {
        let appended = page.records.len();
        self.all_records.extend(page.records);
        self.offset += appended as u64;
        debug_assert_eq!(self.offset as usize, self.all_records.len());
        appended
    }

    pub fn record_failure(&mut self, kind: &str, detail: String) {
        self.last_error = Some(FetchFailure {
            kind: kind.to_string(),
            detail,
        });
    }

    pub fn clear_failure(&mut self) {
        self.last_error = None;
    }

    pub fn snapshot(&self) -> (&[Record], u64) {
        (&self.all_records, self.offset)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.all_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_records.is_empty()
    }

    pub fn last_error(&self) -> Option<&FetchFailure> {
        self.last_error.as_ref()
    }

    /// Derives the immutable per-cycle snapshot for the presentation layer.
    /// Summary statistics are computed over the display window, matching
    /// what the viewer actually sees.
    pub fn render(&self, cfg: &Config) -> RenderSnapshot {
        let display_window = window::window(&self.all_records, cfg.display_window_size).to_vec();
        let fraud_subset = match cfg.fraud_scope {
            FraudScope::Full => window::fraud_subset(&self.all_records),
            FraudScope::Window => window::fraud_subset(&display_window),
        };
        let summary = summarize(&display_window);
        RenderSnapshot {
            total_count: self.all_records.len(),
            display_window,
            fraud_subset,
            summary,
            last_error: self.last_error.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// Everything the presentation layer consumes for one render cycle. It
/// never reaches past this into the store or the source client.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub total_count: usize,
    pub display_window: Vec<Record>,
    pub fraud_subset: Vec<Record>,
    pub summary: Summary,
    pub last_error: Option<FetchFailure>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Status;
    use chrono::TimeZone;

    fn rec(secs: i64, status: Status, score: f64) -> Record {
        Record {
            event_time: Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap(),
            status,
            fraud_score: score,
            extra: Default::default(),
        }
    }

    fn page(offset: u64, records: Vec<Record>) -> Page {
        Page { offset, records }
    }

    #[test]
    fn offset_tracks_length_across_appends() {
        let mut state = SessionState::new();
        assert_eq!(state.offset(), 0);

        state.append(page(0, vec![rec(0, Status::Normal, 0.1), rec(1, Status::Fraud, 0.9)]));
        assert_eq!(state.offset(), 2);
        assert_eq!(state.len(), 2);

        state.append(page(2, vec![rec(2, Status::Normal, 0.2)]));
        assert_eq!(state.offset(), 3);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn empty_page_append_is_noop() {
        let mut state = SessionState::new();
        state.append(page(0, vec![rec(0, Status::Normal, 0.1)]));
        let before: Vec<Record> = state.snapshot().0.to_vec();

        state.append(Page::empty(1));
        assert_eq!(state.offset(), 1);
        assert_eq!(state.snapshot().0, before.as_slice());
    }

    #[test]
    fn failure_flag_does_not_touch_records() {
        let mut state = SessionState::new();
        state.append(page(0, vec![rec(0, Status::Fraud, 0.7)]));
        let before: Vec<Record> = state.snapshot().0.to_vec();

        state.record_failure("source_unavailable", "timeout".into());
        assert_eq!(state.offset(), 1);
        assert_eq!(state.snapshot().0, before.as_slice());
        assert_eq!(state.last_error().unwrap().kind, "source_unavailable");

        state.clear_failure();
        assert!(state.last_error().is_none());
    }

    #[test]
    fn render_respects_fraud_scope() {
        std::env::remove_var("FRAUD_SCOPE");
        let mut cfg = Config::from_env().unwrap();
        cfg.display_window_size = 2;

        let mut state = SessionState::new();
        // Fraud record falls outside the 2-record display window.
        state.append(page(
            0,
            vec![
                rec(0, Status::Fraud, 0.9),
                rec(1, Status::Normal, 0.1),
                rec(2, Status::Normal, 0.2),
            ],
        ));

        cfg.fraud_scope = FraudScope::Full;
        let snap = state.render(&cfg);
        assert_eq!(snap.total_count, 3);
        assert_eq!(snap.display_window.len(), 2);
        assert_eq!(snap.fraud_subset.len(), 1);

        cfg.fraud_scope = FraudScope::Window;
        let snap = state.render(&cfg);
        assert_eq!(snap.fraud_subset.len(), 0);
    }

    #[test]
    fn config_hash_is_deterministic_and_excludes_token() {
        let mut cfg = Config::from_env().unwrap();
        cfg.source_token = Some("secret".into());
        let h1 = cfg.config_hash();
        cfg.source_token = Some("other-secret".into());
        let h2 = cfg.config_hash();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(!cfg.to_json().contains("secret"));
    }
}
