use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{ConfigError, FetchError};
use crate::state::Config;

use super::{Page, Record, RecordSource};

/// Record source backed by an HTTP endpoint that accepts `offset` and
/// `limit` query parameters and returns a JSON array of records.
pub struct HttpSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        let base_url = cfg
            .source_url
            .clone()
            .ok_or(ConfigError::Missing("SOURCE_URL"))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "SOURCE_URL",
                value: base_url,
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "FETCH_TIMEOUT_SECS",
                value: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            token: cfg.source_token.clone(),
        })
    }

    fn classify(err: reqwest::Error) -> FetchError {
        // Timeouts and transport failures are retried next tick; a body
        // that arrived but does not decode is a different failure.
        if err.is_decode() {
            FetchError::SourceDataInvalid(err.to_string())
        } else {
            FetchError::SourceUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, offset: u64, limit: u32) -> Result<Page, FetchError> {
        let mut req = self
            .client
            .get(&self.base_url)
            .query(&[("offset", offset.to_string()), ("limit", limit.to_string())]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(Self::classify)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::SourceUnavailable(format!(
                "endpoint returned {}",
                status
            )));
        }

        let records: Vec<Record> = resp.json().await.map_err(Self::classify)?;
        if records.len() as u64 > limit as u64 {
            return Err(FetchError::SourceDataInvalid(format!(
                "endpoint returned {} records for limit {}",
                records.len(),
                limit
            )));
        }
        Ok(Page { offset, records })
    }
}
