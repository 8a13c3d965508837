//! Blocking HTTP session wrapper shared by every adapter.
//!
//! One `reqwest::blocking::Client` is built per run (not per request) and
//! carries a fixed user agent and timeout; adapters never touch `reqwest`
//! directly so that retry/backoff and error mapping stay uniform in one
//! place.

use std::time::Duration;

use chrono::{DateTime, Utc};
use harvester_retry::{RetryExecutor, RetryStrategyConfig};
use harvester_types::{HarvestError, Result};

pub const USER_AGENT: &str = concat!("content-harvester/", env!("CARGO_PKG_VERSION"), " (+local)");
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// A configured blocking HTTP client plus the retry policy adapters should
/// apply to transient failures.
#[derive(Clone)]
pub struct Session {
    client: reqwest::blocking::Client,
    retry: RetryStrategyConfig,
}

impl Session {
    pub fn new(timeout: Duration, retry_config: harvester_retry::RetryStrategyConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self { client, retry: retry_config }
    }

    pub fn with_default_timeout() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            harvester_retry::RetryStrategyConfig::default(),
        )
    }

    pub fn get_text(&self, url: &str) -> Result<String> {
        let response = self.fetch_with_retry(url)?;
        response
            .text()
            .map_err(|e| HarvestError::Fetch(format!("{url}: {e}")))
    }

    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.fetch_with_retry(url)?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| HarvestError::Fetch(format!("{url}: {e}")))
    }

    pub fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.fetch_with_retry(url)?;
        response
            .json::<T>()
            .map_err(|e| HarvestError::Fetch(format!("{url}: {e}")))
    }

    /// Retries transient failures (connection errors, 5xx) with backoff;
    /// a 4xx response is the server telling us plainly not to bother, so it
    /// surfaces on the first attempt instead of burning through the budget.
    fn fetch_with_retry(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let executor = RetryExecutor::new(self.retry.clone());
        executor.run_retryable(is_retryable, |_attempt| self.fetch(url))
    }

    fn fetch(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| HarvestError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// A connection-level failure or a 5xx is worth retrying; a 4xx is the
/// server's final word for this request.
fn is_retryable(err: &HarvestError) -> bool {
    match err {
        HarvestError::Http { status, .. } => *status >= 500,
        HarvestError::Fetch(_) => true,
        _ => false,
    }
}

/// Per-run context threaded through adapters: one shared [`Session`], the
/// run's id, and a fixed `now` so every item archived during the same run
/// carries the same timestamp.
#[derive(Clone)]
pub struct FetchContext {
    pub session: Session,
    pub run_id: String,
    pub now: DateTime<Utc>,
}

impl FetchContext {
    pub fn new(session: Session, run_id: String, now: DateTime<Utc>) -> Self {
        Self { session, run_id, now }
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`, matching every other internally generated
    /// timestamp in the store.
    pub fn now_iso(&self) -> String {
        self.now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}
