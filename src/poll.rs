//! Fixed-interval poll scheduler. Each cycle fetches the next page at the
//! current offset, appends it (or flags the failure and leaves the store
//! untouched), and hands an immutable snapshot to the render callback.

use std::time::Instant;

use serde_json::json;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::source::RecordSource;
use crate::state::{Config, RenderSnapshot, SessionState};

pub struct Poller {
    source: Box<dyn RecordSource + Send + Sync>,
    cfg: Config,
}

impl Poller {
    pub fn new(source: Box<dyn RecordSource + Send + Sync>, cfg: Config) -> Self {
        Self { source, cfg }
    }

    /// One full poll cycle. Fetch errors stop at this boundary: the store
    /// is left byte-for-byte unchanged and the snapshot carries the error
    /// flag. The next cycle retries at the same offset.
    pub async fn tick(&self, state: &mut SessionState) -> RenderSnapshot {
        let offset = state.offset();
        let started = Instant::now();

        match self.source.fetch(offset, self.cfg.page_size).await {
            Ok(page) => {
                let appended = state.append(page);
                state.clear_failure();
                log(
                    Level::Info,
                    Domain::Source,
                    "fetch_ok",
                    obj(&[
                        ("offset", json!(offset)),
                        ("appended", json!(appended)),
                        ("total", json!(state.len())),
                        ("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0)),
                    ]),
                );
            }
            Err(err) => {
                state.record_failure(err.kind(), err.to_string());
                log(
                    Level::Warn,
                    Domain::Source,
                    "fetch_failed",
                    obj(&[
                        ("offset", json!(offset)),
                        ("kind", v_str(err.kind())),
                        ("error", v_str(&err.to_string())),
                        ("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0)),
                    ]),
                );
            }
        }

        state.render(&self.cfg)
    }

    /// Drives cycles at the configured interval until the session ends.
    /// The cycle is awaited inline and missed ticks are skipped, so at most
    /// one cycle is ever in flight; a tick that comes due while a fetch is
    /// still blocking is coalesced, not queued.
    pub async fn run<F>(&self, state: &mut SessionState, mut on_render: F)
    where
        F: FnMut(&RenderSnapshot),
    {
        let mut ticker = interval(Duration::from_secs(self.cfg.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let snapshot = self.tick(state).await;
            log(
                Level::Debug,
                Domain::Render,
                "snapshot",
                obj(&[
                    ("total", json!(snapshot.total_count)),
                    ("window", json!(snapshot.display_window.len())),
                    ("fraud", json!(snapshot.fraud_subset.len())),
                    ("avg_score", v_num(snapshot.summary.avg_score)),
                ]),
            );
            on_render(&snapshot);
        }
    }
}
