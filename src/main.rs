use anyhow::Result;
use serde_json::json;

use fraudmon::logging::{log, obj, v_num, v_str, Domain, Level};
use fraudmon::poll::Poller;
use fraudmon::source::SourceKind;
use fraudmon::state::{Config, SessionState};
use fraudmon::{monitor, view};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            log(
                Level::Fatal,
                Domain::System,
                "config_error",
                obj(&[("error", v_str(&err.to_string()))]),
            );
            return Err(err.into());
        }
    };

    let kind = SourceKind::from_env();
    let source = match kind.build(&cfg) {
        Ok(source) => source,
        Err(err) => {
            log(
                Level::Fatal,
                Domain::System,
                "source_config_error",
                obj(&[
                    ("source", v_str(kind.as_str())),
                    ("error", v_str(&err.to_string())),
                ]),
            );
            return Err(err.into());
        }
    };

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("source", v_str(kind.as_str())),
            ("poll_secs", json!(cfg.poll_interval_secs)),
            ("page_size", json!(cfg.page_size)),
            ("window_size", json!(cfg.display_window_size)),
            ("config_hash", v_str(&cfg.config_hash())),
        ]),
    );

    // One session per process; the store lives exactly as long as this loop.
    let mut state = SessionState::new();
    let alert_cfg = cfg.clone();
    let poller = Poller::new(source, cfg);

    poller
        .run(&mut state, |snapshot| {
            log(
                Level::Info,
                Domain::Render,
                "kpis",
                obj(&[
                    ("total_transactions", json!(snapshot.total_count)),
                    ("window_count", json!(snapshot.summary.count)),
                    ("fraud_count", json!(snapshot.summary.fraud_count)),
                    ("avg_fraud_score", v_num(snapshot.summary.avg_score)),
                    (
                        "last_error",
                        snapshot
                            .last_error
                            .as_ref()
                            .map(|e| v_str(&e.kind))
                            .unwrap_or(serde_json::Value::Null),
                    ),
                ]),
            );
            log(
                Level::Debug,
                Domain::Render,
                "status_counts",
                obj(&[(
                    "counts",
                    json!(view::status_counts(&snapshot.display_window)),
                )]),
            );
            for alert in monitor::scan(snapshot, &alert_cfg) {
                log(
                    Level::Warn,
                    Domain::Monitor,
                    "alert",
                    obj(&[("event", v_str(&format!("{:?}", alert)))]),
                );
            }
        })
        .await;

    Ok(())
}
