use crate::state::{Config, RenderSnapshot};

/// Alert conditions derived from a single render snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    FraudShareHigh { share: f64 },
    AvgScoreHigh { avg_score: f64 },
    SourceError { kind: String },
}

/// Scans one snapshot against the configured thresholds.
pub fn scan(snapshot: &RenderSnapshot, cfg: &Config) -> Vec<AlertEvent> {
    let mut out = Vec::new();
    let s = &snapshot.summary;
    if s.count > 0 {
        let share = s.fraud_count as f64 / s.count as f64;
        if share > cfg.fraud_share_alert {
            out.push(AlertEvent::FraudShareHigh { share });
        }
    }
    if s.count > 0 && s.avg_score > cfg.avg_score_alert {
        out.push(AlertEvent::AvgScoreHigh {
            avg_score: s.avg_score,
        });
    }
    if let Some(err) = &snapshot.last_error {
        out.push(AlertEvent::SourceError {
            kind: err.kind.clone(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Page, Record, Status};
    use crate::state::SessionState;
    use chrono::{TimeZone, Utc};

    fn rec(status: Status, score: f64) -> Record {
        Record {
            event_time: Utc.timestamp_opt(1_750_000_000, 0).unwrap(),
            status,
            fraud_score: score,
            extra: Default::default(),
        }
    }

    fn cfg() -> Config {
        std::env::remove_var("FRAUD_SHARE_ALERT");
        std::env::remove_var("AVG_SCORE_ALERT");
        Config::from_env().unwrap()
    }

    #[test]
    fn quiet_snapshot_produces_no_alerts() {
        let mut state = SessionState::new();
        state.append(Page {
            offset: 0,
            records: vec![rec(Status::Normal, 0.1), rec(Status::Normal, 0.2)],
        });
        assert!(scan(&state.render(&cfg()), &cfg()).is_empty());
    }

    #[test]
    fn fraud_share_and_score_alerts_fire() {
        let mut state = SessionState::new();
        state.append(Page {
            offset: 0,
            records: vec![rec(Status::Fraud, 0.95), rec(Status::Fraud, 0.9)],
        });
        let alerts = scan(&state.render(&cfg()), &cfg());
        assert!(alerts
            .iter()
            .any(|a| matches!(a, AlertEvent::FraudShareHigh { .. })));
        assert!(alerts
            .iter()
            .any(|a| matches!(a, AlertEvent::AvgScoreHigh { .. })));
    }

    #[test]
    fn source_error_surfaces_as_alert() {
        let mut state = SessionState::new();
        state.record_failure("source_unavailable", "timeout".into());
        let alerts = scan(&state.render(&cfg()), &cfg());
        assert_eq!(
            alerts,
            vec![AlertEvent::SourceError {
                kind: "source_unavailable".into()
            }]
        );
    }

    #[test]
    fn empty_snapshot_never_divides_by_zero() {
        let state = SessionState::new();
        assert!(scan(&state.render(&cfg()), &cfg()).is_empty());
    }
}
