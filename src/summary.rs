//! Summary statistics over a record set, the numbers behind the KPI row.

use serde::Serialize;

use crate::source::Record;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub fraud_count: usize,
    pub avg_score: f64,
}

/// Count, fraud count, and mean fraud score rounded to 3 decimals.
///
/// For empty input `avg_score` is defined as 0.0: the dashboard renders
/// before any data has loaded, and NaN would poison chart axes downstream.
/// Order of the input does not affect the result.
pub fn summarize(records: &[Record]) -> Summary {
    let count = records.len();
    let fraud_count = records.iter().filter(|r| r.status.is_fraud()).count();
    let avg_score = if count == 0 {
        0.0
    } else {
        let sum: f64 = records.iter().map(|r| r.fraud_score).sum();
        round3(sum / count as f64)
    };
    Summary {
        count,
        fraud_count,
        avg_score,
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Status;
    use chrono::{TimeZone, Utc};

    fn rec(status: Status, score: f64) -> Record {
        Record {
            event_time: Utc.timestamp_opt(1_750_000_000, 0).unwrap(),
            status,
            fraud_score: score,
            extra: Default::default(),
        }
    }

    #[test]
    fn empty_input_is_defined() {
        let s = summarize(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.fraud_count, 0);
        assert_eq!(s.avg_score, 0.0);
    }

    #[test]
    fn three_record_scenario() {
        let records = vec![
            rec(Status::Normal, 0.1),
            rec(Status::Fraud, 0.9),
            rec(Status::Fraud, 0.8),
        ];
        let s = summarize(&records);
        assert_eq!(s.count, 3);
        assert_eq!(s.fraud_count, 2);
        assert_eq!(s.avg_score, 0.600);
    }

    #[test]
    fn order_invariant() {
        let a = vec![
            rec(Status::Normal, 0.13),
            rec(Status::Fraud, 0.97),
            rec(Status::Unknown, 0.42),
            rec(Status::Fraud, 0.61),
        ];
        let mut b = a.clone();
        b.reverse();
        b.swap(0, 2);
        assert_eq!(summarize(&a), summarize(&b));
    }

    #[test]
    fn rounds_to_three_decimals() {
        let records = vec![rec(Status::Normal, 0.1), rec(Status::Normal, 0.2), rec(Status::Normal, 0.2)];
        // 0.5 / 3 = 0.16666...
        assert_eq!(summarize(&records).avg_score, 0.167);
    }

    #[test]
    fn unknown_status_counts_toward_mean_not_fraud() {
        let records = vec![rec(Status::Unknown, 1.0), rec(Status::Fraud, 0.0)];
        let s = summarize(&records);
        assert_eq!(s.fraud_count, 1);
        assert_eq!(s.avg_score, 0.5);
    }
}
