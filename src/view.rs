//! Chart and table inputs derived from a record set. Pure derivations the
//! presentation layer plots as-is: a status bar chart, a score-over-time
//! line, a latest-transactions table, and a highlight mask for flagged rows.

use chrono::{DateTime, Utc};

use crate::source::Record;
use crate::window::sort_by_event_time;

/// Value counts by status, descending, ties broken by name for stability.
pub fn status_counts(records: &[Record]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for r in records {
        let key = r.status.as_str();
        match counts.iter_mut().find(|(k, _)| k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// `(event_time, fraud_score)` pairs in time order, for the line chart.
pub fn score_series(records: &[Record]) -> Vec<(DateTime<Utc>, f64)> {
    sort_by_event_time(records)
        .into_iter()
        .map(|r| (r.event_time, r.fraud_score))
        .collect()
}

/// The `n` most recent records by event time, newest first.
pub fn latest(records: &[Record], n: usize) -> Vec<Record> {
    let mut sorted = sort_by_event_time(records);
    sorted.reverse();
    sorted.truncate(n);
    sorted
}

/// Per-row fraud flag, aligned with the input order, for table highlighting.
pub fn fraud_row_mask(records: &[Record]) -> Vec<bool> {
    records.iter().map(|r| r.status.is_fraud()).collect()
}
