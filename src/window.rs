//! Display-window and fraud-subset selectors. Pure functions over the
//! accumulated records: safe to call on every render, never mutate or
//! re-sort the store (arrival order backs the fetch offset).

use crate::source::Record;

/// Trailing `size` records in arrival order, or all of them if fewer exist.
pub fn window(records: &[Record], size: usize) -> &[Record] {
    let start = records.len().saturating_sub(size);
    &records[start..]
}

/// Stable-order subsequence of records flagged as fraud.
pub fn fraud_subset(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| r.status.is_fraud())
        .cloned()
        .collect()
}

/// Time-ordered copy for charting. The input slice is left untouched.
pub fn sort_by_event_time(records: &[Record]) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.event_time);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Status;
    use chrono::{TimeZone, Utc};

    fn rec(secs: i64, status: Status) -> Record {
        Record {
            event_time: Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap(),
            status,
            fraud_score: 0.5,
            extra: Default::default(),
        }
    }

    #[test]
    fn window_returns_trailing_slice_in_arrival_order() {
        let records: Vec<Record> = (0..10).map(|i| rec(i, Status::Normal)).collect();
        let w = window(&records, 3);
        assert_eq!(w.len(), 3);
        assert_eq!(w[0], records[7]);
        assert_eq!(w[2], records[9]);
    }

    #[test]
    fn window_smaller_input_returns_everything() {
        let records: Vec<Record> = (0..4).map(|i| rec(i, Status::Normal)).collect();
        assert_eq!(window(&records, 100).len(), 4);
        assert_eq!(window(&[], 100).len(), 0);
    }

    #[test]
    fn window_size_zero_is_empty() {
        let records: Vec<Record> = (0..4).map(|i| rec(i, Status::Normal)).collect();
        assert!(window(&records, 0).is_empty());
    }

    #[test]
    fn fraud_subset_preserves_order() {
        let records = vec![
            rec(0, Status::Fraud),
            rec(1, Status::Normal),
            rec(2, Status::Fraud),
            rec(3, Status::Unknown),
        ];
        let subset = fraud_subset(&records);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset[0].event_time, records[0].event_time);
        assert_eq!(subset[1].event_time, records[2].event_time);
    }

    #[test]
    fn sort_copies_without_mutating_input() {
        // Arrival order deliberately out of time order.
        let records = vec![rec(5, Status::Normal), rec(1, Status::Normal), rec(3, Status::Normal)];
        let before = records.clone();
        let sorted = sort_by_event_time(&records);
        assert_eq!(records, before);
        assert!(sorted.windows(2).all(|p| p[0].event_time <= p[1].event_time));
    }
}
