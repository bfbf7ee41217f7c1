use chrono::{DateTime, Datelike, Utc};

use crate::store::PickRecord;

/// Leaderboards are cut off after this many entries.
pub const TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatStats {
    /// Unique names picked since UTC midnight, alphabetically sorted.
    pub today: Vec<String>,
    pub month_top: Vec<(String, u32)>,
    pub all_time_top: Vec<(String, u32)>,
}

pub fn epoch(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

/// UTC midnight of the current day, as epoch seconds.
pub fn today_start(now: DateTime<Utc>) -> f64 {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    midnight.and_utc().timestamp() as f64
}

/// First of the current UTC month, 00:00:00, as epoch seconds.
pub fn month_start(now: DateTime<Utc>) -> f64 {
    let first = now
        .date_naive()
        .with_day(1)
        .expect("every month has a first day")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    first.and_utc().timestamp() as f64
}

/// Derives all three views over a chat's history. Pure; calling it twice
/// without an intervening pick yields identical output.
pub fn compute(history: &[PickRecord], now: DateTime<Utc>) -> ChatStats {
    let today = today_start(now);
    let month = month_start(now);

    let mut today_names: Vec<&str> = history
        .iter()
        .filter(|record| record.timestamp >= today)
        .flat_map(|record| [record.first.as_str(), record.second.as_str()])
        .collect();
    today_names.sort_unstable();
    today_names.dedup();

    ChatStats {
        today: today_names.into_iter().map(str::to_owned).collect(),
        month_top: count_names(history.iter().filter(|record| record.timestamp >= month)),
        all_time_top: count_names(history.iter()),
    }
}

/// Counts picks per name, sorted by count descending. Equal counts keep the
/// order in which a name first appeared in the history, so the output is
/// deterministic. The linear scan is fine at per-chat history sizes.
fn count_names<'a>(records: impl Iterator<Item = &'a PickRecord>) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();

    for record in records {
        for name in [&record.first, &record.second] {
            match counts.iter_mut().find(|(n, _)| n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name.clone(), 1)),
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_LIMIT);
    counts
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(first: &str, second: &str, timestamp: f64) -> PickRecord {
        PickRecord {
            first: first.to_string(),
            second: second.to_string(),
            timestamp,
        }
    }

    fn top(entries: &[(&str, u32)]) -> Vec<(String, u32)> {
        entries.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn single_pick_today() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        // today's midnight + 1h
        let history = [record("alice", "bob", today_start(now) + 3600.0)];

        let stats = compute(&history, now);
        assert_eq!(stats.today, vec!["alice", "bob"]);
        assert_eq!(stats.month_top, top(&[("alice", 1), ("bob", 1)]));
        assert_eq!(stats.all_time_top, stats.month_top);
    }

    #[test]
    fn computation_is_idempotent() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let history = [
            record("alice", "bob", today_start(now) - 86400.0),
            record("alice", "carol", today_start(now) + 3600.0),
        ];

        assert_eq!(compute(&history, now), compute(&history, now));
    }

    #[test]
    fn windows_are_applied() {
        // mid-May; April picks count all-time only, May 1st counts for the month
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let history = [
            record("alice", "bob", month_start(now) - 3600.0),
            record("alice", "carol", month_start(now)),
            record("dave", "erin", today_start(now) + 60.0),
        ];

        let stats = compute(&history, now);
        assert_eq!(stats.today, vec!["dave", "erin"]);
        assert_eq!(
            stats.month_top,
            top(&[("alice", 1), ("carol", 1), ("dave", 1), ("erin", 1)])
        );
        assert_eq!(
            stats.all_time_top,
            top(&[("alice", 2), ("bob", 1), ("carol", 1), ("dave", 1), ("erin", 1)])
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let t = today_start(now) - 7200.0;
        let history = [record("zoe", "bob", t), record("zoe", "ann", t + 60.0)];

        let stats = compute(&history, now);
        assert_eq!(stats.all_time_top, top(&[("zoe", 2), ("bob", 1), ("ann", 1)]));
    }

    #[test]
    fn leaderboards_are_truncated() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let t = today_start(now) - 7200.0;
        let history: Vec<_> = (0..6)
            .map(|i| record(&format!("a{i}"), &format!("b{i}"), t + i as f64))
            .collect();

        let stats = compute(&history, now);
        assert_eq!(stats.all_time_top.len(), TOP_LIMIT);
        // first-seen order survives the cut
        assert_eq!(stats.all_time_top[0].0, "a0");
        assert_eq!(stats.all_time_top[9].0, "b4");
    }

    #[test]
    fn empty_history_is_empty_stats() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let stats = compute(&[], now);
        assert!(stats.today.is_empty());
        assert!(stats.month_top.is_empty());
        assert!(stats.all_time_top.is_empty());
    }
}
