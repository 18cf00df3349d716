//! Outlier filtering: drop connection warm-up samples, then the slowest tail.

use crate::log::{self, CleanedRecord, RawRecord};

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fraction of samples eligible for warm-up dropping.
const WARMUP_FRACTION: f64 = 0.05;
/// Warm-up dropping stops once this many seconds have elapsed since the first sample.
const WARMUP_WINDOW_SECS: u64 = 10;
/// Fraction of the slowest samples removed after warm-up dropping.
const TAIL_FRACTION: f64 = 0.01;

/// Filter one log's records.
///
/// 1) Sort by timestamp.
/// 2) Drop up to floor(5%) of the earliest samples, stopping for good at the
///    first sample at least 10 seconds after the start.
/// 3) Sort survivors by duration and drop the slowest ceil(1%).
///
/// The result is duration-ascending.
pub fn clean(mut records: Vec<RawRecord>) -> Vec<CleanedRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    records.sort_by_key(|r| r.timestamp);

    let mut to_remove = (records.len() as f64 * WARMUP_FRACTION).floor() as usize;
    let start = records[0].timestamp;

    let mut kept: Vec<CleanedRecord> = Vec::with_capacity(records.len());
    for r in records {
        if to_remove > 0 {
            if r.timestamp.abs_diff(start) >= WARMUP_WINDOW_SECS {
                to_remove = 0;
            } else {
                to_remove -= 1;
                continue;
            }
        }
        kept.push(r.into());
    }

    kept.sort_by(|a, b| a.duration.total_cmp(&b.duration));

    let trim = (kept.len() as f64 * TAIL_FRACTION).ceil() as usize;
    kept.truncate(kept.len().saturating_sub(trim));
    kept
}

/// Clean a raw log and write the result to `clean_dir/<same file name>`.
pub fn clean_file(raw: &Path, clean_dir: &Path) -> anyhow::Result<PathBuf> {
    info!("cleaning file {}", raw.display());

    let name = raw
        .file_name()
        .with_context(|| format!("{} has no file name", raw.display()))?;
    let out = clean_dir.join(name);

    let records = log::parse_raw_log(raw)?;
    let total = records.len();
    if total == 0 {
        warn!("{} contains no usable records", raw.display());
    }

    let cleaned = clean(records);
    debug!(
        "{}: kept {} of {} records",
        raw.display(),
        cleaned.len(),
        total
    );

    log::write_cleaned(&out, &cleaned)?;
    info!("saved cleaned file to {}", out.display());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::fs;

    fn raw(timestamp: i64, duration: f64) -> RawRecord {
        RawRecord {
            timestamp,
            duration,
        }
    }

    fn expected_len(n: usize, warmup_drops: usize) -> usize {
        let m = n - warmup_drops;
        m - (m as f64 * 0.01).ceil() as usize
    }

    #[test]
    fn one_sample_per_second_drops_five_then_trims_one() {
        // 100 records, one per second: all five warm-up candidates fall
        // inside the 10 second window.
        let records: Vec<RawRecord> = (0..100).map(|i| raw(1000 + i, 100.0 + i as f64)).collect();
        let cleaned = clean(records);

        assert_eq!(cleaned.len(), expected_len(100, 5));
        assert_eq!(cleaned.len(), 94);
        // The five fastest (earliest) were warm-up, the slowest was trimmed.
        assert_eq!(cleaned.first().map(|r| r.duration), Some(105.0));
        assert_eq!(cleaned.last().map(|r| r.duration), Some(198.0));
        assert_eq!(cleaned[0].timestamp, 1005);
    }

    #[test]
    fn ten_second_gate_stops_warmup_early() {
        // 100 records, three seconds apart: records at t+0, t+3, t+6, t+9
        // are dropped, t+12 ends warm-up with one drop left in the budget.
        let records: Vec<RawRecord> = (0..100).map(|i| raw(1000 + 3 * i, i as f64)).collect();
        let cleaned = clean(records);

        assert_eq!(cleaned.len(), expected_len(100, 4));
        assert_eq!(cleaned[0].duration, 4.0);
        assert_eq!(cleaned[0].timestamp, 1012);
    }

    #[test]
    fn gate_applies_to_sorted_order_not_input_order() {
        // Out-of-order input; the slow sample at the first timestamp is warm-up.
        let mut records: Vec<RawRecord> = (1..40).map(|i| raw(100 + i, 10.0)).collect();
        records.push(raw(100, 9999.0));
        records.reverse();
        let cleaned = clean(records);

        // floor(40 * 0.05) = 2 warm-up drops, then ceil(38 * 0.01) = 1 trimmed.
        assert_eq!(cleaned.len(), 37);
        assert!(cleaned.iter().all(|r| r.duration == 10.0));
        assert!(cleaned.iter().all(|r| r.timestamp >= 102));
    }

    #[test]
    fn small_inputs_do_not_underflow() {
        assert!(clean(vec![]).is_empty());
        // One record: no warm-up, ceil(0.01) = 1 trims it.
        assert!(clean(vec![raw(1, 1.0)]).is_empty());
        // Fewer than 20 records: warm-up budget is zero, one record trimmed.
        let records: Vec<RawRecord> = (0..19).map(|i| raw(i, (19 - i) as f64)).collect();
        let cleaned = clean(records);
        assert_eq!(cleaned.len(), 18);
        assert_eq!(cleaned.last().map(|r| r.duration), Some(18.0));
        // Exactly 20: one warm-up drop, then one trimmed.
        let records: Vec<RawRecord> = (0..20).map(|i| raw(i, i as f64)).collect();
        assert_eq!(clean(records).len(), 18);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        // floor(40 * 0.05) = 2: i64::MIN is warm-up, the next sample is
        // far past the window and ends it.
        let mut records: Vec<RawRecord> = (0..39).map(|i| raw(i64::MAX - i, 5.0)).collect();
        records.push(raw(i64::MIN, 1.0));
        let cleaned = clean(records);

        assert_eq!(cleaned.len(), expected_len(40, 1));
        assert!(cleaned.iter().all(|r| r.timestamp > 0));
    }

    #[test]
    fn recleaning_output_does_not_panic() {
        let records: Vec<RawRecord> = (0..200).map(|i| raw(i % 17, (i * 7 % 13) as f64)).collect();
        let once = clean(records);
        let again = clean(once.iter().copied().map(RawRecord::from).collect());
        assert!(again.len() <= once.len());
    }

    #[test]
    fn clean_file_writes_artifact_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let clean_dir = dir.path().join("clean");
        fs::create_dir(&clean_dir).unwrap();

        let raw_path = dir.path().join("php72_view_long_c10.dat");
        let mut text = String::from("starttime\tseconds\tctime\tdtime\tttime\twait\n");
        for i in 0..100 {
            text.push_str(&format!("date\t{}\t0\t0\t{}\t0\n", 1000 + i, 100 + i));
        }
        text.push_str("garbage line\n");
        fs::write(&raw_path, text).unwrap();

        let out = clean_file(&raw_path, &clean_dir).unwrap();
        assert_eq!(out, clean_dir.join("php72_view_long_c10.dat"));

        let back = log::read_cleaned(&out).unwrap();
        assert_eq!(back.len(), 94);
        assert_eq!(back[0], CleanedRecord { duration: 105.0, timestamp: 1005 });
    }

    proptest! {
        #[test]
        fn output_is_sorted_and_sized(
            samples in prop::collection::vec((0i64..120, 0u32..10_000), 0..400)
        ) {
            let records: Vec<RawRecord> = samples
                .iter()
                .map(|&(ts, d)| raw(ts, f64::from(d)))
                .collect();
            let n = records.len();

            // Replay the warm-up rule to count drops.
            let mut sorted: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
            sorted.sort();
            let mut budget = n / 20;
            let mut drops = 0;
            for ts in &sorted {
                if budget == 0 || ts - sorted[0] >= 10 {
                    break;
                }
                budget -= 1;
                drops += 1;
            }

            let cleaned = clean(records);
            prop_assert!(cleaned.windows(2).all(|w| w[0].duration <= w[1].duration));
            if n > 0 {
                prop_assert_eq!(cleaned.len(), expected_len(n, drops));
            } else {
                prop_assert!(cleaned.is_empty());
            }
        }
    }
}
