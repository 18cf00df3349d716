//! Percentile comparison tables built from cleaned artifacts.

use crate::error::PercentileError;
use crate::log;

use anyhow::Context;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRow {
    pub percentile: f64,
    /// One duration per input file, in input order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileTable {
    pub labels: Vec<String>,
    pub rows: Vec<PercentileRow>,
}

/// Line index holding percentile `p` in a file of `line_count` sorted lines.
///
/// Nearest rank, rounding halves to even. Not clamped: `p` close to 1.0 can
/// yield `line_count` itself.
pub fn rank_index(p: f64, line_count: usize) -> usize {
    (p * line_count as f64).round_ties_even() as usize
}

/// Read each cleaned file (already duration-ascending) and pick the duration
/// at `rank_index(p, lines)` for every requested percentile.
pub fn extract(
    files: &[PathBuf],
    labels: Vec<String>,
    percentiles: &[f64],
) -> Result<PercentileTable, PercentileError> {
    let mut columns = Vec::with_capacity(files.len());
    for path in files {
        let durations: Vec<f64> = log::read_cleaned(path)?
            .into_iter()
            .map(|r| r.duration)
            .collect();
        columns.push((path, durations));
    }

    let mut rows = Vec::with_capacity(percentiles.len());
    for &percentile in percentiles {
        let mut values = Vec::with_capacity(columns.len());
        for (path, durations) in &columns {
            let index = rank_index(percentile, durations.len());
            let value = durations
                .get(index)
                .copied()
                .ok_or_else(|| PercentileError::OutOfRange {
                    path: path.to_path_buf(),
                    percentile,
                    index,
                    line_count: durations.len(),
                })?;
            values.push(value);
        }
        rows.push(PercentileRow { percentile, values });
    }

    Ok(PercentileTable { labels, rows })
}

impl PercentileTable {
    /// Tab-separated: `Percentile<TAB>label...` then one row per percentile.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("Percentile");
        for label in &self.labels {
            out.push('\t');
            out.push_str(label);
        }
        out.push('\n');

        for row in &self.rows {
            let _ = write!(out, "{}", row.percentile);
            for v in &row.values {
                let _ = write!(out, "\t{}", v);
            }
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.to_tsv())
            .with_context(|| format!("write percentile table {}", path.display()))
    }
}
