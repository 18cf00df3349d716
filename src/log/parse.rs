use crate::error::{ArtifactError, ParseError};
use crate::log::row::{CleanedRecord, RawRecord};

use anyhow::Context;
use regex::Regex;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

const TIMESTAMP_FIELD: usize = 1;
const DURATION_FIELD: usize = 4;

/// Parse a raw load-generator log (`ab -g` output).
///
/// Expected columns (separated by one or more tabs):
/// starttime  seconds  ctime  dtime  ttime  wait
///
/// Example:
/// Tue Jun 01 10:00:00 2021	1622541600	1	5	6	5
///
/// The first line is a header and always skipped. Lines that do not yield a
/// timestamp and a duration are dropped with a warning.
pub fn parse_raw_log(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read raw log {}", path.display()))?;

    let (records, errors) = parse_raw_str(path, &text)?;
    for err in &errors {
        warn!("dropping malformed line {}", err);
    }

    Ok(records)
}

/// Parse raw log text, returning the good records and one error per dropped line.
pub fn parse_raw_str(
    path: &Path,
    text: &str,
) -> anyhow::Result<(Vec<RawRecord>, Vec<ParseError>)> {
    let sep = Regex::new(r"\t+")?;

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (lineno, line) in text.lines().enumerate().skip(1) {
        let lno = lineno + 1;

        if line.trim().is_empty() {
            continue;
        }

        match parse_raw_line(&sep, line) {
            Ok(record) => records.push(record),
            Err(reason) => errors.push(ParseError {
                path: path.to_path_buf(),
                line: lno,
                reason,
            }),
        }
    }

    Ok((records, errors))
}

fn parse_raw_line(sep: &Regex, line: &str) -> Result<RawRecord, String> {
    let fields: Vec<&str> = sep.split(line).collect();
    if fields.len() <= DURATION_FIELD {
        return Err(format!(
            "expected at least {} fields, found {}",
            DURATION_FIELD + 1,
            fields.len()
        ));
    }

    let ts = fields[TIMESTAMP_FIELD].trim();
    let timestamp: i64 = ts
        .parse()
        .map_err(|_| format!("bad timestamp {:?}", ts))?;

    let d = fields[DURATION_FIELD].trim();
    let duration: f64 = d.parse().map_err(|_| format!("bad duration {:?}", d))?;
    if !duration.is_finite() {
        return Err(format!("bad duration {:?}", d));
    }

    Ok(RawRecord {
        timestamp,
        duration,
    })
}

/// Write a cleaned artifact: `duration<TAB>timestamp` per line, no header.
pub fn write_cleaned(path: &Path, records: &[CleanedRecord]) -> anyhow::Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("create cleaned file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for r in records {
        writeln!(out, "{}\t{}", r.duration, r.timestamp)
            .with_context(|| format!("write cleaned file {}", path.display()))?;
    }
    out.flush()
        .with_context(|| format!("flush cleaned file {}", path.display()))?;
    Ok(())
}

/// Read a cleaned artifact back into records, in file order.
pub fn read_cleaned(path: &Path) -> Result<Vec<CleanedRecord>, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let malformed = |line: usize, reason: String| ArtifactError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let mut fields = line.split('\t');

        let (Some(d), Some(ts), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed(lno, format!("expected 2 fields in {:?}", line)));
        };
        let duration: f64 = d
            .parse()
            .map_err(|_| malformed(lno, format!("bad duration {:?}", d)))?;
        let timestamp: i64 = ts
            .parse()
            .map_err(|_| malformed(lno, format!("bad timestamp {:?}", ts)))?;

        out.push(CleanedRecord {
            duration,
            timestamp,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const HEADER: &str = "starttime\tseconds\tctime\tdtime\tttime\twait\n";

    #[test]
    fn skips_header_and_reads_fields_one_and_four() {
        let text = format!(
            "{HEADER}Tue Jun 01 10:00:00 2021\t1622541600\t1\t5\t6\t5\n\
             Tue Jun 01 10:00:01 2021\t\t1622541601\t\t2\t4\t17.5\t4\n"
        );
        let (records, errors) = parse_raw_str(Path::new("x.dat"), &text).unwrap();

        assert!(errors.is_empty());
        assert_eq!(
            records,
            vec![
                RawRecord {
                    timestamp: 1622541600,
                    duration: 6.0
                },
                RawRecord {
                    timestamp: 1622541601,
                    duration: 17.5
                },
            ]
        );
    }

    #[test]
    fn malformed_lines_are_reported_not_fatal() {
        let text = format!(
            "{HEADER}short\t1\t2\n\
             date\tnot-a-number\t1\t2\t3\t4\n\
             date\t100\t1\t2\tNaN\t4\n\
             \n\
             date\t101\t1\t2\t9\t4\n"
        );
        let (records, errors) = parse_raw_str(Path::new("x.dat"), &text).unwrap();

        assert_eq!(
            records,
            vec![RawRecord {
                timestamp: 101,
                duration: 9.0
            }]
        );
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(errors[0].path, PathBuf::from("x.dat"));
        assert!(errors[0].reason.contains("at least 5 fields"));
    }

    #[test]
    fn header_only_file_has_no_records() {
        let (records, errors) = parse_raw_str(Path::new("x.dat"), HEADER).unwrap();
        assert!(records.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn cleaned_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a_view_c10.dat");
        let records = vec![
            CleanedRecord {
                duration: 3.0,
                timestamp: 1000,
            },
            CleanedRecord {
                duration: 12.25,
                timestamp: 998,
            },
            CleanedRecord {
                duration: 140.0,
                timestamp: 1003,
            },
        ];

        write_cleaned(&path, &records).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "3\t1000\n12.25\t998\n140\t1003\n"
        );
        assert_eq!(read_cleaned(&path).unwrap(), records);
    }

    #[test]
    fn read_cleaned_rejects_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.dat");
        fs::write(&path, "1\t2\n1\t2\t3\n").unwrap();

        match read_cleaned(&path) {
            Err(ArtifactError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
