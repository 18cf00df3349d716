//! Typed failures of the pipeline.
//!
//! Per-line and per-file errors are contained by their callers (logged and
//! skipped); per-comparison errors abort only the comparison that hit them.

use std::path::PathBuf;
use thiserror::Error;

/// One raw log line that could not be turned into a record.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{}:{line}: {reason}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub line: usize,
    pub reason: String,
}

/// A raw log filename that does not follow `{configuration}_{test}_c{n}.dat`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("no configuration found for filename {0}")]
    NoConfiguration(String),

    #[error("no test found for filename {0}")]
    NoTest(String),

    #[error("no concurrency value found in {0}")]
    NoConcurrency(String),
}

/// A cleaned artifact that could not be read back.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum PercentileError {
    #[error(
        "percentile {percentile} maps to line {index} of {}, which only has {line_count} lines",
        .path.display()
    )]
    OutOfRange {
        path: PathBuf,
        percentile: f64,
        index: usize,
        line_count: usize,
    },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// An external process (load generator or renderer) that did not do its job.
///
/// Every variant carries the exact command line so the run can be reproduced
/// by hand.
#[derive(Debug, Error)]
pub enum ExternalProcessError {
    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: String },

    #[error("`{command}` succeeded but did not produce {}", .artifact.display())]
    MissingArtifact { command: String, artifact: PathBuf },
}

/// A comparison needed a cleaned file that was never produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unable to find cleaned data for {filename}")]
pub struct MissingArtifactError {
    pub filename: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("configuration document declares no configurations")]
    NoConfigurations,

    #[error("percentile {0} is outside [0, 1]")]
    PercentileOutOfRange(f64),

    #[error("comparison '{0}' lists no configurations")]
    EmptyComparison(String),

    #[error("comparison '{group}' references unknown configuration '{configuration}'")]
    UnknownConfiguration { group: String, configuration: String },

    #[error("duplicate test id '{0}' in test catalog")]
    DuplicateTest(String),

    #[error("test catalog is empty")]
    NoTests,

    #[error("concurrency steps must be positive (found {0})")]
    BadStep(u32),

    #[error("no concurrency steps configured")]
    NoSteps,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_the_offending_file_or_command() {
        let err = ParseError {
            path: PathBuf::from("data/a_view_c10.dat"),
            line: 7,
            reason: "expected at least 5 fields, found 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "data/a_view_c10.dat:7: expected at least 5 fields, found 3"
        );

        let err = ExternalProcessError::Exit {
            command: "gnuplot clean/x.gpl".to_string(),
            status: "exit status: 1".to_string(),
        };
        assert_eq!(err.to_string(), "`gnuplot clean/x.gpl` exited with exit status: 1");

        let err = MissingArtifactError {
            filename: "php72_view_long_c10.dat".to_string(),
        };
        assert!(err.to_string().contains("php72_view_long_c10.dat"));
    }
}
