//! Filename classification: which configuration, test and concurrency
//! produced a raw log.
//!
//! Raw logs are named `{configuration}_{test}_c{concurrency}.dat`. Both
//! configuration and test ids may themselves contain `_`, so we match against
//! the known ids instead of splitting on the separator.

use crate::error::ClassificationError;

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileTag {
    pub configuration: String,
    pub test: String,
    pub concurrency: u32,
}

/// Compiled classifier over a fixed set of configuration and test ids.
#[derive(Debug, Clone)]
pub struct Classifier {
    configurations: Vec<String>,
    tests: Vec<String>,
    concurrency: Regex,
}

impl Classifier {
    /// `tests` is tried in the given order; the first prefix match wins.
    pub fn new<C, T>(configurations: C, tests: T) -> Result<Self, regex::Error>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Ok(Self {
            configurations: configurations.into_iter().map(Into::into).collect(),
            tests: tests.into_iter().map(Into::into).collect(),
            concurrency: Regex::new(r"c(\d+)")?,
        })
    }

    pub fn classify(&self, filename: &str) -> Result<FileTag, ClassificationError> {
        // 1) Configuration: among all matching prefixes, the lexicographically
        // greatest wins.
        let configuration = self
            .configurations
            .iter()
            .filter(|c| strip_token(filename, c).is_some())
            .max()
            .ok_or_else(|| ClassificationError::NoConfiguration(filename.to_string()))?;
        let rest = strip_token(filename, configuration).unwrap_or_default();

        // 2) Test: first match in catalog order.
        let (test, rest) = self
            .tests
            .iter()
            .find_map(|t| strip_token(rest, t).map(|r| (t, r)))
            .ok_or_else(|| ClassificationError::NoTest(filename.to_string()))?;

        // 3) Concurrency: first `c<digits>` run in what is left.
        let concurrency = self
            .concurrency
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| ClassificationError::NoConcurrency(filename.to_string()))?;

        Ok(FileTag {
            configuration: configuration.clone(),
            test: test.clone(),
            concurrency,
        })
    }
}

/// `Some(rest)` when `s` starts with `token` followed by the separator.
fn strip_token<'a>(s: &'a str, token: &str) -> Option<&'a str> {
    s.strip_prefix(token)?.strip_prefix(SEPARATOR)
}

/// Raw log filename for a tag: `{configuration}_{test}_c{concurrency}.dat`.
pub fn raw_filename(configuration: &str, test: &str, concurrency: u32) -> String {
    format!("{configuration}_{test}_c{concurrency}.dat")
}

#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    pub tag: FileTag,
    /// Set once the raw log has been cleaned.
    pub clean_file: Option<PathBuf>,
}

/// Raw filename -> tag, plus the cleaned artifact once it exists.
///
/// Built once per run; the only later mutation is `attach_clean_file`.
#[derive(Debug, Clone, Default)]
pub struct ClassifierTable {
    entries: BTreeMap<String, ClassifiedFile>,
}

impl ClassifierTable {
    pub fn insert(&mut self, filename: String, tag: FileTag) {
        self.entries.insert(
            filename,
            ClassifiedFile {
                tag,
                clean_file: None,
            },
        );
    }

    pub fn attach_clean_file(&mut self, filename: &str, clean_file: PathBuf) -> bool {
        match self.entries.get_mut(filename) {
            Some(entry) => {
                entry.clean_file = Some(clean_file);
                true
            }
            None => false,
        }
    }

    /// Cleaned artifact for a raw filename, if it was classified and cleaned.
    pub fn clean_file(&self, filename: &str) -> Option<&Path> {
        self.entries.get(filename)?.clean_file.as_deref()
    }

    /// Entries in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassifiedFile)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
