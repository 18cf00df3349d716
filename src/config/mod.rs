//! Config layer: the comparison document + validated in-memory structures.
//!
//! This module owns:
//! - the test catalog (which URLs are benchmarked, in which order)
//! - concurrency steps
//! - comparison groups and configuration labels

pub mod catalog;
pub mod comparison;

pub use catalog::{TestSpec, default_steps, default_tests};
pub use comparison::{ChartKind, ComparisonConfig, ComparisonGroup, ComparisonSpec};

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Load and validate a comparison document. JSON when the file ends in
/// `.json`, YAML otherwise.
pub fn load(path: &Path) -> anyhow::Result<ComparisonConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read configuration {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let spec: ComparisonSpec = if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("parse JSON configuration {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("parse YAML configuration {}", path.display()))?
    };

    let config = spec
        .validate_and_build()
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    Ok(config)
}
