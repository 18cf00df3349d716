//! Comparison document: which configurations exist, which percentiles to
//! report and which configurations are charted together.
//!
//! YAML shape:
//!
//! ```yaml
//! configurations:            # id -> label rendered in charts
//!   php72: "PHP 7.2"
//!   php74: "PHP 7.4"
//! percentiles: [0.5, 0.9, 0.99]
//! comparisons:
//!   percentiles: [php72, php74]                      # bare list
//!   php: { chart: lines, configurations: [php72] }   # explicit chart kind
//! steps: [10, 20]            # optional
//! tests: [...]               # optional, see catalog.rs
//! ```
//!
//! We validate that groups only reference declared configurations and that
//! percentiles are fractions, then flatten everything into `ComparisonConfig`.

use crate::config::catalog::{self, TestSpec};
use crate::error::ConfigError;

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonSpec {
    pub configurations: BTreeMap<String, String>,

    #[serde(default)]
    pub percentiles: Vec<f64>,

    /// Groups in document order; charts are produced in this order.
    #[serde(default)]
    pub comparisons: IndexMap<String, GroupSpec>,

    #[serde(default = "catalog::default_steps")]
    pub steps: Vec<u32>,

    #[serde(default = "catalog::default_tests")]
    pub tests: Vec<TestSpec>,
}

/// Group entries in the comparison document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GroupSpec {
    // Legacy shape: name: [a, b]
    List(Vec<String>),
    // name: { chart: lines, configurations: [a, b] }
    Explicit {
        chart: ChartKind,
        configurations: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Clustered bar chart of the requested percentiles.
    Percentiles,
    /// One smoothed latency line per configuration.
    Lines,
}

/// A named set of configurations charted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonGroup {
    pub name: String,
    pub chart: ChartKind,
    pub configurations: Vec<String>,
}

/// Validated comparison configuration. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    pub labels: BTreeMap<String, String>,
    pub percentiles: Vec<f64>,
    pub groups: Vec<ComparisonGroup>,
    pub tests: Vec<TestSpec>,
    pub steps: Vec<u32>,
}

impl ComparisonConfig {
    /// Known configuration ids.
    pub fn configuration_ids(&self) -> Vec<&str> {
        self.labels.keys().map(String::as_str).collect()
    }

    /// Test ids in catalog order.
    pub fn test_ids(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.id.as_str()).collect()
    }

    /// Human-readable label; the id itself when the document has none.
    pub fn label<'a>(&'a self, configuration: &'a str) -> &'a str {
        self.labels
            .get(configuration)
            .map(String::as_str)
            .unwrap_or(configuration)
    }
}

impl ComparisonSpec {
    pub fn validate_and_build(self) -> Result<ComparisonConfig, ConfigError> {
        if self.configurations.is_empty() {
            return Err(ConfigError::NoConfigurations);
        }

        for &p in &self.percentiles {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::PercentileOutOfRange(p));
            }
        }

        let mut groups = Vec::with_capacity(self.comparisons.len());
        for (name, raw) in self.comparisons {
            let (chart, configurations) = match raw {
                GroupSpec::List(configurations) => (kind_from_name(&name), configurations),
                GroupSpec::Explicit {
                    chart,
                    configurations,
                } => (chart, configurations),
            };

            if configurations.is_empty() {
                return Err(ConfigError::EmptyComparison(name));
            }
            if let Some(unknown) = configurations
                .iter()
                .find(|c| !self.configurations.contains_key(*c))
            {
                return Err(ConfigError::UnknownConfiguration {
                    group: name,
                    configuration: unknown.clone(),
                });
            }

            groups.push(ComparisonGroup {
                name,
                chart,
                configurations,
            });
        }

        if self.tests.is_empty() {
            return Err(ConfigError::NoTests);
        }
        let mut seen = BTreeSet::new();
        for t in &self.tests {
            if !seen.insert(t.id.as_str()) {
                return Err(ConfigError::DuplicateTest(t.id.clone()));
            }
        }

        if self.steps.is_empty() {
            return Err(ConfigError::NoSteps);
        }
        if let Some(&bad) = self.steps.iter().find(|&&s| s == 0) {
            return Err(ConfigError::BadStep(bad));
        }

        Ok(ComparisonConfig {
            labels: self.configurations,
            percentiles: self.percentiles,
            groups,
            tests: self.tests,
            steps: self.steps,
        })
    }
}

/// A bare-list group named `percentiles` is a bar chart, anything else a line chart.
fn kind_from_name(name: &str) -> ChartKind {
    if name == "percentiles" {
        ChartKind::Percentiles
    } else {
        ChartKind::Lines
    }
}
