//! Comparison orchestrator: classify raw logs, clean them, then build and
//! render one chart per (comparison group, test, concurrency step).

use crate::classify::{self, Classifier, ClassifierTable};
use crate::config::{ChartKind, ComparisonConfig, ComparisonGroup, TestSpec};
use crate::error::MissingArtifactError;
use crate::filter;
use crate::percentiles;
use crate::process::{Invocation, ProcessPort};
use crate::render::{self, LineSeries};

use anyhow::Context;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const RAW_EXTENSION: &str = "dat";

/// Where a run reads raw logs and writes its artifacts.
#[derive(Debug, Clone)]
pub struct Layout {
    pub data_dir: PathBuf,
    pub clean_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl Layout {
    /// `data_dir/clean` and `data_dir/images`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            clean_dir: data_dir.join("clean"),
            images_dir: data_dir.join("images"),
            data_dir,
        }
    }

    fn create_dirs(&self) -> anyhow::Result<()> {
        for dir in [&self.clean_dir, &self.images_dir] {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedComparison {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub classified: usize,
    pub skipped: Vec<String>,
    pub cleaned: usize,
    pub clean_failures: Vec<String>,
    pub charts: Vec<PathBuf>,
    pub failures: Vec<FailedComparison>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Report<'a> {
    config: &'a ComparisonConfig,
    layout: Layout,
    renderer: OsString,
    port: &'a mut dyn ProcessPort,
}

impl<'a> Report<'a> {
    pub fn new(
        config: &'a ComparisonConfig,
        layout: Layout,
        renderer: impl Into<OsString>,
        port: &'a mut dyn ProcessPort,
    ) -> Self {
        Self {
            config,
            layout,
            renderer: renderer.into(),
            port,
        }
    }

    /// Full run. Only setup failures (directories, listing the data
    /// directory) are returned as errors; per-file and per-comparison
    /// failures are logged and recorded in the summary.
    pub fn run(&mut self) -> anyhow::Result<RunSummary> {
        self.layout.create_dirs()?;

        let mut summary = RunSummary::default();
        let mut table = self.classify_files(&mut summary)?;
        if table.is_empty() {
            warn!(
                "no raw logs matched the configured names in {}",
                self.layout.data_dir.display()
            );
        }
        self.clean_files(&mut table, &mut summary);

        let config = self.config;
        for group in &config.groups {
            for test in &config.tests {
                for &concurrency in &config.steps {
                    let name = artifact_stem(&group.name, &test.id, concurrency);
                    match self.compare(&table, group, test, concurrency) {
                        Ok(image) => {
                            info!("created {}", image.display());
                            summary.charts.push(image);
                        }
                        Err(err) => {
                            error!("comparison {} failed: {:#}", name, err);
                            summary.failures.push(FailedComparison {
                                name,
                                error: format!("{:#}", err),
                            });
                        }
                    }
                }
            }
        }

        info!(
            "{} charts rendered, {} comparisons failed",
            summary.charts.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    fn classify_files(&self, summary: &mut RunSummary) -> anyhow::Result<ClassifierTable> {
        let classifier = Classifier::new(self.config.configuration_ids(), self.config.test_ids())?;

        let data_dir = &self.layout.data_dir;
        let mut names = Vec::new();
        for entry in
            fs::read_dir(data_dir).with_context(|| format!("list {}", data_dir.display()))?
        {
            let path = entry
                .with_context(|| format!("list {}", data_dir.display()))?
                .path();
            if !path.is_file() || path.extension().is_none_or(|e| e != RAW_EXTENSION) {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => names.push(name.to_string()),
                None => warn!("skipping non UTF-8 file name {}", path.display()),
            }
        }
        names.sort();

        let mut table = ClassifierTable::default();
        for name in names {
            match classifier.classify(&name) {
                Ok(tag) => table.insert(name, tag),
                Err(err) => {
                    warn!("skipping file: {}", err);
                    summary.skipped.push(name);
                }
            }
        }
        summary.classified = table.len();
        Ok(table)
    }

    fn clean_files(&self, table: &mut ClassifierTable, summary: &mut RunSummary) {
        let mut cleaned = Vec::new();
        for (name, entry) in table.iter() {
            debug!(
                "{}: configuration={} test={} c={}",
                name, entry.tag.configuration, entry.tag.test, entry.tag.concurrency
            );
            match filter::clean_file(&self.layout.data_dir.join(name), &self.layout.clean_dir) {
                Ok(path) => cleaned.push((name.to_string(), path)),
                Err(err) => {
                    error!("cannot clean {}: {:#}", name, err);
                    summary.clean_failures.push(name.to_string());
                }
            }
        }

        summary.cleaned = cleaned.len();
        for (name, path) in cleaned {
            table.attach_clean_file(&name, path);
        }
    }

    /// Build, describe and render one chart. Returns the image path.
    fn compare(
        &mut self,
        table: &ClassifierTable,
        group: &ComparisonGroup,
        test: &TestSpec,
        concurrency: u32,
    ) -> anyhow::Result<PathBuf> {
        let files = resolve(table, group, &test.id, concurrency)?;

        let stem = artifact_stem(&group.name, &test.id, concurrency);
        let image = self.layout.images_dir.join(format!("{stem}.png"));
        let script_path = self.layout.clean_dir.join(format!("{stem}.gpl"));

        let script = match group.chart {
            ChartKind::Percentiles => {
                let labels = group
                    .configurations
                    .iter()
                    .map(|c| self.config.label(c).to_string())
                    .collect();
                let percentile_table =
                    percentiles::extract(&files, labels, &self.config.percentiles)?;

                let table_path = self.layout.clean_dir.join(format!("{stem}.percentiles"));
                info!("saving percentiles to {}", table_path.display());
                percentile_table.write(&table_path)?;

                render::bar_chart_script(
                    test.title(),
                    concurrency,
                    &image,
                    &table_path,
                    group.configurations.len(),
                )
            }
            ChartKind::Lines => {
                let series: Vec<LineSeries<'_>> = files
                    .iter()
                    .zip(&group.configurations)
                    .map(|(data, c)| LineSeries {
                        data: data.as_path(),
                        label: self.config.label(c),
                    })
                    .collect();
                render::line_chart_script(test.title(), concurrency, &image, &series)
            }
        };

        fs::write(&script_path, script)
            .with_context(|| format!("write plot script {}", script_path.display()))?;

        let invocation = Invocation::new(self.renderer.clone(), &image).arg(&script_path);
        let image = self.port.run(&invocation)?;
        Ok(image)
    }
}

/// Cleaned artifact of every configuration in the group, in group order.
fn resolve(
    table: &ClassifierTable,
    group: &ComparisonGroup,
    test: &str,
    concurrency: u32,
) -> Result<Vec<PathBuf>, MissingArtifactError> {
    group
        .configurations
        .iter()
        .map(|c| {
            let filename = classify::raw_filename(c, test, concurrency);
            table
                .clean_file(&filename)
                .map(Path::to_path_buf)
                .ok_or(MissingArtifactError { filename })
        })
        .collect()
}

/// `{group}_{test}_c{concurrency}`, shared by every derived artifact.
pub fn artifact_stem(group: &str, test: &str, concurrency: u32) -> String {
    format!("{group}_{test}_c{concurrency}")
}
