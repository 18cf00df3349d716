use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

mod bench;
mod classify;
mod config;
mod diagnostics;
mod error;
mod filter;
mod log;
mod percentiles;
mod process;
mod render;
mod report;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "abplot")]
#[command(about = "Benchmark a web service with ab and chart latency comparisons", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter raw logs and render comparison charts.
    Report {
        /// Directory holding `{configuration}_{test}_c{n}.dat` raw logs.
        data_dir: PathBuf,

        /// Comparison document (YAML, or JSON with a .json extension).
        config: PathBuf,

        #[arg(long, default_value = "gnuplot")]
        gnuplot_bin: OsString,

        /// Write every artifact but do not invoke the renderer.
        #[arg(long)]
        dry_run: bool,

        /// Write the run summary as JSON to this path.
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Run ab against a host for every test and concurrency step.
    Bench {
        /// Hostname (optionally host:port) to benchmark.
        host: String,

        /// Label to save data with; becomes the configuration id.
        label: String,

        #[arg(long, value_enum, default_value = "http")]
        scheme: bench::Scheme,

        /// ab timeout (-s). ab's own default of 30 seconds is too short for heavy pages.
        #[arg(long, default_value_t = 120)]
        timeout: u64,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Comparison document providing the test catalog and steps.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "ab")]
        ab_bin: OsString,

        /// Print the ab commands without running them.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init(cli.verbose)?;

    match cli.cmd {
        Commands::Report {
            data_dir,
            config: config_path,
            gnuplot_bin,
            dry_run,
            summary,
        } => {
            if !data_dir.is_dir() {
                anyhow::bail!("{} is not a directory", data_dir.display());
            }

            // 1) Load + validate the comparison document.
            let comparison = config::load(&config_path)?;
            tracing::debug!("loaded configuration: {:?}", comparison);

            // 2) Classify, clean, extract and render.
            let mut system = process::SystemProcess;
            let mut dry = process::DryRun::default();
            let port: &mut dyn process::ProcessPort = if dry_run { &mut dry } else { &mut system };

            let layout = report::Layout::new(data_dir);
            let outcome = report::Report::new(&comparison, layout, gnuplot_bin, port).run()?;
            if dry_run {
                tracing::info!("dry run: skipped {} renderer commands", dry.skipped.len());
            }

            // 3) Summary.
            if let Some(path) = summary {
                std::fs::write(&path, serde_json::to_string_pretty(&outcome)?)?;
                println!("Wrote {}", path.display());
            }
            if !outcome.is_success() {
                anyhow::bail!(
                    "{} of {} comparisons failed",
                    outcome.failures.len(),
                    outcome.failures.len() + outcome.charts.len()
                );
            }
        }
        Commands::Bench {
            host,
            label,
            scheme,
            timeout,
            out_dir,
            config: config_path,
            ab_bin,
            dry_run,
        } => {
            let (tests, steps) = match config_path {
                Some(path) => {
                    let c = config::load(&path)?;
                    (c.tests, c.steps)
                }
                None => (config::default_tests(), config::default_steps()),
            };

            let opts = bench::BenchOptions {
                host,
                label,
                scheme,
                timeout_secs: timeout,
                out_dir,
                ab_bin,
            };

            let mut system = process::SystemProcess;
            let mut dry = process::DryRun::default();
            let port: &mut dyn process::ProcessPort = if dry_run { &mut dry } else { &mut system };

            let outcome = bench::run(&opts, &tests, &steps, port);
            if dry_run {
                tracing::info!("dry run: skipped {} ab commands", dry.skipped.len());
            }
            if !outcome.failures.is_empty() {
                anyhow::bail!(
                    "{} of {} runs failed: {}",
                    outcome.failures.len(),
                    outcome.failures.len() + outcome.logs.len(),
                    outcome.failures.join(", ")
                );
            }
        }
    }

    Ok(())
}
