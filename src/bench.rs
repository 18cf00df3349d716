//! Load-generation runs: one `ab` invocation per (test, concurrency step),
//! each writing a raw log named `{label}_{test}_c{concurrency}.dat`.

use crate::classify;
use crate::config::TestSpec;
use crate::process::{Invocation, ProcessPort};

use anyhow::{Context, anyhow};
use clap::ValueEnum;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchOptions {
    /// Host (optionally `host:port`) actually receiving the load.
    pub host: String,
    /// Configuration label used as the raw log filename prefix.
    pub label: String,
    pub scheme: Scheme,
    /// Per-request timeout passed to `ab -s`, in seconds.
    pub timeout_secs: u64,
    pub out_dir: PathBuf,
    pub ab_bin: OsString,
}

/// Point a catalog URL at the benchmarked host.
///
/// Returns the rewritten URL and the original `host[:port]`, which is sent
/// as the `Host` header so the service still routes to the right site.
pub fn target_url(catalog_url: &str, scheme: Scheme, host: &str) -> anyhow::Result<(Url, String)> {
    let mut url = Url::parse(catalog_url).with_context(|| format!("bad test URL {catalog_url}"))?;
    let original_host = url
        .host_str()
        .ok_or_else(|| anyhow!("test URL {catalog_url} has no host"))?;
    let host_header = match url.port() {
        Some(port) => format!("{original_host}:{port}"),
        None => original_host.to_string(),
    };

    let target = Url::parse(&format!("{}://{}", scheme.as_str(), host))
        .with_context(|| format!("bad benchmark host {host}"))?;

    url.set_scheme(scheme.as_str())
        .map_err(|()| anyhow!("cannot switch {catalog_url} to {}", scheme.as_str()))?;
    url.set_host(target.host_str())
        .with_context(|| format!("cannot set host {host} on {catalog_url}"))?;
    url.set_port(target.port())
        .map_err(|()| anyhow!("cannot set port of {host} on {catalog_url}"))?;

    Ok((url, host_header))
}

pub fn ab_invocation(
    opts: &BenchOptions,
    test: &TestSpec,
    concurrency: u32,
) -> anyhow::Result<Invocation> {
    let (url, host_header) = target_url(&test.url, opts.scheme, &opts.host)?;
    let out = opts
        .out_dir
        .join(classify::raw_filename(&opts.label, &test.id, concurrency));

    let mut inv = Invocation::new(opts.ab_bin.clone(), &out)
        .arg("-s")
        .arg(opts.timeout_secs.to_string())
        .arg("-c")
        .arg(concurrency.to_string())
        .arg("-n")
        .arg(test.requests.to_string())
        .arg("-H")
        .arg(format!("Host: {host_header}"));

    // Plain HTTP benchmarks pretend to be behind a TLS terminator so the
    // application does not answer with redirects.
    if opts.scheme == Scheme::Http {
        inv = inv.arg("-H").arg("X-Forwarded-Proto: https");
    }

    Ok(inv.arg("-g").arg(&out).arg(url.as_str()))
}

#[derive(Debug, Default)]
pub struct BenchSummary {
    pub logs: Vec<PathBuf>,
    pub failures: Vec<String>,
}

/// Run every test at every concurrency step, sequentially. A failed run is
/// logged and recorded; the remaining runs still execute.
pub fn run(
    opts: &BenchOptions,
    tests: &[TestSpec],
    steps: &[u32],
    port: &mut dyn ProcessPort,
) -> BenchSummary {
    let mut summary = BenchSummary::default();
    for test in tests {
        info!("performing requests for {}", test.id);
        for &concurrency in steps {
            info!("starting run with c={}, n={}", concurrency, test.requests);
            let result = ab_invocation(opts, test, concurrency)
                .and_then(|inv| port.run(&inv).map_err(anyhow::Error::from));
            match result {
                Ok(log) => summary.logs.push(log),
                Err(err) => {
                    error!("run {} c={} failed: {:#}", test.id, concurrency, err);
                    summary
                        .failures
                        .push(classify::raw_filename(&opts.label, &test.id, concurrency));
                }
            }
        }
    }
    summary
}
