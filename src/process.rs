//! Synchronous port to external programs (load generator, chart renderer).
//!
//! Callers describe the command and the file it is expected to produce; the
//! port runs it to completion and hands back the artifact path.

use crate::error::ExternalProcessError;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// One external command plus the artifact it must leave behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub artifact: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            artifact: artifact.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|a| quote(&a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

pub trait ProcessPort {
    /// Run to completion. Succeeds only on exit status zero and when the
    /// expected artifact exists afterwards.
    fn run(&mut self, invocation: &Invocation) -> Result<PathBuf, ExternalProcessError>;
}

/// Runs commands for real through `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemProcess;

impl ProcessPort for SystemProcess {
    fn run(&mut self, invocation: &Invocation) -> Result<PathBuf, ExternalProcessError> {
        let command = invocation.command_line();
        info!("executing {}", command);

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| ExternalProcessError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExternalProcessError::Exit {
                command,
                status: status.to_string(),
            });
        }

        check_artifact(&command, &invocation.artifact)
    }
}

fn check_artifact(command: &str, artifact: &Path) -> Result<PathBuf, ExternalProcessError> {
    if artifact.exists() {
        Ok(artifact.to_path_buf())
    } else {
        Err(ExternalProcessError::MissingArtifact {
            command: command.to_string(),
            artifact: artifact.to_path_buf(),
        })
    }
}

/// Logs what would run and pretends it worked.
#[derive(Debug, Default)]
pub struct DryRun {
    pub skipped: Vec<Invocation>,
}

impl ProcessPort for DryRun {
    fn run(&mut self, invocation: &Invocation) -> Result<PathBuf, ExternalProcessError> {
        info!("dry run, not executing {}", invocation.command_line());
        self.skipped.push(invocation.clone());
        Ok(invocation.artifact.clone())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records invocations; fails those whose command line contains `fail_on`.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub calls: Vec<Invocation>,
        pub fail_on: Option<String>,
    }

    impl ProcessPort for Recorder {
        fn run(&mut self, invocation: &Invocation) -> Result<PathBuf, ExternalProcessError> {
            self.calls.push(invocation.clone());
            let command = invocation.command_line();
            match &self.fail_on {
                Some(needle) if command.contains(needle.as_str()) => {
                    Err(ExternalProcessError::Exit {
                        command,
                        status: "exit status: 1".to_string(),
                    })
                }
                _ => Ok(invocation.artifact.clone()),
            }
        }
    }
}
