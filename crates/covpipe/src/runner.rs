//! Process execution for external coverage tools.
//!
//! Every external call the pipeline makes goes through [`ProcessRunner`], so
//! the command grammar can be tested without lcov installed and so elevated
//! execution lives in exactly one place.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use covpipe::runner::{ProcessRunner, RunOptions, SystemRunner, ToolCommand};
//!
//! let runner = SystemRunner::new();
//! let cmd = ToolCommand::new("chmod").arg("666").arg("/var/cov/a.gcda");
//! let output = runner.run(&cmd, RunOptions::elevated())?;
//! assert!(output.success());
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::result::{CovError, CovResult};

/// A fully built command line: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a command for `program` with no arguments
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Program to execute
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, without the program
    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Program and arguments as lossy strings, program first
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// How a command should be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Run through the elevation prefix (e.g. `sudo`)
    pub elevate: bool,
    /// Log stderr when the command exits unsuccessfully
    pub log_errors: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            elevate: false,
            log_errors: true,
        }
    }
}

impl RunOptions {
    /// Unprivileged, errors logged
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Privileged, errors logged
    #[must_use]
    pub fn elevated() -> Self {
        Self {
            elevate: true,
            ..Self::default()
        }
    }

    /// Set whether failures are logged by the runner
    #[must_use]
    pub const fn with_log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    /// A failed result with the given exit code and stderr
    #[must_use]
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Executes command lines on behalf of the pipeline.
///
/// `Err` means the process could not be started. A process that ran and
/// failed is an `Ok` with a non-zero [`CommandOutput::status`].
pub trait ProcessRunner {
    /// Run `command` to completion and capture its output
    fn run(&self, command: &ToolCommand, options: RunOptions) -> CovResult<CommandOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &ToolCommand, options: RunOptions) -> CovResult<CommandOutput> {
        (**self).run(command, options)
    }
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// Prefix used for elevated commands; empty runs them unprivileged
    elevate_with: Vec<String>,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRunner {
    /// Create a runner that elevates through `sudo`
    #[must_use]
    pub fn new() -> Self {
        Self {
            elevate_with: vec!["sudo".to_string()],
        }
    }

    /// Use a custom elevation prefix, e.g. `["sudo", "-n"]`
    #[must_use]
    pub fn with_elevation<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elevate_with = prefix.into_iter().map(Into::into).collect();
        self
    }

    /// Run elevated commands as the current user
    #[must_use]
    pub fn without_elevation(mut self) -> Self {
        self.elevate_with.clear();
        self
    }

    /// Elevation prefix in use
    #[must_use]
    pub fn elevation_prefix(&self) -> &[String] {
        &self.elevate_with
    }

    fn build(&self, command: &ToolCommand, elevate: bool) -> Command {
        match self.elevate_with.split_first() {
            Some((head, rest)) if elevate => {
                let mut cmd = Command::new(head);
                cmd.args(rest).arg(command.program()).args(command.get_args());
                cmd
            }
            _ => {
                let mut cmd = Command::new(command.program());
                cmd.args(command.get_args());
                cmd
            }
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &ToolCommand, options: RunOptions) -> CovResult<CommandOutput> {
        tracing::debug!(command = %command, elevated = options.elevate, "running");

        let output = self
            .build(command, options.elevate)
            .output()
            .map_err(|source| CovError::Spawn {
                program: command.program().display().to_string(),
                source,
            })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && options.log_errors {
            tracing::warn!(
                command = %command,
                status = ?result.status,
                stderr = %result.stderr.trim(),
                "command exited unsuccessfully"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod tool_command_tests {
        use super::*;

        #[test]
        fn test_argv_starts_with_program() {
            let cmd = ToolCommand::new("lcov").arg("-c").args(["-o", "out.info"]);
            assert_eq!(cmd.argv(), vec!["lcov", "-c", "-o", "out.info"]);
        }

        #[test]
        fn test_display_joins_argv() {
            let cmd = ToolCommand::new("genhtml").arg("total.info");
            assert_eq!(cmd.to_string(), "genhtml total.info");
        }
    }

    mod command_output_tests {
        use super::*;

        #[test]
        fn test_ok_is_success() {
            assert!(CommandOutput::ok().success());
        }

        #[test]
        fn test_failed_is_not_success() {
            let out = CommandOutput::failed(2, "boom");
            assert!(!out.success());
            assert_eq!(out.stderr, "boom");
        }

        #[test]
        fn test_signal_is_not_success() {
            let out = CommandOutput {
                status: None,
                ..CommandOutput::default()
            };
            assert!(!out.success());
        }
    }

    #[cfg(unix)]
    mod system_runner_tests {
        use super::*;

        #[test]
        fn test_captures_stdout_and_status() {
            let runner = SystemRunner::new().without_elevation();
            let cmd = ToolCommand::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
            let out = runner.run(&cmd, RunOptions::plain()).unwrap();
            assert_eq!(out.status, Some(3));
            assert_eq!(out.stdout.trim(), "hello");
            assert_eq!(out.stderr.trim(), "oops");
        }

        #[test]
        fn test_elevation_prefix_wraps_program() {
            // `env` as a stand-in prefix: it executes its argument unchanged
            let runner = SystemRunner::new().with_elevation(["env"]);
            let cmd = ToolCommand::new("sh").args(["-c", "echo elevated"]);
            let out = runner.run(&cmd, RunOptions::elevated()).unwrap();
            assert!(out.success());
            assert_eq!(out.stdout.trim(), "elevated");
        }

        #[test]
        fn test_missing_program_is_spawn_error() {
            let runner = SystemRunner::new();
            let cmd = ToolCommand::new("/nonexistent/covpipe-tool");
            let err = runner.run(&cmd, RunOptions::plain()).unwrap_err();
            assert!(matches!(err, CovError::Spawn { .. }));
        }

        #[test]
        fn test_default_prefix_is_sudo() {
            assert_eq!(SystemRunner::default().elevation_prefix(), ["sudo"]);
            assert!(SystemRunner::new()
                .without_elevation()
                .elevation_prefix()
                .is_empty());
        }
    }
}
