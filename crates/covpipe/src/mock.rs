//! Test doubles for the process seam.
//!
//! [`RecordingRunner`] records every command instead of running it, answers
//! with queued [`CommandOutput`]s and can optionally create the `-o` target
//! of each call, which is enough to drive the whole pipeline without lcov
//! installed. It can also refuse to start a given tool, to exercise the
//! spawn-failure paths.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::result::{CovError, CovResult};
use crate::runner::{CommandOutput, ProcessRunner, RunOptions, ToolCommand};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments
    pub argv: Vec<String>,
    /// Options the call was made with
    pub options: RunOptions,
}

/// Runner that records commands instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    invocations: RefCell<Vec<Invocation>>,
    responses: RefCell<VecDeque<CommandOutput>>,
    materialize: bool,
    unspawnable: Option<String>,
}

impl RecordingRunner {
    /// Runner answering every call with a silent success
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; calls beyond the queue get [`CommandOutput::ok`]
    #[must_use]
    pub fn with_response(self, output: CommandOutput) -> Self {
        self.responses.borrow_mut().push_back(output);
        self
    }

    /// Create the path following `-o` on every call.
    ///
    /// genhtml targets become directories holding an `index.html`; every
    /// other target becomes a small tracefile.
    #[must_use]
    pub const fn materializing(mut self) -> Self {
        self.materialize = true;
        self
    }

    /// Fail to start any program whose file name contains `name`.
    ///
    /// The call is still recorded.
    #[must_use]
    pub fn failing_to_spawn(mut self, name: impl Into<String>) -> Self {
        self.unspawnable = Some(name.into());
        self
    }

    /// Calls recorded so far
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Argument vectors recorded so far
    #[must_use]
    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.invocations
            .borrow()
            .iter()
            .map(|i| i.argv.clone())
            .collect()
    }

    fn materialize_output(command: &ToolCommand) -> std::io::Result<()> {
        let args = command.get_args();
        let Some(target) = args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
        else {
            return Ok(());
        };

        if is_report_tool(command.program()) {
            fs::create_dir_all(&target)?;
            fs::write(target.join("index.html"), "<html></html>\n")
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, "TN:\nend_of_record\n")
        }
    }
}

fn program_matches(program: &Path, name: &str) -> bool {
    program
        .file_name()
        .is_some_and(|n| n.to_string_lossy().contains(name))
}

fn is_report_tool(program: &Path) -> bool {
    program_matches(program, "genhtml")
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand, options: RunOptions) -> CovResult<CommandOutput> {
        self.invocations.borrow_mut().push(Invocation {
            argv: command.argv(),
            options,
        });
        if let Some(ref name) = self.unspawnable {
            if program_matches(command.program(), name) {
                return Err(CovError::Spawn {
                    program: command.program().display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
                });
            }
        }
        if self.materialize {
            Self::materialize_output(command)?;
        }
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(CommandOutput::ok))
    }
}
