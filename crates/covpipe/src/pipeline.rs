//! The session-scoped coverage pipeline.
//!
//! [`CoveragePipeline`] owns one [`Session`], the [`TraceStore`] of that
//! session and the [`ProcessRunner`] used for every external call. The
//! individual steps are implemented next to their helpers:
//!
//! | Step                           | Module        |
//! |--------------------------------|---------------|
//! | `prepare_data_files`           | `prepare`     |
//! | `initialize_baseline`, `capture_incremental`, `reset` | `capture` |
//! | `merge`                        | `merge`       |
//! | `generate_html`                | `report`      |
//! | `relocate`                     | `relocate`    |
//! | `summarize`                    | `summary`     |
//!
//! Steps whose preconditions are not met (no data directory, no traces, no
//! report tool, missing input file) return `Ok(None)` or an empty value
//! instead of an error, so callers can run the whole sequence
//! unconditionally.

use std::path::{Path, PathBuf};

use crate::result::CovResult;
use crate::runner::{CommandOutput, ProcessRunner, RunOptions, SystemRunner, ToolCommand};
use crate::session::{Session, SessionConfig};
use crate::tool::{Genhtml, Lcov};
use crate::trace_store::TraceStore;

/// Coverage aggregation for one session.
#[derive(Debug)]
pub struct CoveragePipeline<R = SystemRunner> {
    session: Session,
    traces: TraceStore,
    runner: R,
}

impl CoveragePipeline<SystemRunner> {
    /// Resolve `config` and run tools on this machine.
    ///
    /// # Errors
    ///
    /// Returns the fatal configuration errors of [`Session::resolve`].
    pub fn from_config(config: &SessionConfig) -> CovResult<Self> {
        let session = Session::resolve(config)?;
        let runner = SystemRunner::new().with_elevation(config.elevate_with.iter().cloned());
        Ok(Self::new(session, runner))
    }
}

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Pipeline over an already resolved session
    pub fn new(session: Session, runner: R) -> Self {
        Self {
            session,
            traces: TraceStore::new(),
            runner,
        }
    }

    /// The session settings
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Traces registered so far
    pub const fn traces(&self) -> &TraceStore {
        &self.traces
    }

    /// The process runner
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Register an existing trace for the next merge.
    ///
    /// Returns `false` if it was already registered.
    pub fn add_trace(&mut self, trace: impl Into<PathBuf>) -> bool {
        self.traces.add(trace)
    }

    pub(crate) fn lcov(&self, label: Option<&str>) -> Lcov {
        Lcov::new(self.session.coverage_tool()).with_label(label)
    }

    pub(crate) fn genhtml(&self, no_source: bool) -> Option<Genhtml> {
        self.session
            .report_tool()
            .map(|tool| Genhtml::new(tool).with_no_source(no_source))
    }

    /// `path` if given, else `name` under the output directory
    pub(crate) fn or_default(&self, path: Option<&Path>, name: &str) -> PathBuf {
        path.map_or_else(|| self.session.output_path(name), Path::to_path_buf)
    }

    /// Run a tool call whose failure must not stop the pipeline.
    ///
    /// A non-zero exit is logged together with the captured stderr. Only a
    /// failure to start the process is returned.
    pub(crate) fn run_lenient(&self, command: &ToolCommand, step: &str) -> CovResult<CommandOutput> {
        let output = self
            .runner
            .run(command, RunOptions::plain().with_log_errors(false))?;
        if !output.success() {
            tracing::error!(
                step,
                command = %command,
                status = ?output.status,
                stderr = %output.stderr.trim(),
                "coverage tool reported an error"
            );
        }
        Ok(output)
    }

    /// Register `trace` if the tool produced it
    pub(crate) fn register_if_present(&mut self, trace: PathBuf) -> Option<PathBuf> {
        if trace.is_file() {
            self.traces.add(trace.clone());
            Some(trace)
        } else {
            tracing::warn!(trace = %trace.display(), "trace file was not produced; not registered");
            None
        }
    }
}
