//! Baseline and incremental captures, and counter reset.

use std::path::{Path, PathBuf};

use crate::pipeline::CoveragePipeline;
use crate::result::CovResult;
use crate::runner::ProcessRunner;
use crate::session::{BASELINE_TRACE, TESTS_TRACE};

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Capture a zero-count baseline of everything instrumentable.
    ///
    /// Prepares the counter files first. Writes to `out`, default
    /// `<output_dir>/baseline.info`, and registers the trace if lcov
    /// produced it. Returns `Ok(None)` when no data directory is configured
    /// or nothing was produced.
    ///
    /// # Errors
    ///
    /// Only if lcov cannot be started or the output directory cannot be
    /// created. A non-zero exit is logged.
    pub fn initialize_baseline(
        &mut self,
        out: Option<&Path>,
        label: Option<&str>,
    ) -> CovResult<Option<PathBuf>> {
        let Some(data_dir) = self.session().data_dir().map(Path::to_path_buf) else {
            return Ok(None);
        };
        let out = self.or_default(out, BASELINE_TRACE);
        tracing::info!(out = %out.display(), "initializing coverage data");

        self.prepare_tree(&data_dir);
        self.session().ensure_output_dir()?;
        let command = self.lcov(label).baseline(&data_dir, &out);
        self.run_lenient(&command, "baseline")?;
        Ok(self.register_if_present(out))
    }

    /// Capture the counts accumulated since the last reset.
    ///
    /// Writes to `out`, default `<output_dir>/tests.info`. Same
    /// preconditions and error policy as [`Self::initialize_baseline`].
    pub fn capture_incremental(
        &mut self,
        out: Option<&Path>,
        label: Option<&str>,
    ) -> CovResult<Option<PathBuf>> {
        let Some(data_dir) = self.session().data_dir().map(Path::to_path_buf) else {
            return Ok(None);
        };
        let out = self.or_default(out, TESTS_TRACE);
        tracing::info!(out = %out.display(), "capturing coverage data");

        self.session().ensure_output_dir()?;
        let command = self.lcov(label).capture(&data_dir, &out);
        self.run_lenient(&command, "capture")?;
        Ok(self.register_if_present(out))
    }

    /// Zero the counters under the data directory.
    ///
    /// Instrumented processes that are already running keep their
    /// in-memory counts and must be restarted before new counts reach the
    /// counter files; a fresh baseline does not repopulate them.
    ///
    /// Returns `false` when no data directory is configured.
    pub fn reset(&self) -> CovResult<bool> {
        let Some(data_dir) = self.session().data_dir() else {
            return Ok(false);
        };
        tracing::info!(data_dir = %data_dir.display(), "resetting coverage data");
        let command = self.lcov(None).zero(data_dir);
        self.run_lenient(&command, "reset")?;
        Ok(true)
    }
}
