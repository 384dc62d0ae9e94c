//! Merging registered traces into one cumulative trace.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::CoveragePipeline;
use crate::result::CovResult;
use crate::runner::ProcessRunner;
use crate::session::TOTAL_TRACE;

/// `<out>.tmp`, the intermediate of an exclude merge
fn intermediate_path(out: &Path) -> PathBuf {
    let mut name = OsString::from(out.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Merge every registered trace, in registration order, into `out`
    /// (default `<output_dir>/total.info`).
    ///
    /// With `exclude` patterns the merge goes to `<out>.tmp` first, is then
    /// filtered into `out`, and the intermediate is removed. Returns
    /// `Ok(None)` without running anything when no data directory is
    /// configured or no trace has been registered.
    ///
    /// When the same record appears in several traces, lcov's own merge
    /// rules apply in registration order.
    pub fn merge<S: AsRef<str>>(
        &self,
        out: Option<&Path>,
        label: Option<&str>,
        exclude: &[S],
    ) -> CovResult<Option<PathBuf>> {
        if self.session().data_dir().is_none() {
            tracing::debug!("no coverage data directory; skipping merge");
            return Ok(None);
        }
        if self.traces().is_empty() {
            tracing::debug!("no traces registered; skipping merge");
            return Ok(None);
        }

        let out = self.or_default(out, TOTAL_TRACE);
        tracing::info!(out = %out.display(), traces = self.traces().len(), "merging coverage traces");
        self.session().ensure_output_dir()?;

        let lcov = self.lcov(label);
        let merged = if exclude.is_empty() {
            out.clone()
        } else {
            intermediate_path(&out)
        };
        self.run_lenient(&lcov.add(self.traces().traces(), &merged), "merge")?;

        if !exclude.is_empty() {
            self.run_lenient(&lcov.remove(&merged, exclude, &out), "exclude")?;
            if let Err(e) = fs::remove_file(&merged) {
                tracing::warn!(file = %merged.display(), error = %e, "could not remove intermediate trace");
            }
        }

        Ok(Some(out))
    }
}
