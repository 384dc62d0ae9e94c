//! HTML report generation with genhtml.

use std::path::{Path, PathBuf};

use crate::pipeline::CoveragePipeline;
use crate::result::CovResult;
use crate::runner::ProcessRunner;
use crate::session::{HTML_DIR, TOTAL_TRACE};

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Render `trace` (default `<output_dir>/total.info`) into `html_out`
    /// (default `<output_dir>/html`).
    ///
    /// Source listings are left out when `no_source` or the session default
    /// asks for it. Returns `Ok(None)` without running anything if the report
    /// tool is unavailable or the trace does not exist.
    pub fn generate_html(
        &self,
        trace: Option<&Path>,
        html_out: Option<&Path>,
        no_source: bool,
    ) -> CovResult<Option<PathBuf>> {
        let no_source = no_source || self.session().no_source();
        let Some(genhtml) = self.genhtml(no_source) else {
            tracing::warn!("no report tool available; skipping HTML generation");
            return Ok(None);
        };

        let trace = self.or_default(trace, TOTAL_TRACE);
        if !trace.is_file() {
            tracing::debug!(trace = %trace.display(), "no trace to render");
            return Ok(None);
        }

        let html_out = self.or_default(html_out, HTML_DIR);
        if no_source {
            tracing::info!(out = %html_out.display(), "generating HTML report without source");
        } else {
            tracing::info!(out = %html_out.display(), "generating HTML report with source");
        }
        self.run_lenient(&genhtml.render(&trace, &html_out), "html")?;
        Ok(Some(html_out))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::RecordingRunner;
    use crate::session::{Session, SessionConfig};
    use std::fs;
    use tempfile::TempDir;

    fn pipeline(
        config: &SessionConfig,
        with_report_tool: bool,
    ) -> CoveragePipeline<RecordingRunner> {
        let session = Session::resolve_with(config, |n| {
            (with_report_tool || n != "genhtml").then(|| PathBuf::from(n))
        })
        .unwrap();
        CoveragePipeline::new(session, RecordingRunner::new().materializing())
    }

    fn with_total(tmp: &TempDir) -> SessionConfig {
        let out = tmp.path().join("cov");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("total.info"), "TN:\n").unwrap();
        SessionConfig::new().with_output_dir(out)
    }

    #[test]
    fn test_missing_report_tool_is_noop() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&with_total(&tmp), false);

        assert_eq!(p.generate_html(None, None, false).unwrap(), None);
        assert!(p.runner().invocations().is_empty());
        assert!(!tmp.path().join("cov").join("html").exists());
    }

    #[test]
    fn test_missing_trace_is_noop() {
        let tmp = TempDir::new().unwrap();
        let config = SessionConfig::new().with_output_dir(tmp.path().join("empty"));
        let p = pipeline(&config, true);

        assert_eq!(p.generate_html(None, None, false).unwrap(), None);
        assert!(p.runner().invocations().is_empty());
    }

    #[test]
    fn test_renders_with_source() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&with_total(&tmp), true);
        let cov = tmp.path().join("cov");

        let html = p.generate_html(None, None, false).unwrap().unwrap();

        assert_eq!(html, cov.join("html"));
        assert_eq!(
            p.runner().argvs(),
            vec![vec![
                "genhtml".to_string(),
                cov.join("total.info").display().to_string(),
                "-o".to_string(),
                html.display().to_string(),
            ]]
        );
    }

    #[test]
    fn test_per_call_no_source() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&with_total(&tmp), true);
        p.generate_html(None, None, true).unwrap();
        assert_eq!(p.runner().argvs()[0][1], "--no-source");
    }

    #[test]
    fn test_session_no_source() {
        let tmp = TempDir::new().unwrap();
        let config = with_total(&tmp).with_no_source(true);
        let p = pipeline(&config, true);
        p.generate_html(None, None, false).unwrap();
        assert_eq!(p.runner().argvs()[0][1], "--no-source");
    }
}
