//! Coverage totals of a trace.
//!
//! `lcov --summary` prints its totals on stderr:
//!
//! ```text
//! Summary coverage rate:
//!   lines......: 85.7% (12 of 14 lines)
//!   functions..: 100.0% (2 of 2 functions)
//!   branches...: no data found
//! ```
//!
//! [`CoveragePipeline::summarize`] returns that text unchanged and
//! [`CoverageSummary::parse`] turns it into numbers.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::CoveragePipeline;
use crate::result::CovResult;
use crate::runner::{ProcessRunner, RunOptions};
use crate::session::TOTAL_TRACE;

/// Hit/found ratio of one coverage kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    /// Percentage as printed by lcov
    pub percent: f64,
    /// Items hit
    pub hit: u64,
    /// Items instrumented
    pub found: u64,
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}% ({} of {})", self.percent, self.hit, self.found)
    }
}

/// Totals parsed from `lcov --summary` output.
///
/// A kind is `None` when lcov reported `no data found` for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Line coverage
    pub lines: Option<Ratio>,
    /// Function coverage
    pub functions: Option<Ratio>,
    /// Branch coverage
    pub branches: Option<Ratio>,
}

fn summary_regex() -> Option<&'static Regex> {
    static LINE: OnceLock<Option<Regex>> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(lines|functions|branches)\.*:\s*([0-9.]+)%\s*\((\d+) of (\d+)").ok()
    })
    .as_ref()
}

fn ratio_from(caps: &regex::Captures<'_>) -> Option<Ratio> {
    Some(Ratio {
        percent: caps.get(2)?.as_str().parse().ok()?,
        hit: caps.get(3)?.as_str().parse().ok()?,
        found: caps.get(4)?.as_str().parse().ok()?,
    })
}

impl CoverageSummary {
    /// Extract the ratios from summary text. Unrecognized lines are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut summary = Self::default();
        let Some(line_re) = summary_regex() else {
            return summary;
        };
        for caps in line_re.captures_iter(text) {
            let ratio = ratio_from(&caps);
            match caps.get(1).map(|m| m.as_str()) {
                Some("lines") => summary.lines = ratio,
                Some("functions") => summary.functions = ratio,
                Some("branches") => summary.branches = ratio,
                _ => {}
            }
        }
        summary
    }

    /// Whether no kind had data
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_none() && self.functions.is_none() && self.branches.is_none()
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = [
            ("lines", self.lines),
            ("functions", self.functions),
            ("branches", self.branches),
        ];
        for (i, (name, ratio)) in kinds.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match ratio {
                Some(r) => write!(f, "{name:<10} {r}")?,
                None => write!(f, "{name:<10} no data found")?,
            }
        }
        Ok(())
    }
}

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Summary text of `trace` (default `<output_dir>/total.info`).
    ///
    /// Returns an empty string without running anything if the trace does
    /// not exist. Otherwise returns lcov's stderr verbatim, whatever its
    /// exit status.
    pub fn summarize(&self, trace: Option<&Path>) -> CovResult<String> {
        let trace = self.or_default(trace, TOTAL_TRACE);
        if !trace.is_file() {
            tracing::debug!(trace = %trace.display(), "no trace to summarize");
            return Ok(String::new());
        }
        let command = self.lcov(None).summary(&trace);
        let output = self
            .runner()
            .run(&command, RunOptions::plain().with_log_errors(false))?;
        Ok(output.stderr)
    }
}
