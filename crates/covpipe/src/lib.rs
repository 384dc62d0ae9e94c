//! Covpipe: gcov/lcov coverage aggregation
//!
//! Drives `lcov` and `genhtml` through one coverage session of an
//! instrumented build: prepare the counter files, capture a zero baseline,
//! capture again after the tests ran, merge everything, render HTML and
//! optionally make the report servable from another base URL.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ SessionConfig │──►│ Session       │──►│ Coverage      │
//! │ (YAML, flags) │   │ (tools, dirs) │   │ Pipeline      │
//! └───────────────┘   └───────────────┘   └───────┬───────┘
//!                                                 │ ToolCommand
//!                                         ┌───────▼───────┐
//!                                         │ ProcessRunner │──► lcov / genhtml
//!                                         └───────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use covpipe::{CoveragePipeline, SessionConfig};
//!
//! # fn main() -> covpipe::CovResult<()> {
//! let config = SessionConfig::new()
//!     .with_data_dir("/build/obj")
//!     .with_output_dir("/tmp/coverage");
//! let mut pipeline = CoveragePipeline::from_config(&config)?;
//!
//! pipeline.initialize_baseline(None, None)?;
//! // ... run the test suite ...
//! pipeline.capture_incremental(None, Some("tests"))?;
//! pipeline.merge(None, None, &["/usr/*"])?;
//! pipeline.generate_html(None, None, false)?;
//! println!("{}", pipeline.summarize(None)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod capture;
mod merge;
mod report;

pub mod mock;
pub mod pipeline;
pub mod prepare;
pub mod relocate;
pub mod result;
pub mod runner;
pub mod session;
pub mod summary;
pub mod tool;
pub mod trace_store;

pub use pipeline::CoveragePipeline;
pub use prepare::{DataFilePreparer, FilePairing, PrepareReport, COUNTER_MODE};
pub use relocate::{BaseUrl, RelocationReport, BASEURL_SUFFIX};
pub use result::{CovError, CovResult};
pub use runner::{CommandOutput, ProcessRunner, RunOptions, SystemRunner, ToolCommand};
pub use session::{
    default_output_dir, Session, SessionConfig, BASELINE_TRACE, DEFAULT_COVERAGE_TOOL,
    DEFAULT_REPORT_TOOL, HTML_DIR, TESTS_TRACE, TOTAL_TRACE,
};
pub use summary::{CoverageSummary, Ratio};
pub use tool::{resolve_tool, Genhtml, Lcov};
pub use trace_store::TraceStore;

/// Everything needed to drive a session
pub mod prelude {
    pub use super::pipeline::CoveragePipeline;
    pub use super::result::{CovError, CovResult};
    pub use super::runner::{ProcessRunner, SystemRunner};
    pub use super::session::{Session, SessionConfig};
    pub use super::summary::CoverageSummary;
}
