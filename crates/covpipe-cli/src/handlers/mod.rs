//! Command handlers, one module per command group
//!
//! Handlers are generic over the process runner so they can be driven by
//! [`covpipe::mock::RecordingRunner`] in tests.

pub mod capture;
pub mod exec;
pub mod merge;
pub mod report;

pub use capture::{execute_baseline, execute_capture, execute_prepare, execute_reset};
pub use exec::{execute_exec, run_wrapped};
pub use merge::{execute_merge, register_traces};
pub use report::{execute_html, execute_relocate, execute_summary};
