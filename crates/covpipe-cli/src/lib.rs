//! covpipe CLI library
//!
//! Argument parsing, configuration layering, logging setup and the command
//! handlers behind the `covpipe` binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    CaptureArgs, Cli, ColorArg, Commands, ExecArgs, HtmlArgs, LogFormatArg, MergeArgs,
    RelocateArgs, SummaryArgs,
};
pub use config::{require_output_dir, session_config, CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
