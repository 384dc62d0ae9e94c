//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// covpipe: gcov/lcov coverage sessions for test runs
#[derive(Parser, Debug)]
#[command(name = "covpipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML session configuration; flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root of the instrumented build's .gcno/.gcda files
    #[arg(long, global = true, env = "COVPIPE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for traces and reports
    #[arg(long, global = true, env = "COVPIPE_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// lcov executable name or path
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub lcov: Option<String>,

    /// genhtml executable name or path
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub genhtml: Option<String>,

    /// Render HTML without annotated source
    #[arg(long, global = true)]
    pub no_source: bool,

    /// Base URL the relocated report will be served from
    #[arg(long, global = true, env = "COVPIPE_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Never run commands through sudo
    #[arg(long, global = true)]
    pub no_elevate: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create missing counter files and make them writable
    Prepare,

    /// Capture a zero-count baseline
    Baseline(CaptureArgs),

    /// Capture the counts accumulated by the tests
    Capture(CaptureArgs),

    /// Zero all counters under the data directory
    Reset,

    /// Merge traces into one cumulative trace
    Merge(MergeArgs),

    /// Render an HTML report with genhtml
    Html(HtmlArgs),

    /// Copy the HTML report with links rewritten to a base URL
    Relocate(RelocateArgs),

    /// Print coverage totals of a trace
    Summary(SummaryArgs),

    /// Run a command inside a full coverage session
    ///
    /// Captures a baseline, runs the command, captures again, merges,
    /// renders HTML, relocates it when a base URL is set and prints the
    /// totals. Exits with the command's exit status.
    Exec(ExecArgs),
}

impl Commands {
    /// Subcommand name as typed
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Baseline(_) => "baseline",
            Self::Capture(_) => "capture",
            Self::Reset => "reset",
            Self::Merge(_) => "merge",
            Self::Html(_) => "html",
            Self::Relocate(_) => "relocate",
            Self::Summary(_) => "summary",
            Self::Exec(_) => "exec",
        }
    }

    /// Whether the command falls back to paths under the output directory.
    ///
    /// `exec` runs a whole session in one process and may use a fresh
    /// temporary directory instead.
    #[must_use]
    pub fn needs_output_dir(&self) -> bool {
        match self {
            Self::Prepare | Self::Reset | Self::Exec(_) => false,
            Self::Baseline(args) | Self::Capture(args) => args.output.is_none(),
            Self::Merge(args) => args.output.is_none() || args.traces.is_empty(),
            Self::Html(args) => args.input.is_none() || args.output.is_none(),
            Self::Relocate(args) => args.dir.is_none(),
            Self::Summary(args) => args.input.is_none(),
        }
    }
}

/// Arguments for the baseline and capture commands
#[derive(Args, Debug, Default)]
pub struct CaptureArgs {
    /// Output trace file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Test name label recorded in the trace
    #[arg(short = 't', long, value_name = "NAME")]
    pub label: Option<String>,
}

/// Arguments for the merge command
#[derive(Args, Debug, Default)]
pub struct MergeArgs {
    /// Output trace file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Test name label recorded in the merged trace
    #[arg(short = 't', long, value_name = "NAME")]
    pub label: Option<String>,

    /// Trace to merge; repeatable. Defaults to the baseline and tests traces
    #[arg(short = 'a', long = "add", value_name = "FILE")]
    pub traces: Vec<PathBuf>,

    /// Source path pattern to drop from the result; repeatable
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

/// Arguments for the html command
#[derive(Args, Debug, Default)]
pub struct HtmlArgs {
    /// Trace to render
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Report directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Arguments for the relocate command
#[derive(Args, Debug, Default)]
pub struct RelocateArgs {
    /// Report directory to relocate
    #[arg(short = 'd', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Arguments for the summary command
#[derive(Args, Debug, Default)]
pub struct SummaryArgs {
    /// Trace to summarize
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Print parsed totals as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the exec command
#[derive(Args, Debug, Default)]
pub struct ExecArgs {
    /// Test name label recorded in the traces
    #[arg(short = 't', long, value_name = "NAME")]
    pub label: Option<String>,

    /// Source path pattern to drop from the merged trace; repeatable
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Command to run, after `--`
    #[arg(required = true, last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
