//! CLI configuration

use covpipe::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::commands::Cli;
use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log line format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Output settings of `cli`
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
            .with_color(cli.color.into())
            .with_log_format(cli.log_format.into())
    }
}

/// Session settings: defaults, then the `--config` file, then flags.
pub fn session_config(cli: &Cli) -> CliResult<SessionConfig> {
    let mut config = match cli.config {
        Some(ref path) => SessionConfig::from_yaml_file(path)?,
        None => SessionConfig::new(),
    };

    if let Some(ref dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(ref dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(ref lcov) = cli.lcov {
        config = config.with_coverage_tool(lcov);
    }
    if let Some(ref genhtml) = cli.genhtml {
        config = config.with_report_tool(genhtml);
    }
    if cli.no_source {
        config = config.with_no_source(true);
    }
    if let Some(ref url) = cli.base_url {
        config = config.with_base_url(url);
    }
    if cli.no_elevate {
        config = config.with_elevation(Vec::<String>::new());
    }
    Ok(config)
}

/// Fail unless an output directory is configured.
///
/// Stepwise subcommands run as separate processes and must agree on where
/// the traces live.
pub fn require_output_dir(config: &SessionConfig, command: &str) -> CliResult<()> {
    if config.output_dir.is_some() {
        Ok(())
    } else {
        Err(CliError::config(format!(
            "`{command}` needs an output directory: pass --output-dir, set COVPIPE_OUTPUT_DIR or output_dir in the config file"
        )))
    }
}
