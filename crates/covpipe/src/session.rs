//! Session configuration.
//!
//! [`SessionConfig`] is the raw, serializable form (YAML file, CLI flags).
//! [`Session`] is what the pipeline runs with: tools resolved to paths, the
//! data directory validated and the output directory fixed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prepare::FilePairing;
use crate::relocate::BaseUrl;
use crate::result::{CovError, CovResult};
use crate::tool::resolve_tool;

/// Default coverage extraction tool
pub const DEFAULT_COVERAGE_TOOL: &str = "lcov";
/// Default HTML report generator
pub const DEFAULT_REPORT_TOOL: &str = "genhtml";

/// Default trace written by a baseline capture
pub const BASELINE_TRACE: &str = "baseline.info";
/// Default trace written by an incremental capture
pub const TESTS_TRACE: &str = "tests.info";
/// Default merged trace
pub const TOTAL_TRACE: &str = "total.info";
/// Default HTML report directory
pub const HTML_DIR: &str = "html";

/// Raw session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Root of the instrumentation output; `None` disables capture and merge
    pub data_dir: Option<PathBuf>,
    /// Where traces and reports go; a timestamped temp dir when `None`
    pub output_dir: Option<PathBuf>,
    /// Coverage tool name or path
    pub coverage_tool: String,
    /// Report generator name or path
    pub report_tool: String,
    /// Render reports without annotated source
    pub no_source: bool,
    /// Base URL the relocated report will be served from
    pub base_url: Option<String>,
    /// Suffix of note files
    pub note_suffix: String,
    /// Suffix of counter files
    pub counter_suffix: String,
    /// Prefix used for privileged commands; empty disables elevation
    pub elevate_with: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let pairing = FilePairing::default();
        Self {
            data_dir: None,
            output_dir: None,
            coverage_tool: DEFAULT_COVERAGE_TOOL.to_string(),
            report_tool: DEFAULT_REPORT_TOOL.to_string(),
            no_source: false,
            base_url: None,
            note_suffix: pairing.note_suffix().to_string(),
            counter_suffix: pairing.counter_suffix().to_string(),
            elevate_with: vec!["sudo".to_string()],
        }
    }
}

impl SessionConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> CovResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: &Path) -> CovResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CovError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Set data directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set coverage tool
    #[must_use]
    pub fn with_coverage_tool(mut self, tool: impl Into<String>) -> Self {
        self.coverage_tool = tool.into();
        self
    }

    /// Set report tool
    #[must_use]
    pub fn with_report_tool(mut self, tool: impl Into<String>) -> Self {
        self.report_tool = tool.into();
        self
    }

    /// Set no-source default
    #[must_use]
    pub const fn with_no_source(mut self, no_source: bool) -> Self {
        self.no_source = no_source;
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the note/counter suffix pair
    #[must_use]
    pub fn with_suffixes(mut self, note: impl Into<String>, counter: impl Into<String>) -> Self {
        self.note_suffix = note.into();
        self.counter_suffix = counter.into();
        self
    }

    /// Set elevation prefix
    #[must_use]
    pub fn with_elevation<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elevate_with = prefix.into_iter().map(Into::into).collect();
        self
    }
}

/// Timestamped directory under the system temp dir, e.g.
/// `/tmp/covpipe-20240101_120000`
#[must_use]
pub fn default_output_dir() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::env::temp_dir().join(format!("covpipe-{stamp}"))
}

/// Resolved settings for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    data_dir: Option<PathBuf>,
    output_dir: PathBuf,
    coverage_tool: PathBuf,
    report_tool: Option<PathBuf>,
    no_source: bool,
    base_url: Option<String>,
    pairing: FilePairing,
}

impl Session {
    /// Resolve `config` against `PATH`.
    ///
    /// # Errors
    ///
    /// Fails if the coverage tool cannot be found, the data directory is
    /// not a directory, the base URL does not parse or the suffix pair is
    /// unusable. A missing report tool only disables HTML generation.
    pub fn resolve(config: &SessionConfig) -> CovResult<Self> {
        Self::resolve_with(config, resolve_tool)
    }

    /// Resolve `config` with a custom tool lookup
    pub fn resolve_with<F>(config: &SessionConfig, lookup: F) -> CovResult<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let pairing = FilePairing::new(&config.note_suffix, &config.counter_suffix)?;
        if let Some(ref url) = config.base_url {
            BaseUrl::parse(url)?;
        }
        let data_dir = match config.data_dir {
            Some(ref dir) => Some(validate_data_dir(dir, &pairing)?),
            None => None,
        };

        let Some(coverage_tool) = lookup(&config.coverage_tool) else {
            tracing::error!(tool = %config.coverage_tool, "coverage tool not found");
            return Err(CovError::ToolNotFound {
                name: config.coverage_tool.clone(),
            });
        };
        tracing::info!(tool = %coverage_tool.display(), "coverage utility set");

        let report_tool = lookup(&config.report_tool);
        match report_tool {
            Some(ref tool) => {
                tracing::info!(tool = %tool.display(), "HTML generation utility set");
            }
            None => tracing::warn!(tool = %config.report_tool, "report tool not found"),
        }

        let output_dir = config.output_dir.clone().unwrap_or_else(default_output_dir);
        tracing::info!(
            output_dir = %output_dir.display(),
            no_source = config.no_source,
            base_url = config.base_url.as_deref().unwrap_or("-"),
            "coverage session configured"
        );

        Ok(Self {
            data_dir,
            output_dir,
            coverage_tool,
            report_tool,
            no_source: config.no_source,
            base_url: config.base_url.clone(),
            pairing,
        })
    }

    /// Instrumentation output root, if coverage is enabled
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Output root (may not exist yet)
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolved coverage tool
    #[must_use]
    pub fn coverage_tool(&self) -> &Path {
        &self.coverage_tool
    }

    /// Resolved report tool, if available
    #[must_use]
    pub fn report_tool(&self) -> Option<&Path> {
        self.report_tool.as_deref()
    }

    /// Session-wide no-source default
    #[must_use]
    pub const fn no_source(&self) -> bool {
        self.no_source
    }

    /// Session-wide base URL
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Note/counter suffix pair
    #[must_use]
    pub const fn pairing(&self) -> &FilePairing {
        &self.pairing
    }

    /// `name` under the output directory
    #[must_use]
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Create the output directory if needed
    pub fn ensure_output_dir(&self) -> CovResult<&Path> {
        if !self.output_dir.is_dir() {
            fs::create_dir_all(&self.output_dir)?;
            tracing::debug!(output_dir = %self.output_dir.display(), "created output directory");
        }
        Ok(&self.output_dir)
    }
}

fn validate_data_dir(dir: &Path, pairing: &FilePairing) -> CovResult<PathBuf> {
    if !dir.is_dir() {
        return Err(CovError::InvalidDataDir {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let has_notes = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file() && pairing.is_note(e.path()));
    if has_notes {
        tracing::info!(data_dir = %dir.display(), "coverage data directory set");
    } else {
        tracing::warn!(
            data_dir = %dir.display(),
            suffix = pairing.note_suffix(),
            "no note files found in coverage data directory"
        );
    }

    Ok(dir.to_path_buf())
}
