//! Command-line grammars of the external coverage tools.
//!
//! ## lcov
//!
//! ```text
//! lcov [-t <label>] -i -d <dir> -c -o <out>        baseline (zero counts)
//! lcov [-t <label>] -c -d <dir> -o <out>           capture
//! lcov -z -d <dir>                                 reset counters
//! lcov [-t <label>] -a <t1> -a <t2> ... -o <out>   merge
//! lcov [-t <label>] -r <in> <patterns...> -o <out> exclude
//! lcov --summary <trace>                           summary (on stderr)
//! ```
//!
//! ## genhtml
//!
//! ```text
//! genhtml [--no-source] <trace> -o <htmldir>
//! ```
//!
//! Builders only produce [`ToolCommand`]s; nothing here executes.

use std::path::{Path, PathBuf};

use crate::runner::ToolCommand;

/// Resolve a tool name or path to an executable on `PATH`.
///
/// Returns `None` when nothing executable matches.
#[must_use]
pub fn resolve_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Builder for lcov invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcov {
    program: PathBuf,
    label: Option<String>,
}

impl Lcov {
    /// lcov at `program`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            label: None,
        }
    }

    /// Tag produced traces with a test name (`-t`)
    #[must_use]
    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(str::to_string);
        self
    }

    fn labeled(&self) -> ToolCommand {
        let cmd = ToolCommand::new(&self.program);
        match self.label {
            Some(ref label) => cmd.arg("-t").arg(label),
            None => cmd,
        }
    }

    /// Zero-count capture of everything instrumentable under `data_dir`
    #[must_use]
    pub fn baseline(&self, data_dir: &Path, out: &Path) -> ToolCommand {
        self.labeled()
            .arg("-i")
            .arg("-d")
            .arg(data_dir)
            .arg("-c")
            .arg("-o")
            .arg(out)
    }

    /// Capture of the counters accumulated under `data_dir`
    #[must_use]
    pub fn capture(&self, data_dir: &Path, out: &Path) -> ToolCommand {
        self.labeled()
            .arg("-c")
            .arg("-d")
            .arg(data_dir)
            .arg("-o")
            .arg(out)
    }

    /// Zero all counters under `data_dir`
    #[must_use]
    pub fn zero(&self, data_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .arg("-z")
            .arg("-d")
            .arg(data_dir)
    }

    /// Merge `traces`, in order, into `out`
    #[must_use]
    pub fn add<P: AsRef<Path>>(&self, traces: &[P], out: &Path) -> ToolCommand {
        traces
            .iter()
            .fold(self.labeled(), |cmd, trace| cmd.arg("-a").arg(trace.as_ref()))
            .arg("-o")
            .arg(out)
    }

    /// Copy `trace` to `out` without records matching `patterns`
    #[must_use]
    pub fn remove<S: AsRef<str>>(&self, trace: &Path, patterns: &[S], out: &Path) -> ToolCommand {
        self.labeled()
            .arg("-r")
            .arg(trace)
            .args(patterns.iter().map(AsRef::<str>::as_ref))
            .arg("-o")
            .arg(out)
    }

    /// Print totals for `trace`
    #[must_use]
    pub fn summary(&self, trace: &Path) -> ToolCommand {
        ToolCommand::new(&self.program).arg("--summary").arg(trace)
    }
}

/// Builder for genhtml invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genhtml {
    program: PathBuf,
    no_source: bool,
}

impl Genhtml {
    /// genhtml at `program`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            no_source: false,
        }
    }

    /// Leave annotated source listings out of the report
    #[must_use]
    pub const fn with_no_source(mut self, no_source: bool) -> Self {
        self.no_source = no_source;
        self
    }

    /// Render `trace` into `html_out`
    #[must_use]
    pub fn render(&self, trace: &Path, html_out: &Path) -> ToolCommand {
        let cmd = ToolCommand::new(&self.program);
        let cmd = if self.no_source {
            cmd.arg("--no-source")
        } else {
            cmd
        };
        cmd.arg(trace).arg("-o").arg(html_out)
    }
}
