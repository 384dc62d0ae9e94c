//! Counter file preparation.
//!
//! gcov-instrumented binaries write hit counts into a counter file next to
//! each note file produced at compile time. The binary under test often runs
//! as a different user than the harness, so before any capture every note
//! file gets a counter file and every counter file is made world-writable.
//!
//! Each fix-up is tried directly first. If that is refused, the same fix-up
//! is repeated through the elevated shell (`touch`, `chmod 666`). A fix-up
//! that still fails is logged and the walk moves on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::pipeline::CoveragePipeline;
use crate::result::{CovError, CovResult};
use crate::runner::{ProcessRunner, RunOptions, ToolCommand};

/// Mode applied to counter files
pub const COUNTER_MODE: u32 = 0o666;

/// Note/counter suffix pair, e.g. `.gcno` and `.gcda`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePairing {
    note_suffix: String,
    counter_suffix: String,
}

impl Default for FilePairing {
    fn default() -> Self {
        Self {
            note_suffix: ".gcno".to_string(),
            counter_suffix: ".gcda".to_string(),
        }
    }
}

impl FilePairing {
    /// Pair `note_suffix` with `counter_suffix`
    pub fn new(note_suffix: &str, counter_suffix: &str) -> CovResult<Self> {
        if note_suffix.is_empty() || counter_suffix.is_empty() {
            return Err(CovError::config("note and counter suffixes must not be empty"));
        }
        if note_suffix == counter_suffix {
            return Err(CovError::config(format!(
                "note and counter suffixes must differ (both are {note_suffix})"
            )));
        }
        Ok(Self {
            note_suffix: note_suffix.to_string(),
            counter_suffix: counter_suffix.to_string(),
        })
    }

    /// Suffix of note files
    #[must_use]
    pub fn note_suffix(&self) -> &str {
        &self.note_suffix
    }

    /// Suffix of counter files
    #[must_use]
    pub fn counter_suffix(&self) -> &str {
        &self.counter_suffix
    }

    /// Whether `path` names a note file
    #[must_use]
    pub fn is_note(&self, path: &Path) -> bool {
        file_name(path).is_some_and(|n| n.ends_with(&self.note_suffix))
    }

    /// Whether `path` names a counter file
    #[must_use]
    pub fn is_counter(&self, path: &Path) -> bool {
        file_name(path).is_some_and(|n| n.ends_with(&self.counter_suffix))
    }

    /// Counter file belonging to the note file `path`
    #[must_use]
    pub fn counter_for(&self, path: &Path) -> Option<PathBuf> {
        let stem = file_name(path)?.strip_suffix(self.note_suffix.as_str())?;
        Some(path.with_file_name(format!("{stem}{}", self.counter_suffix)))
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// What a preparation walk did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareReport {
    /// Note files found
    pub notes_seen: usize,
    /// Counter files found already present
    pub counters_seen: usize,
    /// Counter files created
    pub counters_created: usize,
    /// Counter files whose mode was fixed
    pub permissions_fixed: usize,
    /// Fix-ups or entries that could not be handled
    pub failures: usize,
}

impl PrepareReport {
    /// Whether every fix-up succeeded
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Walks a data directory and normalizes its counter files.
#[derive(Debug)]
pub struct DataFilePreparer<'a, R> {
    runner: &'a R,
    pairing: &'a FilePairing,
}

impl<'a, R: ProcessRunner> DataFilePreparer<'a, R> {
    /// Preparer using `runner` for elevated fallbacks
    pub const fn new(runner: &'a R, pairing: &'a FilePairing) -> Self {
        Self { runner, pairing }
    }

    /// Prepare every note/counter file under `root`
    pub fn prepare(&self, root: &Path) -> PrepareReport {
        let mut report = PrepareReport::default();

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    report.failures += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.pairing.is_counter(path) {
                report.counters_seen += 1;
                self.ensure_writable(path, &mut report);
            } else if let Some(counter) = self.pairing.counter_for(path) {
                report.notes_seen += 1;
                if !counter.exists() {
                    self.create_counter(&counter, &mut report);
                }
            }
        }

        tracing::debug!(?report, root = %root.display(), "data files prepared");
        report
    }

    fn ensure_writable(&self, path: &Path, report: &mut PrepareReport) {
        match is_world_writable(path) {
            Ok(true) => {}
            Ok(false) => {
                if set_counter_mode(path).is_ok() || self.elevated(&chmod_command(path)) {
                    report.permissions_fixed += 1;
                } else {
                    tracing::warn!(file = %path.display(), "could not make counter file writable");
                    report.failures += 1;
                }
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not stat counter file");
                report.failures += 1;
            }
        }
    }

    fn create_counter(&self, path: &Path, report: &mut PrepareReport) {
        let direct = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .and_then(|_| set_counter_mode(path));
        let created = match direct {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "retrying counter creation elevated");
                self.elevated(&touch_command(path)) && self.elevated(&chmod_command(path))
            }
        };

        if created {
            report.counters_created += 1;
        } else {
            tracing::warn!(file = %path.display(), "could not create counter file");
            report.failures += 1;
        }
    }

    fn elevated(&self, command: &ToolCommand) -> bool {
        match self.runner.run(command, RunOptions::elevated()) {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "elevated fix-up failed");
                false
            }
        }
    }
}

fn touch_command(path: &Path) -> ToolCommand {
    ToolCommand::new("touch").arg(path)
}

fn chmod_command(path: &Path) -> ToolCommand {
    ToolCommand::new("chmod").arg(format!("{COUNTER_MODE:o}")).arg(path)
}

#[cfg(unix)]
fn is_world_writable(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o002 != 0)
}

#[cfg(not(unix))]
fn is_world_writable(path: &Path) -> io::Result<bool> {
    Ok(!fs::metadata(path)?.permissions().readonly())
}

#[cfg(unix)]
fn set_counter_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(COUNTER_MODE))
}

#[cfg(not(unix))]
fn set_counter_mode(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(false);
    fs::set_permissions(path, perms)
}

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Prepare counter files under the data directory.
    ///
    /// Returns `None` when no data directory is configured.
    pub fn prepare_data_files(&self) -> Option<PrepareReport> {
        let data_dir = self.session().data_dir()?;
        Some(self.prepare_tree(data_dir))
    }

    /// Prepare counter files under an arbitrary `root`
    pub fn prepare_tree(&self, root: &Path) -> PrepareReport {
        DataFilePreparer::new(self.runner(), self.session().pairing()).prepare(root)
    }
}
