//! Ordered set of accumulated trace files.

use std::path::{Path, PathBuf};

/// Trace paths registered during a session.
///
/// Insertion order is kept because lcov resolves conflicting records in the
/// order traces are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceStore {
    traces: Vec<PathBuf>,
}

impl TraceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `trace`. Returns `false` if it was already present.
    pub fn add(&mut self, trace: impl Into<PathBuf>) -> bool {
        let trace = trace.into();
        if self.contains(&trace) {
            return false;
        }
        tracing::info!(trace = %trace.display(), "adding coverage trace");
        self.traces.push(trace);
        true
    }

    /// Whether `trace` is registered
    #[must_use]
    pub fn contains(&self, trace: &Path) -> bool {
        self.traces.iter().any(|t| t == trace)
    }

    /// Registered traces, oldest first
    #[must_use]
    pub fn traces(&self) -> &[PathBuf] {
        &self.traces
    }

    /// Number of registered traces
    #[must_use]
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Iterate over registered traces
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.traces.iter()
    }
}

impl<'a> IntoIterator for &'a TraceStore {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
