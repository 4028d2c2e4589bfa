//! Verbosity-leveled diagnostic sink
//!
//! Capture diagnostics stay off the host program's stdout: the default sink
//! writes to stderr, and embedders can supply their own implementation.
//! Emission is gated by the configured verbosity level, with level 1 for
//! inclusion/save events and level 2 for per-value exclusions.

use std::sync::{Arc, Mutex};

/// Destination for capture diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// Write one diagnostic line
    fn write_line(&self, line: &str);
}

/// Default sink: writes to stderr, leaving host stdout untouched
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn write_line(&self, line: &str) {
        eprintln!("  {line}");
    }
}

/// In-memory sink for tests and programmatic inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines emitted so far, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// True if any emitted line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn write_line(&self, line: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        lines.push(line.to_string());
    }
}

/// A sink paired with the verbosity gate that decides what reaches it
#[derive(Clone)]
pub struct Diagnostics {
    verbosity: u8,
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub fn new(verbosity: u8, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { verbosity, sink }
    }

    /// Stderr-backed diagnostics at the given verbosity
    pub fn stderr(verbosity: u8) -> Self {
        Self::new(verbosity, Arc::new(StderrSink))
    }

    /// True if messages at `level` would be emitted
    pub fn enabled(&self, level: u8) -> bool {
        self.verbosity >= level
    }

    /// Emit `msg` if the verbosity gate admits `level`
    pub fn emit(&self, level: u8, msg: &str) {
        if self.enabled(level) {
            self.sink.write_line(msg);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}
