//! Capture engine: orchestration of trigger, policy, collection, and
//! persistence
//!
//! The engine runs inline on the host program's own thread. Automatic
//! captures go through the rate limiter; explicit snapshots bypass it.
//! Nothing in the event path may panic or propagate an error into the
//! host: capture failures are reported through the diagnostic sink and
//! execution continues.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::CaptureConfig;
use crate::diag::{Diagnostics, DiagnosticSink, StderrSink};
use crate::error::{Error, Result};
use crate::persist::{self, Snapshot};
use crate::policy::TrackedSet;
use crate::rate;
use crate::registry;
use crate::scope::{self, Binding};
use crate::value::{Capturable, ValueId};

struct EngineState {
    config: CaptureConfig,
    tracked: TrackedSet,
    last_capture_ms: Option<u64>,
    sequence: u64,
    installed: bool,
}

/// The process-wide capture orchestrator
///
/// Constructed once before the target code runs; construction registers
/// the instance with [`crate::registry`] so probe macros and target code
/// can reach it.
pub struct CaptureEngine {
    inner: Mutex<EngineState>,
    diag: Diagnostics,
}

impl CaptureEngine {
    /// Build an engine with stderr diagnostics and register it
    pub fn new(config: CaptureConfig) -> Arc<Self> {
        Self::with_sink(config, Arc::new(StderrSink))
    }

    /// Build an engine with a custom diagnostic sink and register it
    pub fn with_sink(config: CaptureConfig, sink: Arc<dyn DiagnosticSink>) -> Arc<Self> {
        let engine = Arc::new(Self {
            diag: Diagnostics::new(config.verbosity, sink),
            inner: Mutex::new(EngineState {
                config,
                tracked: TrackedSet::new(),
                last_capture_ms: None,
                sequence: 0,
                installed: false,
            }),
        });
        registry::register(Arc::clone(&engine));
        engine
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activate the line trigger
    ///
    /// Creates the output directory (a fatal configuration error if that
    /// fails) and flips the engine to installed. A second call is an
    /// error rather than a silent double registration. The returned guard
    /// deactivates the trigger when dropped, leaving the host environment
    /// clean however the program winds down.
    pub fn install(self: &Arc<Self>) -> Result<InstallGuard> {
        {
            let mut state = self.state();
            if state.installed {
                return Err(Error::AlreadyInstalled);
            }
            let dir = state.config.output_directory.clone();
            std::fs::create_dir_all(&dir).map_err(|source| Error::OutputDir {
                path: dir,
                source,
            })?;
            state.installed = true;
        }
        self.diag.emit(1, "[install] capture hooks installed");
        Ok(InstallGuard {
            engine: Arc::clone(self),
        })
    }

    pub fn is_installed(&self) -> bool {
        self.state().installed
    }

    /// Time of the last persisted capture, epoch milliseconds
    pub fn last_capture_ms(&self) -> Option<u64> {
        self.state().last_capture_ms
    }

    /// Opt `value` into capture by identity, independent of policy
    pub fn track(&self, value: &dyn Capturable) {
        self.state().tracked.insert(ValueId::of(value));
    }

    /// Remove `value` from the explicitly tracked set
    pub fn untrack(&self, value: &dyn Capturable) {
        self.state().tracked.remove(ValueId::of(value));
    }

    /// Extend the module-prefix allowlist at runtime
    pub fn track_library(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        debug!(prefix = %prefix, "tracking additional library prefix");
        self.state().config.tracked_module_prefixes.push(prefix);
    }

    /// Explicit, caller-triggered capture; bypasses the rate limiter
    ///
    /// This is the only capture path once `frequency_ms < 0` has recorded
    /// its first capture. Failures are reported through the diagnostic
    /// sink as well as returned.
    pub fn snapshot(
        &self,
        label: &str,
        globals: &[Binding<'_>],
        locals: &[Binding<'_>],
    ) -> Result<PathBuf> {
        match self.capture(label, globals, locals) {
            Ok(path) => Ok(path),
            Err(err) => {
                self.diag.emit(1, &format!("[snapshot] {label} failed: {err}"));
                Err(err)
            }
        }
    }

    /// Line-trigger callback
    ///
    /// No-op unless the engine is installed, `source_id` matches the
    /// configured tracee exactly, and the rate limiter is ready. Never
    /// panics and never surfaces an error to the host; failures are
    /// logged and the host continues on the next line.
    pub fn line_event(
        &self,
        source_id: &str,
        line: u32,
        globals: &[Binding<'_>],
        locals: &[Binding<'_>],
    ) {
        {
            let state = self.state();
            if !state.installed || state.config.tracee_path != source_id {
                return;
            }
            if !rate::ready_to_capture(state.config.frequency_ms, state.last_capture_ms, now_ms()) {
                return;
            }
        }
        self.diag.emit(1, &format!("[line] {source_id}:{line}"));
        if let Err(err) = self.capture(&line.to_string(), globals, locals) {
            self.diag
                .emit(1, &format!("[line] capture at {source_id}:{line} failed: {err}"));
        }
    }

    /// Collect, persist, and record the capture time
    fn capture(&self, label: &str, globals: &[Binding<'_>], locals: &[Binding<'_>]) -> Result<PathBuf> {
        // Snapshot config and tracked set so value capture code cannot
        // deadlock by re-entering the engine.
        let (config, tracked) = {
            let state = self.state();
            (state.config.clone(), state.tracked.clone())
        };

        let (payload, outcomes) = scope::collect(globals, locals, &config, &tracked, &self.diag);
        debug!(
            label = %label,
            captured = payload.len(),
            considered = outcomes.len(),
            "collected scope payload"
        );

        let timestamp_ms = now_ms();
        let sequence = {
            let mut state = self.state();
            state.sequence += 1;
            state.sequence
        };

        let snapshot = Snapshot {
            tracee: config.tracee_path.clone(),
            label: label.to_string(),
            timestamp_ms,
            sequence,
            payload,
        };
        let path = persist::save(&config.output_directory, &snapshot)?;

        if self.diag.enabled(1) {
            for name in snapshot.payload.names() {
                self.diag
                    .emit(1, &format!("[save] {name} @ {timestamp_ms} -> {}", path.display()));
            }
        }

        self.state().last_capture_ms = Some(timestamp_ms);
        Ok(path)
    }
}

impl std::fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("CaptureEngine")
            .field("tracee", &state.config.tracee_path)
            .field("installed", &state.installed)
            .field("sequence", &state.sequence)
            .finish_non_exhaustive()
    }
}

/// Deactivates the line trigger when dropped
#[must_use = "automatic capture stops when the guard is dropped"]
pub struct InstallGuard {
    engine: Arc<CaptureEngine>,
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        self.engine.state().installed = false;
        self.engine.diag.emit(1, "[install] capture hooks removed");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
