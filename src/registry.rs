//! Process-wide engine registration
//!
//! Target-program code reaches the engine through one controlled accessor
//! instead of ambient global mutation. Constructing an engine replaces any
//! prior registration; the slot holds at most one live instance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::CaptureEngine;
use crate::error::{Error, Result};

static CURRENT: Mutex<Option<Arc<CaptureEngine>>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Arc<CaptureEngine>>> {
    CURRENT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Make `engine` the process-wide instance, replacing any prior one
pub(crate) fn register(engine: Arc<CaptureEngine>) {
    *slot() = Some(engine);
}

/// The currently registered engine, if any
pub fn current() -> Option<Arc<CaptureEngine>> {
    slot().clone()
}

/// The currently registered engine, or a precondition error when none has
/// been constructed yet
pub fn global() -> Result<Arc<CaptureEngine>> {
    current().ok_or(Error::NoEngineRegistered)
}

/// Drop the current registration
///
/// Probe macros become no-ops until another engine is constructed. Mainly
/// useful for embedder teardown and tests.
pub fn clear() {
    *slot() = None;
}
