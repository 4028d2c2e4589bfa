//! Error types for the capture engine
//!
//! Configuration and precondition failures surface immediately; per-value
//! capture failures are reported through [`crate::scope::BindingOutcome`]
//! and the diagnostic sink instead of unwinding into the host program.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the capture engine and persistence layer
#[derive(Debug, Error)]
pub enum Error {
    /// `install()` was called on an engine that is already installed
    #[error("capture hooks are already installed")]
    AlreadyInstalled,

    /// The global accessor was consulted before any engine was constructed
    #[error("no capture engine has been registered")]
    NoEngineRegistered,

    /// The output directory could not be created at install time
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single value could not be rendered into its document form
    #[error("failed to encode value `{name}`: {source}")]
    ValueEncode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot envelope could not be serialized
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    /// A snapshot file could not be deserialized
    #[error("failed to decode snapshot: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),

    /// Filesystem failure while writing or reading a snapshot
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}
