//! Recuerdo - runtime state snapshotting for long-running Rust programs
//!
//! While a host program executes, probe points observe progress at line
//! granularity, a policy decides which in-scope values are interesting,
//! a rate limiter throttles capture frequency, and qualifying values are
//! persisted to durable snapshot files for offline inspection.
//!
//! # Quick start
//!
//! ```no_run
//! use recuerdo::{observe, snapshot, CaptureConfig, CaptureEngine};
//!
//! let config = CaptureConfig::new(file!())
//!     .with_min_object_size(0)
//!     .with_output_directory("./snapshots");
//! let engine = CaptureEngine::new(config);
//! let _guard = engine.install().expect("output directory must be creatable");
//!
//! let mut totals: Vec<f64> = Vec::new();
//! for step in 0..1_000u64 {
//!     totals.push(step as f64);
//!     observe!(locals: [step, totals]);
//! }
//! snapshot!("final", locals: [totals]);
//! ```

pub mod cli;
pub mod config;
pub mod diag;
pub mod engine;
pub mod error;
pub mod persist;
pub mod policy;
pub mod rate;
pub mod registry;
pub mod scope;
pub mod trigger;
pub mod value;

pub use config::CaptureConfig;
pub use engine::{CaptureEngine, InstallGuard};
pub use error::{Error, Result};
pub use persist::Snapshot;
pub use policy::{SkipReason, TrackedSet, Verdict};
pub use scope::{Binding, BindingOutcome, Payload};
pub use value::{Capturable, CapturedValue, ValueId, ValueKind};
