//! Capture configuration
//!
//! Both the size threshold and the capture frequency are tri-state:
//! negative disables the automatic path entirely, zero removes the limit,
//! and a positive value enforces it.

use std::path::PathBuf;

/// Default minimum object size: 1 MiB
pub const DEFAULT_MIN_OBJECT_SIZE: i64 = 1024 * 1024;

/// Default output directory for snapshot files
pub const DEFAULT_OUTPUT_DIR: &str = "./snapshots";

/// Configuration for one capture engine
///
/// Fixed after construction except for `tracked_module_prefixes`, which can
/// be extended at runtime through [`crate::engine::CaptureEngine::track_library`].
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Source identity of the target file; probe events from any other
    /// source are ignored. Compared by exact string equality.
    pub tracee_path: String,

    /// Size threshold in bytes. `< 0`: only explicitly tracked values
    /// qualify. `0`: every recognized value qualifies regardless of size.
    /// `> 0`: a value must report at least this size and pass module
    /// filtering.
    pub min_object_size: i64,

    /// Directory snapshot files are written into. Created once at install.
    pub output_directory: PathBuf,

    /// Minimum milliseconds between automatic captures. `0`: capture on
    /// every probe event. `< 0`: never capture automatically, only on
    /// explicit request.
    pub frequency_ms: i64,

    /// Diagnostic verbosity; 0 is silent
    pub verbosity: u8,

    /// Module-name prefixes that qualify a value by its type's origin
    pub tracked_module_prefixes: Vec<String>,
}

impl CaptureConfig {
    /// Configuration with house defaults for the given tracee
    pub fn new(tracee_path: impl Into<String>) -> Self {
        Self {
            tracee_path: tracee_path.into(),
            min_object_size: DEFAULT_MIN_OBJECT_SIZE,
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            frequency_ms: 0,
            verbosity: 0,
            tracked_module_prefixes: default_module_prefixes(),
        }
    }

    pub fn with_min_object_size(mut self, size: i64) -> Self {
        self.min_object_size = size;
        self
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    pub fn with_frequency_ms(mut self, frequency_ms: i64) -> Self {
        self.frequency_ms = frequency_ms;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_module_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tracked_module_prefixes.push(prefix.into());
        self
    }
}

/// Prefixes of the numeric/data-frame ecosystem tracked out of the box
pub fn default_module_prefixes() -> Vec<String> {
    vec!["ndarray".to_string(), "polars".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::new("src/pipeline.rs");
        assert_eq!(config.tracee_path, "src/pipeline.rs");
        assert_eq!(config.min_object_size, DEFAULT_MIN_OBJECT_SIZE);
        assert_eq!(config.output_directory, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.frequency_ms, 0);
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.tracked_module_prefixes, vec!["ndarray", "polars"]);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CaptureConfig::new("a.rs")
            .with_min_object_size(-1)
            .with_frequency_ms(500)
            .with_verbosity(2)
            .with_output_directory("/tmp/snaps")
            .with_module_prefix("nalgebra");
        assert_eq!(config.min_object_size, -1);
        assert_eq!(config.frequency_ms, 500);
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.output_directory, PathBuf::from("/tmp/snaps"));
        assert!(config.tracked_module_prefixes.contains(&"nalgebra".to_string()));
    }
}
