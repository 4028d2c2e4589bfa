//! CLI argument parsing
//!
//! Two surfaces: [`CaptureArgs`] is the flag set embedding hosts parse to
//! build a [`CaptureConfig`], and [`Cli`] drives the snapshot inspector
//! binary.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{CaptureConfig, DEFAULT_MIN_OBJECT_SIZE, DEFAULT_OUTPUT_DIR};

/// Capture flags for embedding host programs
#[derive(Parser, Debug)]
#[command(name = "recuerdo-capture")]
#[command(about = "Runtime state capture options", long_about = None)]
pub struct CaptureArgs {
    /// Minimum size of object to capture, in bytes. Pass 0 to capture all
    /// objects, and -1 to capture only tracked objects.
    #[arg(
        short = 'z',
        long = "min-obj-size",
        value_name = "BYTES",
        default_value_t = DEFAULT_MIN_OBJECT_SIZE,
        allow_hyphen_values = true
    )]
    pub min_obj_size: i64,

    /// Directory to place snapshots in
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Frequency of captures in ms. Pass 0 to capture on every observed
    /// line, and -1 to capture only when explicitly requested.
    #[arg(
        short = 'f',
        long = "frequency",
        value_name = "MS",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub frequency: i64,

    /// Repeat to increase verbosity
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CaptureArgs {
    /// Build the capture configuration for the given tracee
    pub fn into_config(self, tracee_path: impl Into<String>) -> CaptureConfig {
        CaptureConfig::new(tracee_path)
            .with_min_object_size(self.min_obj_size)
            .with_output_directory(self.output_dir)
            .with_frequency_ms(self.frequency)
            .with_verbosity(self.verbose)
    }
}

/// Output format for the snapshot inspector
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Arguments for the snapshot inspector binary
#[derive(Parser, Debug)]
#[command(name = "recuerdo")]
#[command(version)]
#[command(about = "Inspect recuerdo snapshot files", long_about = None)]
pub struct Cli {
    /// Snapshot file to inspect
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable internal debug tracing
    #[arg(long = "debug")]
    pub debug: bool,
}
