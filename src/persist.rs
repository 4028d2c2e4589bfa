//! Snapshot persistence
//!
//! One file per capture, named from the encoded tracee identity, the
//! snapshot label, the wall-clock timestamp, and a per-process sequence
//! number so that two captures within the same clock tick still get
//! distinct names. The envelope is MessagePack with field names, loadable
//! without the producing process.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scope::Payload;

/// File extension for snapshot files
pub const SNAPSHOT_EXT: &str = "snap";

/// On-disk envelope for one capture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Source identity of the traced file
    pub tracee: String,
    /// Line number or explicit name distinguishing this capture
    pub label: String,
    /// Wall-clock capture time, epoch milliseconds
    pub timestamp_ms: u64,
    /// Per-process capture sequence number
    pub sequence: u64,
    /// The captured name → value mapping
    pub payload: Payload,
}

/// URL-safe encoding of a path component for use inside a filename
///
/// Alphanumerics and `_ . - ~` pass through, a space becomes `+`, every
/// other byte becomes `%XX`. Total over arbitrary input.
pub fn encode_path_component(component: &str) -> String {
    let mut encoded = String::with_capacity(component.len());
    for byte in component.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' => {
                encoded.push(byte as char);
            }
            b' ' => encoded.push('+'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

/// Deterministic file name for one capture
pub fn snapshot_file_name(tracee: &str, label: &str, timestamp_ms: u64, sequence: u64) -> String {
    format!(
        "{}.{}@{timestamp_ms}-{sequence:06}.{SNAPSHOT_EXT}",
        encode_path_component(tracee),
        encode_path_component(label),
    )
}

/// Write `snapshot` into `dir`, returning the path of the new file
///
/// The directory is an install-time concern; a missing directory surfaces
/// here as an I/O error rather than being created per call.
pub fn save(dir: &Path, snapshot: &Snapshot) -> Result<PathBuf> {
    let name = snapshot_file_name(
        &snapshot.tracee,
        &snapshot.label,
        snapshot.timestamp_ms,
        snapshot.sequence,
    );
    let path = dir.join(name);
    let bytes = rmp_serde::to_vec_named(snapshot)?;
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Decode a snapshot envelope from raw bytes
pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Load a snapshot envelope back from disk
pub fn load(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}
