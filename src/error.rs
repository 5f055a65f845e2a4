//! Error types for state transfer and configuration
//!
//! Fixed-point domain faults live in `fixed` and are not errors in this
//! sense: they resolve to a sentinel and the step continues.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::StateChecksum;
use crate::sync::TypeTag;

/// Faults that abort an in-progress export, import or rollback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("buffer underrun: wanted {wanted} bytes, {remaining} remaining")]
    BufferUnderrun { wanted: usize, remaining: usize },
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("bad snapshot magic {0:#010x}")]
    BadMagic(u32),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("unknown entity type tag {0}")]
    UnknownTypeTag(TypeTag),
    #[error("type tag {0} registered twice")]
    DuplicateTypeTag(TypeTag),
    #[error("entity {id} payload length {declared} but {consumed} bytes were read")]
    FrameLength {
        id: u32,
        declared: usize,
        consumed: usize,
    },
    #[error("entity payload of {0} bytes exceeds the frame limit")]
    PayloadTooLarge(usize),
    #[error("entity id {id} out of order after {previous}")]
    EntityOrder { id: u32, previous: u32 },
    #[error("{0} trailing bytes after the last entity")]
    TrailingBytes(usize),
    #[error("no entity with id {0}")]
    UnknownEntity(u32),
    #[error("no snapshot recorded for frame {0}")]
    MissingSnapshot(u64),
    #[error("next entity id {next_id} does not follow the last entity id {last}")]
    InconsistentNextId { next_id: u32, last: u32 },
    #[error("entity id {0} is already in use")]
    EntityExists(u32),
    #[error("entity ids exhausted")]
    IdsExhausted,
    #[error("frame {0} cannot be advanced")]
    FrameOutOfRange(u64),
    #[error("length {0} does not fit a u32 prefix")]
    LengthOverflow(usize),
}

/// Local and remote checksums disagree for the same frame. Surfaced to the
/// host; resync policy is its call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("desync at frame {frame}: local {local}, remote {remote}")]
pub struct DesyncDetected {
    pub frame: u64,
    pub local: StateChecksum,
    pub remote: StateChecksum,
}

/// Errors while loading session settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
