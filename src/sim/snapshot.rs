//! Whole-state snapshots
//!
//! A snapshot is a versioned header followed by the [`Game`] encoding:
//!
//! ```text
//! magic u32 | version u16 | frame u64 | game state
//! ```
//!
//! Decoding is all-or-nothing: a fresh [`Game`] is built and returned only
//! when every byte has been accounted for.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::entity::EntityRegistry;
use super::state::Game;
use crate::consts::{FORMAT_VERSION, SNAPSHOT_MAGIC};
use crate::error::SyncError;
use crate::sync::StateBuffer;

pub fn encode(frame: u64, game: &Game) -> Result<StateBuffer, SyncError> {
    let mut buffer = StateBuffer::with_capacity(64 + game.len() * 64);
    buffer.write_u32(SNAPSHOT_MAGIC);
    buffer.write_u16(FORMAT_VERSION);
    buffer.write_u64(frame);
    game.export_into(&mut buffer)?;
    Ok(buffer)
}

/// Decode a snapshot into its frame number and a fresh state
pub fn decode(
    registry: &Arc<EntityRegistry>,
    buffer: &mut StateBuffer,
) -> Result<(u64, Game), SyncError> {
    let magic = buffer.read_u32()?;
    if magic != SNAPSHOT_MAGIC {
        return Err(SyncError::BadMagic(magic));
    }
    let version = buffer.read_u16()?;
    if version != FORMAT_VERSION {
        return Err(SyncError::UnsupportedVersion {
            found: version,
            expected: FORMAT_VERSION,
        });
    }
    let frame = buffer.read_u64()?;
    if frame == u64::MAX {
        return Err(SyncError::FrameOutOfRange(frame));
    }
    let game = Game::import_from(Arc::clone(registry), buffer, frame)?;
    if buffer.remaining() != 0 {
        return Err(SyncError::TrailingBytes(buffer.remaining()));
    }
    Ok((frame, game))
}

/// BLAKE3 digest of an exported snapshot
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChecksum(pub [u8; 32]);

impl StateChecksum {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for StateChecksum {
    /// First eight bytes, which is plenty to tell frames apart in logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateChecksum({self})")
    }
}

/// Bounded ring of exported snapshots, oldest first
#[derive(Debug, Clone, Default)]
pub struct SnapshotHistory {
    capacity: usize,
    entries: VecDeque<(u64, Vec<u8>)>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a snapshot; anything at or after `frame` is replaced
    pub fn push(&mut self, frame: u64, bytes: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        self.entries.retain(|(recorded, _)| *recorded < frame);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((frame, bytes));
    }

    pub fn get(&self, frame: u64) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(recorded, _)| *recorded == frame)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Drop every snapshot newer than `frame`
    pub fn truncate_after(&mut self, frame: u64) {
        self.entries.retain(|(recorded, _)| *recorded <= frame);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn oldest(&self) -> Option<u64> {
        self.entries.front().map(|(frame, _)| *frame)
    }

    pub fn newest(&self) -> Option<u64> {
        self.entries.back().map(|(frame, _)| *frame)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
