//! State transfer
//!
//! Everything that has to cross a process or network boundary byte-for-byte
//! goes through a [`StateBuffer`], written and read by [`SyncData`]
//! implementations in a fixed field order.

pub mod buffer;
pub mod data;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use buffer::{FrameMark, StateBuffer};
pub use data::{Description, SimContext, SyncData};

/// Stable entity identifier. Survives export/import; nothing else does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies an entity's concrete type inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeTag(pub u16);

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
