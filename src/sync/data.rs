//! The SyncData contract
//!
//! Any simulation object that must survive serialization implements
//! [`SyncData`]. `export` and `import` are exact inverses: after
//! `import(export(s))` the object is indistinguishable from `s`, for any
//! number of cycles.

use std::collections::BTreeMap;

use super::{EntityId, StateBuffer};
use crate::error::SyncError;
use crate::fixed::Fixed;

/// Diagnostic key/value snapshot. Never used for reconstruction.
pub type Description = BTreeMap<String, String>;

/// What an object learns about its owning simulation when it is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimContext {
    /// Identifier assigned by the owning state
    pub id: EntityId,
    /// Frame at which the object was bound
    pub frame: u64,
    /// Duration of one tick, in seconds
    pub tick: Fixed,
}

pub trait SyncData {
    /// Bind to the owning simulation. Called once before the first
    /// export or import; a fresh object is created for every import of a
    /// whole state, so it is never re-bound without a teardown in between.
    fn initialize(&mut self, context: &SimContext);

    /// Write the full reconstructable state in a fixed field order
    fn export(&self, buffer: &mut StateBuffer);

    /// Read fields in the order `export` wrote them and overwrite live state
    fn import(&mut self, buffer: &mut StateBuffer) -> Result<(), SyncError>;

    /// Human-readable fields for logging and telemetry
    fn describe(&self) -> Description {
        Description::new()
    }
}
