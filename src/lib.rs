//! Frame Sync - deterministic lockstep simulation core
//!
//! Core modules:
//! - `fixed`: Fixed-point numbers and integer-only transcendental functions
//! - `sync`: State buffers, entity ids and the SyncData contract
//! - `sim`: Entities, simulation state, snapshots, the step driver and observers
//! - `settings`: Session configuration
//! - `error`: Error taxonomy shared by the modules above

pub mod error;
pub mod fixed;
pub mod settings;
pub mod sim;
pub mod sync;

pub use error::{ConfigError, DesyncDetected, SyncError};
pub use fixed::{DomainFault, Fixed, FixedVec2};
pub use settings::Settings;
pub use sim::{Agent, Engine, Game, Observer, TickInput};
pub use sync::{StateBuffer, SyncData};

/// Session constants
pub mod consts {
    /// Snapshot magic ("FSYN")
    pub const SNAPSHOT_MAGIC: u32 = 0x4653_594E;
    /// Snapshot format version. Bump when the framing changes.
    pub const FORMAT_VERSION: u16 = 1;
    /// Default simulation rate (ticks per second)
    pub const DEFAULT_TICK_RATE: u32 = 60;
    /// Default number of snapshots kept for rollback
    pub const DEFAULT_HISTORY_CAPACITY: usize = 120;
    /// Default number of frame checksums kept for desync checks
    pub const DEFAULT_DESYNC_WINDOW: usize = 256;
    /// Upper bound on a single entity payload (bytes)
    pub const MAX_ENTITY_PAYLOAD: usize = 1 << 20;
}
