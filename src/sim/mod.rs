//! Deterministic simulation module
//!
//! All simulated logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Fixed-point math only, never floats
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - State changes only inside a step or a snapshot import

pub mod agent;
pub mod body;
pub mod engine;
pub mod entity;
pub mod input;
pub mod observer;
pub mod rng;
pub mod snapshot;
pub mod state;

pub use agent::{Agent, PeerId};
pub use body::{MOVER_TAG, Mover, ORBITER_TAG, Orbiter};
pub use engine::{Engine, EnginePhase, EngineView, StepReport};
pub use entity::{Entity, EntityFactory, EntityRegistry, StepContext};
pub use input::{Command, InputLog, SpawnRequest, TickInput};
pub use observer::{ChecksumLog, DesyncDetector, LogObserver, Observer};
pub use rng::RngState;
pub use snapshot::{SnapshotHistory, StateChecksum};
pub use state::Game;
