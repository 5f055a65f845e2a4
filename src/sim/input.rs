//! Per-tick input records
//!
//! A [`TickInput`] is everything that may change the state during one step
//! besides the entities' own logic: commands for controlled entities, plus
//! spawn and despawn requests. The external driver delivers the same record
//! to every peer for a given frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use crate::error::SyncError;
use crate::fixed::FixedVec2;
use crate::sync::{EntityId, StateBuffer, TypeTag};

/// Control record for one entity for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Steering axis, each component in `[-1, 1]` by convention
    pub axis: FixedVec2,
    /// Button bitmask
    pub buttons: u32,
}

impl Command {
    pub const BOOST: u32 = 1 << 0;

    pub fn new(axis: FixedVec2, buttons: u32) -> Self {
        Self { axis, buttons }
    }

    pub fn pressed(&self, button: u32) -> bool {
        self.buttons & button != 0
    }

    fn encode(&self, buffer: &mut StateBuffer) {
        buffer.write_vec2(self.axis);
        buffer.write_u32(self.buttons);
    }

    fn decode(buffer: &mut StateBuffer) -> Result<Self, SyncError> {
        let axis = buffer.read_vec2()?;
        let buttons = buffer.read_u32()?;
        Ok(Self { axis, buttons })
    }
}

/// Create an entity of `tag` from a payload in its export format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub tag: TypeTag,
    pub payload: Vec<u8>,
}

impl SpawnRequest {
    /// Spawn a copy of `entity` as it is now
    pub fn of(entity: &dyn Entity) -> Self {
        let mut buffer = StateBuffer::new();
        entity.export(&mut buffer);
        Self {
            tag: entity.type_tag(),
            payload: buffer.into_bytes(),
        }
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    pub commands: BTreeMap<EntityId, Command>,
    /// Applied before spawns, in order
    pub despawns: Vec<EntityId>,
    /// Applied after despawns, in order; ids are allocated as they land
    pub spawns: Vec<SpawnRequest>,
}

impl TickInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, id: EntityId, command: Command) -> Self {
        self.commands.insert(id, command);
        self
    }

    pub fn with_spawn(mut self, request: SpawnRequest) -> Self {
        self.spawns.push(request);
        self
    }

    pub fn with_despawn(mut self, id: EntityId) -> Self {
        self.despawns.push(id);
        self
    }

    pub fn command(&self, id: EntityId) -> Option<&Command> {
        self.commands.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.despawns.is_empty() && self.spawns.is_empty()
    }

    pub fn encode(&self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
        buffer.write_len(self.commands.len())?;
        for (id, command) in &self.commands {
            buffer.write_u32(id.0);
            command.encode(buffer);
        }
        buffer.write_len(self.despawns.len())?;
        for id in &self.despawns {
            buffer.write_u32(id.0);
        }
        buffer.write_len(self.spawns.len())?;
        for spawn in &self.spawns {
            buffer.write_u16(spawn.tag.0);
            buffer.write_bytes(&spawn.payload)?;
        }
        Ok(())
    }

    pub fn decode(buffer: &mut StateBuffer) -> Result<Self, SyncError> {
        let mut input = TickInput::new();

        let count = buffer.read_u32()?;
        let mut previous: Option<u32> = None;
        for _ in 0..count {
            let id = buffer.read_u32()?;
            if let Some(previous) = previous.filter(|&previous| id <= previous) {
                return Err(SyncError::EntityOrder { id, previous });
            }
            previous = Some(id);
            input.commands.insert(EntityId(id), Command::decode(buffer)?);
        }

        let count = buffer.read_u32()?;
        for _ in 0..count {
            input.despawns.push(EntityId(buffer.read_u32()?));
        }

        let count = buffer.read_u32()?;
        for _ in 0..count {
            let tag = TypeTag(buffer.read_u16()?);
            let payload = buffer.read_bytes()?;
            input.spawns.push(SpawnRequest { tag, payload });
        }
        Ok(input)
    }
}

/// Recorded input stream, replayable from any starting snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLog {
    start_frame: u64,
    inputs: Vec<TickInput>,
}

impl InputLog {
    pub fn new(start_frame: u64) -> Self {
        Self {
            start_frame,
            inputs: Vec::new(),
        }
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// First frame not yet recorded
    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.inputs.len() as u64
    }

    pub fn push(&mut self, input: TickInput) {
        self.inputs.push(input);
    }

    pub fn get(&self, frame: u64) -> Option<&TickInput> {
        let index = frame.checked_sub(self.start_frame)?;
        self.inputs.get(usize::try_from(index).ok()?)
    }

    /// Inputs recorded from `frame` onward, in order
    pub fn since(&self, frame: u64) -> impl Iterator<Item = &TickInput> {
        let skip = frame.saturating_sub(self.start_frame);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        self.inputs.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn encode(&self) -> Result<StateBuffer, SyncError> {
        let mut buffer = StateBuffer::new();
        buffer.write_u64(self.start_frame);
        buffer.write_len(self.inputs.len())?;
        for input in &self.inputs {
            input.encode(&mut buffer)?;
        }
        Ok(buffer)
    }

    pub fn decode(buffer: &mut StateBuffer) -> Result<Self, SyncError> {
        let start_frame = buffer.read_u64()?;
        let count = buffer.read_u32()?;
        let mut log = InputLog::new(start_frame);
        for _ in 0..count {
            log.push(TickInput::decode(buffer)?);
        }
        if buffer.remaining() != 0 {
            return Err(SyncError::TrailingBytes(buffer.remaining()));
        }
        Ok(log)
    }
}
