//! Simulation state
//!
//! All state that must be persisted for resync/determinism lives here:
//! - Entities keyed by stable id, iterated in ascending id order
//! - The shared seeded RNG
//! - The id allocator and the tick duration

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::entity::{Entity, EntityRegistry, StepContext};
use super::input::{SpawnRequest, TickInput};
use super::rng::RngState;
use crate::consts::MAX_ENTITY_PAYLOAD;
use crate::error::SyncError;
use crate::fixed::Fixed;
use crate::sync::{Description, EntityId, SimContext, StateBuffer, TypeTag};

/// Authoritative world state for one simulation instance
#[derive(Debug)]
pub struct Game {
    registry: Arc<EntityRegistry>,
    entities: BTreeMap<EntityId, Box<dyn Entity>>,
    rng: RngState,
    next_id: u32,
    tick: Fixed,
}

impl Game {
    pub fn new(registry: Arc<EntityRegistry>, seed: u64, tick: Fixed) -> Self {
        Self {
            registry,
            entities: BTreeMap::new(),
            rng: RngState::new(seed, 0),
            next_id: 1,
            tick,
        }
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn tick(&self) -> Fixed {
        self.tick
    }

    pub fn rng(&self) -> &RngState {
        &self.rng
    }

    /// Id the next spawn will receive
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> {
        self.entities
            .iter()
            .map(|(id, entity)| (*id, entity.as_ref()))
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(&id).map(|entity| entity.as_ref())
    }

    /// Borrow an entity as its concrete type
    pub fn get_as<T: Any>(&self, id: EntityId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Add an entity during session setup, before the first step
    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> Result<EntityId, SyncError> {
        self.insert(entity, 0)
    }

    /// Remove an entity during session setup
    pub fn despawn(&mut self, id: EntityId) -> Result<Box<dyn Entity>, SyncError> {
        self.entities
            .remove(&id)
            .ok_or(SyncError::UnknownEntity(id.0))
    }

    fn insert(&mut self, mut entity: Box<dyn Entity>, frame: u64) -> Result<EntityId, SyncError> {
        let tag = entity.type_tag();
        if !self.registry.contains(tag) {
            return Err(SyncError::UnknownTypeTag(tag));
        }
        let (id, next) = self.allocate()?;
        entity.initialize(&self.context(id, frame));
        self.entities.insert(id, entity);
        self.next_id = next;
        Ok(id)
    }

    /// The id the next spawn receives, and the allocator value after it
    fn allocate(&self) -> Result<(EntityId, u32), SyncError> {
        let id = EntityId(self.next_id);
        let next = self.next_id.checked_add(1).ok_or(SyncError::IdsExhausted)?;
        if self.entities.contains_key(&id) {
            return Err(SyncError::EntityExists(id.0));
        }
        Ok((id, next))
    }

    fn context(&self, id: EntityId, frame: u64) -> SimContext {
        SimContext {
            id,
            frame,
            tick: self.tick,
        }
    }

    /// Build an entity from a spawn request without touching live state
    fn instantiate(
        &self,
        request: &SpawnRequest,
        id: EntityId,
        frame: u64,
    ) -> Result<Box<dyn Entity>, SyncError> {
        build_entity(
            &self.registry,
            request.tag,
            &request.payload,
            &self.context(id, frame),
        )
    }

    /// Apply one tick of `input` and step every entity
    pub(crate) fn advance(&mut self, input: &TickInput, frame: u64) {
        for id in &input.despawns {
            match self.entities.remove(id) {
                Some(_) => log::debug!("frame {frame}: despawned {id}"),
                None => log::warn!("frame {frame}: despawn of unknown entity {id} ignored"),
            }
        }

        for request in &input.spawns {
            let spawned = self.allocate().and_then(|(id, next)| {
                let entity = self.instantiate(request, id, frame)?;
                Ok((id, next, entity))
            });
            match spawned {
                Ok((id, next, entity)) => {
                    self.entities.insert(id, entity);
                    self.next_id = next;
                    log::debug!("frame {frame}: spawned {id} ({})", request.tag);
                }
                Err(err) => {
                    log::warn!("frame {frame}: skipped spawn of {}: {err}", request.tag);
                }
            }
        }

        let tick = self.tick;
        for (id, entity) in self.entities.iter_mut() {
            let mut cx = StepContext::new(*id, frame, tick, input.command(*id), &mut self.rng);
            entity.step(&mut cx);
        }
    }

    /// Write the whole state after the snapshot header
    pub fn export_into(&self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
        buffer.write_fixed(self.tick);
        self.rng.export(buffer);
        buffer.write_u32(self.next_id);
        buffer.write_len(self.entities.len())?;
        for (id, entity) in &self.entities {
            buffer.write_u32(id.0);
            buffer.write_u16(entity.type_tag().0);
            let mark = buffer.begin_frame();
            entity.export(buffer);
            buffer.end_frame(mark)?;
        }
        Ok(())
    }

    /// Decode a complete state written by [`export_into`](Self::export_into).
    /// Nothing live is touched; the caller swaps the result in on success.
    pub fn import_from(
        registry: Arc<EntityRegistry>,
        buffer: &mut StateBuffer,
        frame: u64,
    ) -> Result<Game, SyncError> {
        let tick = buffer.read_fixed()?;
        let rng = RngState::import(buffer)?;
        let next_id = buffer.read_u32()?;
        let count = buffer.read_u32()?;

        let mut entities = BTreeMap::new();
        let mut previous: Option<u32> = None;
        for _ in 0..count {
            let id = buffer.read_u32()?;
            if let Some(previous) = previous.filter(|&previous| id <= previous) {
                return Err(SyncError::EntityOrder { id, previous });
            }
            previous = Some(id);

            let tag = TypeTag(buffer.read_u16()?);
            let declared = buffer.read_u32()? as usize;
            if declared > MAX_ENTITY_PAYLOAD {
                return Err(SyncError::PayloadTooLarge(declared));
            }
            let payload = buffer.read_raw(declared)?;
            let context = SimContext {
                id: EntityId(id),
                frame,
                tick,
            };
            let entity = build_entity(&registry, tag, payload, &context)?;
            entities.insert(EntityId(id), entity);
        }
        // Spawns must never land on a live id
        if let Some(last) = previous.filter(|&last| next_id <= last) {
            return Err(SyncError::InconsistentNextId { next_id, last });
        }

        Ok(Game {
            registry,
            entities,
            rng,
            next_id,
            tick,
        })
    }

    /// Aggregate every entity's description under `entity.{id}.` keys
    pub fn describe(&self) -> Description {
        let mut out = Description::new();
        out.insert("game.entities".into(), self.entities.len().to_string());
        out.insert("game.next_id".into(), self.next_id.to_string());
        out.insert("game.rng_draws".into(), self.rng.draws().to_string());
        out.insert("game.tick".into(), self.tick.to_string());
        for (id, entity) in &self.entities {
            let tag = entity.type_tag();
            let kind = self.registry.name(tag).unwrap_or("unregistered");
            out.insert(format!("entity.{}.type", id.0), kind.to_string());
            for (key, value) in entity.describe() {
                out.insert(format!("entity.{}.{key}", id.0), value);
            }
        }
        out
    }
}

/// Create, bind and import one entity; the payload must be consumed exactly
fn build_entity(
    registry: &EntityRegistry,
    tag: TypeTag,
    payload: &[u8],
    context: &SimContext,
) -> Result<Box<dyn Entity>, SyncError> {
    let mut entity = registry.create(tag)?;
    entity.initialize(context);
    let mut frame = StateBuffer::from_bytes(payload.to_vec());
    entity.import(&mut frame)?;
    if frame.remaining() != 0 {
        return Err(SyncError::FrameLength {
            id: context.id.0,
            declared: payload.len(),
            consumed: frame.read_pos(),
        });
    }
    Ok(entity)
}
