//! Simulated entities and the type-tag registry
//!
//! - Every entity is a [`SyncData`] object that can also advance itself by
//!   one tick
//! - Snapshots store a [`TypeTag`] per entity; the registry maps it back to
//!   a constructor on import
//! - Tags are fixed at registration time and must match across peers

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use super::body::{MOVER_TAG, Mover, ORBITER_TAG, Orbiter};
use super::input::Command;
use super::rng::RngState;
use crate::error::SyncError;
use crate::fixed::Fixed;
use crate::sync::{EntityId, SyncData, TypeTag};

/// Everything an entity may read or draw from while stepping
pub struct StepContext<'a> {
    pub id: EntityId,
    /// Frame being computed (the engine's counter before increment)
    pub frame: u64,
    /// Fixed tick duration in seconds
    pub tick: Fixed,
    /// Command addressed to this entity for this frame
    pub command: Option<&'a Command>,
    rng: &'a mut RngState,
}

impl<'a> StepContext<'a> {
    pub fn new(
        id: EntityId,
        frame: u64,
        tick: Fixed,
        command: Option<&'a Command>,
        rng: &'a mut RngState,
    ) -> Self {
        Self {
            id,
            frame,
            tick,
            command,
            rng,
        }
    }

    /// The state's shared RNG. Draw order is entity order, so every peer
    /// sees the same values.
    pub fn rng(&mut self) -> &mut RngState {
        self.rng
    }
}

pub trait Entity: SyncData + Send + fmt::Debug {
    fn type_tag(&self) -> TypeTag;

    /// Advance by exactly one tick
    fn step(&mut self, cx: &mut StepContext<'_>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builds an unbound, default entity of one concrete type
pub type EntityFactory = fn() -> Box<dyn Entity>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    name: &'static str,
    factory: EntityFactory,
}

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entries: BTreeMap<TypeTag, Registration>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the entity kinds this crate ships
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.entries.insert(
            MOVER_TAG,
            Registration {
                name: "mover",
                factory: || -> Box<dyn Entity> { Box::new(Mover::default()) },
            },
        );
        registry.entries.insert(
            ORBITER_TAG,
            Registration {
                name: "orbiter",
                factory: || -> Box<dyn Entity> { Box::new(Orbiter::default()) },
            },
        );
        registry
    }

    pub fn register(
        &mut self,
        tag: TypeTag,
        name: &'static str,
        factory: EntityFactory,
    ) -> Result<(), SyncError> {
        if self.entries.contains_key(&tag) {
            return Err(SyncError::DuplicateTypeTag(tag));
        }
        log::debug!("registered entity type {name} as {tag}");
        self.entries.insert(tag, Registration { name, factory });
        Ok(())
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn name(&self, tag: TypeTag) -> Option<&'static str> {
        self.entries.get(&tag).map(|entry| entry.name)
    }

    pub fn create(&self, tag: TypeTag) -> Result<Box<dyn Entity>, SyncError> {
        self.entries
            .get(&tag)
            .map(|entry| (entry.factory)())
            .ok_or(SyncError::UnknownTypeTag(tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        let registry = EntityRegistry::with_builtin();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(MOVER_TAG), Some("mover"));
        assert_eq!(registry.name(ORBITER_TAG), Some("orbiter"));

        let entity = registry.create(ORBITER_TAG).unwrap();
        assert_eq!(entity.type_tag(), ORBITER_TAG);
        assert!(entity.as_any().downcast_ref::<Orbiter>().is_some());
    }

    #[test]
    fn test_unknown_tag() {
        let registry = EntityRegistry::with_builtin();
        let tag = TypeTag(0xFFFF);
        assert!(!registry.contains(tag));
        assert_eq!(
            registry.create(tag).err(),
            Some(SyncError::UnknownTypeTag(tag))
        );
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = EntityRegistry::with_builtin();
        let result = registry.register(MOVER_TAG, "again", || -> Box<dyn Entity> {
            Box::new(Mover::default())
        });
        assert_eq!(result, Err(SyncError::DuplicateTypeTag(MOVER_TAG)));
        assert_eq!(registry.name(MOVER_TAG), Some("mover"));
    }

    #[test]
    fn test_step_context_rng() {
        let mut rng = RngState::new(1, 0);
        let mut cx = StepContext::new(EntityId(3), 10, Fixed::ONE, None, &mut rng);
        cx.rng().next_u32();
        cx.rng().next_u32();
        assert_eq!(rng.draws(), 2);
    }
}
