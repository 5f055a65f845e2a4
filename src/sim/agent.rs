//! Local participant handle

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::input::{Command, TickInput};
use super::state::Game;
use crate::sync::{Description, EntityId};

/// Session-unique peer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// This peer's identity and the entity it drives. Not part of the
/// simulated state: two peers with different agents still agree on every
/// exported byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    peer: PeerId,
    name: String,
    controlled: Option<EntityId>,
}

impl Agent {
    pub fn new(peer: PeerId, name: impl Into<String>) -> Self {
        Self {
            peer,
            name: name.into(),
            controlled: None,
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controlled(&self) -> Option<EntityId> {
        self.controlled
    }

    pub fn control(&mut self, id: EntityId) {
        self.controlled = Some(id);
    }

    pub fn release(&mut self) {
        self.controlled = None;
    }

    /// The controlled entity, if it is still alive in `game`
    pub fn view<'g>(&self, game: &'g Game) -> Option<&'g dyn Entity> {
        game.get(self.controlled?)
    }

    /// Address `command` to the controlled entity. No-op without one.
    pub fn submit(&self, input: &mut TickInput, command: Command) {
        if let Some(id) = self.controlled {
            input.commands.insert(id, command);
        }
    }

    pub fn describe(&self) -> Description {
        let mut out = Description::new();
        out.insert("agent.peer".into(), self.peer.to_string());
        out.insert("agent.name".into(), self.name.clone());
        let controlled = self
            .controlled
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        out.insert("agent.controlled".into(), controlled);
        out
    }
}
