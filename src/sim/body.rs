//! Concrete entity kinds
//!
//! - [`Mover`]: integrates a velocity given in units per tick; a command
//!   replaces the velocity with its steering axis
//! - [`Orbiter`]: circles a center point; boosting kicks its angular speed
//!   by a random amount drawn from the shared RNG

use std::any::Any;

use super::entity::{Entity, StepContext};
use super::input::Command;
use crate::error::SyncError;
use crate::fixed::{Fixed, FixedVec2};
use crate::sync::{Description, EntityId, SimContext, StateBuffer, SyncData, TypeTag};

pub const MOVER_TAG: TypeTag = TypeTag(0x0101);
pub const ORBITER_TAG: TypeTag = TypeTag(0x0102);

/// Default speed cap for movers, units per tick
pub const MOVER_MAX_SPEED: Fixed = Fixed::from_int(8);

/// Ticks of radial wobble after an orbiter boost
pub const ORBITER_WOBBLE_TICKS: u32 = 30;

/// Orbiters drift their angular speed once per this many frames
pub const ORBITER_DRIFT_PERIOD: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mover {
    id: EntityId,
    pub position: FixedVec2,
    /// Units per tick
    pub velocity: FixedVec2,
    pub max_speed: Fixed,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new(FixedVec2::ZERO, FixedVec2::ZERO)
    }
}

impl Mover {
    pub fn new(position: FixedVec2, velocity: FixedVec2) -> Self {
        Self {
            id: EntityId::default(),
            position,
            velocity,
            max_speed: MOVER_MAX_SPEED,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

impl SyncData for Mover {
    fn initialize(&mut self, context: &SimContext) {
        self.id = context.id;
    }

    fn export(&self, buffer: &mut StateBuffer) {
        buffer.write_vec2(self.position);
        buffer.write_vec2(self.velocity);
        buffer.write_fixed(self.max_speed);
    }

    fn import(&mut self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
        self.position = buffer.read_vec2()?;
        self.velocity = buffer.read_vec2()?;
        self.max_speed = buffer.read_fixed()?;
        Ok(())
    }

    fn describe(&self) -> Description {
        let mut out = Description::new();
        out.insert("position".into(), self.position.to_string());
        out.insert("velocity".into(), self.velocity.to_string());
        out
    }
}

impl Entity for Mover {
    fn type_tag(&self) -> TypeTag {
        MOVER_TAG
    }

    fn step(&mut self, cx: &mut StepContext<'_>) {
        if let Some(command) = cx.command {
            self.velocity = command.axis.clamp_length(self.max_speed);
        }
        self.position += self.velocity;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orbiter {
    id: EntityId,
    pub center: FixedVec2,
    pub radius: Fixed,
    /// Radians, kept in `[-PI, PI)`
    pub angle: Fixed,
    /// Radians per second
    pub angular_speed: Fixed,
    pub wobble_ticks: u32,
    /// Derived from the fields above at the end of every step
    pub position: FixedVec2,
}

impl Default for Orbiter {
    fn default() -> Self {
        Self::new(FixedVec2::ZERO, Fixed::from_int(10), Fixed::ONE)
    }
}

impl Orbiter {
    pub fn new(center: FixedVec2, radius: Fixed, angular_speed: Fixed) -> Self {
        Self {
            id: EntityId::default(),
            center,
            radius,
            angle: Fixed::ZERO,
            angular_speed,
            wobble_ticks: 0,
            position: center + FixedVec2::X * radius,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    fn current_radius(&self) -> Fixed {
        if self.wobble_ticks == 0 {
            return self.radius;
        }
        let phase = self.angle * Fixed::from_int(4);
        self.radius + self.radius * phase.sin() / Fixed::from_int(16)
    }
}

impl SyncData for Orbiter {
    fn initialize(&mut self, context: &SimContext) {
        self.id = context.id;
    }

    fn export(&self, buffer: &mut StateBuffer) {
        buffer.write_vec2(self.center);
        buffer.write_fixed(self.radius);
        buffer.write_fixed(self.angle);
        buffer.write_fixed(self.angular_speed);
        buffer.write_u32(self.wobble_ticks);
        buffer.write_vec2(self.position);
    }

    fn import(&mut self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
        self.center = buffer.read_vec2()?;
        self.radius = buffer.read_fixed()?;
        self.angle = buffer.read_fixed()?;
        self.angular_speed = buffer.read_fixed()?;
        self.wobble_ticks = buffer.read_u32()?;
        self.position = buffer.read_vec2()?;
        Ok(())
    }

    fn describe(&self) -> Description {
        let mut out = Description::new();
        out.insert("position".into(), self.position.to_string());
        out.insert("angle".into(), self.angle.to_string());
        out.insert("angular_speed".into(), self.angular_speed.to_string());
        if self.wobble_ticks > 0 {
            out.insert("wobble_ticks".into(), self.wobble_ticks.to_string());
        }
        out
    }
}

impl Entity for Orbiter {
    fn type_tag(&self) -> TypeTag {
        ORBITER_TAG
    }

    fn step(&mut self, cx: &mut StepContext<'_>) {
        let boost = cx.command.is_some_and(|command| command.pressed(Command::BOOST));
        if boost {
            let kick = cx.rng().range(-Fixed::ONE, Fixed::ONE);
            self.angular_speed += kick;
            self.wobble_ticks = ORBITER_WOBBLE_TICKS;
        }
        if let Some(command) = cx.command {
            // Radial steering, clamped so the orbit never inverts
            self.radius = (self.radius + command.axis.y * cx.tick).max(Fixed::ZERO);
        }
        if cx.frame % ORBITER_DRIFT_PERIOD == 0 {
            let eps = Fixed::from_ratio(1, 64);
            self.angular_speed += cx.rng().range(-eps, eps);
        }

        self.angle = (self.angle + self.angular_speed * cx.tick).wrap_angle();
        self.position = self.center + FixedVec2::from_angle(self.angle) * self.current_radius();
        self.wobble_ticks = self.wobble_ticks.saturating_sub(1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
