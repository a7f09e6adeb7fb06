//! Power-up pickups and their timed effects

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::blob::BlobId;
use super::particle::{Particle, ParticleKind};
use super::state::World;
use crate::consts::{SCATTER, TIMER_PRIORITY};
use crate::error::Result;
use crate::schedule::{Agent, Schedule};

/// Pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Explosions deal no damage to the blob
    Invulnerable,
    /// Double top speed and steering acceleration
    Nitro,
    /// Adds a handful of particles around the anchor
    Boost,
    /// Tighter, stiffer blob
    Glue,
    /// Restores every member to full radius
    Heal,
}

impl PickupKind {
    pub const ALL: [PickupKind; 5] = [
        PickupKind::Invulnerable,
        PickupKind::Nitro,
        PickupKind::Boost,
        PickupKind::Glue,
        PickupKind::Heal,
    ];

    /// Get the color for this pickup type (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            PickupKind::Invulnerable => 0xFFFFFF,
            PickupKind::Nitro => 0xFF8800,
            PickupKind::Boost => 0xFF00FF,
            PickupKind::Glue => 0x8B4513,
            PickupKind::Heal => 0xFF3366,
        }
    }

    /// Whether the effect wears off after a while
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            PickupKind::Invulnerable | PickupKind::Nitro | PickupKind::Glue
        )
    }
}

/// Kills a pickup that nobody absorbed in time
pub struct PickupExpiry {
    pub uid: u32,
}

impl Agent<World> for PickupExpiry {
    fn go(
        self: Box<Self>,
        world: &mut World,
        _schedule: &mut Schedule<World>,
        _tick: i64,
        _priority: usize,
    ) -> Result<()> {
        let Some(index) = world.find_particle_by_uid(self.uid) else {
            return Ok(());
        };
        let p = &mut world.particles[index];
        if p.is_pickup() && p.blob.is_neutral() {
            log::debug!("Pickup {} expired", self.uid);
            p.kill();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Apply,
    Revert,
}

/// Applies a pickup's effect to a blob and, for timed effects, reverts it later
pub struct EffectAgent {
    pub blob: BlobId,
    pub kind: PickupKind,
    phase: Phase,
}

impl EffectAgent {
    pub fn new(blob: BlobId, kind: PickupKind) -> Self {
        Self {
            blob,
            kind,
            phase: Phase::Apply,
        }
    }
}

impl Agent<World> for EffectAgent {
    fn go(
        mut self: Box<Self>,
        world: &mut World,
        schedule: &mut Schedule<World>,
        _tick: i64,
        _priority: usize,
    ) -> Result<()> {
        // The blob may have been eliminated while the effect was pending
        if world.blob(self.blob).is_none_or(|b| b.is_dead()) {
            return Ok(());
        }

        match self.phase {
            Phase::Apply => {
                apply(world, self.blob, self.kind)?;
                if self.kind.is_timed() {
                    self.phase = Phase::Revert;
                    let ticks = world.config.effect_ticks;
                    schedule.schedule_in(ticks, TIMER_PRIORITY, self)?;
                }
            }
            Phase::Revert => revert(world, self.blob, self.kind)?,
        }
        Ok(())
    }
}

fn apply(world: &mut World, id: BlobId, kind: PickupKind) -> Result<()> {
    log::debug!("Blob {} picked up {:?}", id, kind);
    match kind {
        PickupKind::Invulnerable => {
            world.blob_mut(id)?.effects.invulnerable += 1;
        }
        PickupKind::Nitro => {
            let blob = world.blob_mut(id)?;
            blob.effects.nitro += 1;
            blob.params.max_speed *= 2.0;
            blob.params.accel *= 2.0;
        }
        PickupKind::Glue => {
            let blob = world.blob_mut(id)?;
            blob.effects.glue += 1;
            blob.params.pull_distance *= 0.5;
            blob.params.stiffness *= 2.0;
        }
        PickupKind::Boost => {
            let blob = world.blob_mut(id)?;
            let Some(anchor) = blob.anchor() else {
                return Ok(());
            };
            let (color, max_radius) = (blob.color, blob.params.max_radius);
            let center = world.particles[anchor].pos;
            for _ in 0..world.config.boost_particles {
                let offset = Vec2::new(
                    world.rng().random_range(-SCATTER..SCATTER),
                    world.rng().random_range(-SCATTER..SCATTER),
                );
                let mut p = Particle::new(center + offset, max_radius, id);
                p.color = color;
                world.add_particle(p)?;
            }
        }
        PickupKind::Heal => {
            let members = world.blob_mut(id)?.members().to_vec();
            for i in members {
                let p = &mut world.particles[i];
                p.set_radius(p.max_radius);
            }
        }
    }
    Ok(())
}

fn revert(world: &mut World, id: BlobId, kind: PickupKind) -> Result<()> {
    let blob = world.blob_mut(id)?;
    match kind {
        PickupKind::Invulnerable => {
            blob.effects.invulnerable = blob.effects.invulnerable.saturating_sub(1);
        }
        PickupKind::Nitro => {
            blob.effects.nitro = blob.effects.nitro.saturating_sub(1);
            blob.params.max_speed *= 0.5;
            blob.params.accel *= 0.5;
        }
        PickupKind::Glue => {
            blob.effects.glue = blob.effects.glue.saturating_sub(1);
            blob.params.pull_distance *= 2.0;
            blob.params.stiffness *= 0.5;
        }
        PickupKind::Boost | PickupKind::Heal => {}
    }
    log::debug!("Blob {} lost {:?}", id, kind);
    Ok(())
}

/// Consume every pickup now owned by a player blob, scheduling its effect
///
/// Returns the number of pickups consumed.
pub fn consume_pickups(world: &mut World, schedule: &mut Schedule<World>) -> Result<usize> {
    let mut consumed = Vec::new();
    for p in world.particles.iter_mut() {
        if let ParticleKind::Pickup(kind) = p.kind
            && !p.blob.is_neutral()
            && !p.is_dead()
        {
            p.kind = ParticleKind::Plain;
            p.kill();
            consumed.push((p.blob, kind));
        }
    }

    for &(id, kind) in &consumed {
        world.blob_mut(id)?.score.pickups += 1;
        schedule.schedule(TIMER_PRIORITY, Box::new(EffectAgent::new(id, kind)))?;
    }
    Ok(consumed.len())
}
