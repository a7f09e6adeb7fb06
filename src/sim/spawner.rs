//! Probabilistic spawning of free particles and pickups

use glam::Vec2;
use rand::Rng;

use super::blob::BlobId;
use super::particle::Particle;
use super::pickup::{PickupExpiry, PickupKind};
use super::state::World;
use crate::consts::TIMER_PRIORITY;
use crate::error::Result;
use crate::schedule::Schedule;
use crate::settings::SimConfig;

/// Per-tick Bernoulli spawner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawner {
    /// Chance per tick of a new neutral particle
    pub particle_chance: f64,
    /// Chance per tick of a new pickup
    pub pickup_chance: f64,
}

impl Spawner {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            particle_chance: config.per_tick_probability(config.particle_spawn_secs),
            pickup_chance: config.per_tick_probability(config.pickup_spawn_secs),
        }
    }

    /// Run both trials for this tick; returns how many particles were added
    pub fn run(&self, world: &mut World, schedule: &mut Schedule<World>) -> Result<usize> {
        let mut spawned = 0;

        if world.has_room() && world.rng().random_bool(self.particle_chance) {
            let radius = world.config.neutral_radius;
            let pos = random_position(world, radius);
            world.add_particle(Particle::new(pos, radius, BlobId::NEUTRAL))?;
            spawned += 1;
        }

        if world.has_room() && world.rng().random_bool(self.pickup_chance) {
            let radius = world.config.pickup_radius;
            let pos = random_position(world, radius);
            let kind = PickupKind::ALL[world.rng().random_range(0..PickupKind::ALL.len())];
            let index = world.add_particle(Particle::pickup(pos, radius, kind))?;
            let uid = world.particles()[index].uid;
            let ttl = world.config.pickup_ttl_ticks;
            schedule.schedule_in(ttl, TIMER_PRIORITY, Box::new(PickupExpiry { uid }))?;
            log::debug!("Spawned {:?} pickup at ({:.0}, {:.0})", kind, pos.x, pos.y);
            spawned += 1;
        }

        Ok(spawned)
    }
}

/// Uniform position inside the arena, inset so the clamp leaves it alone
fn random_position(world: &mut World, radius: f32) -> Vec2 {
    let inset = radius + world.config.clamp_margin;
    let max_x = (world.config.arena_width - inset).max(inset);
    let max_y = (world.config.arena_height - inset).max(inset);
    let rng = world.rng();
    Vec2::new(rng.random_range(inset..=max_x), rng.random_range(inset..=max_y))
}
