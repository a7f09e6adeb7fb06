//! Ooze Arena - blob-and-particle arena simulation core
//!
//! Core modules:
//! - `schedule`: Multi-priority discrete-event tick scheduler
//! - `sim`: Deterministic simulation (particles, blobs, forces, connectivity)
//! - `game`: Game wrapper wiring the schedule, world, and game-flow collaborator
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Error types shared by every layer

pub mod error;
pub mod game;
pub mod schedule;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use game::{Game, GameFlow, LogFlow, Outcome};
pub use schedule::{Agent, EPOCH, Schedule};
pub use settings::{ArenaPreset, SimConfig};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICK_RATE: f32 = 30.0;
    /// Scheduler priority levels (0 = simulation, 1 = gameplay timers)
    pub const PRIORITY_LEVELS: usize = 2;
    /// Priority level the particle manager runs at
    pub const MANAGER_PRIORITY: usize = 0;
    /// Priority level for power-up timers, cooldowns and projectiles
    pub const TIMER_PRIORITY: usize = 1;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 820.0;
    pub const ARENA_HEIGHT: f32 = 620.0;
    /// Extra clearance kept between a particle's edge and the arena wall
    pub const CLAMP_MARGIN: f32 = 2.0;

    /// Neighbor search range (three quarters of a 75px grid cell)
    pub const CELL_WIDTH: f32 = 75.0;
    pub const INTERACTION_RANGE: f32 = CELL_WIDTH * 0.75;
    /// Rest separation between enemy particles (beyond their radii)
    pub const PUSH_DISTANCE: f32 = 40.0;

    /// Blob defaults
    pub const ANCHOR_RADIUS: f32 = 8.0;
    pub const PARTICLES_PER_BLOB: usize = 50;
    pub const NEUTRAL_CLUSTER_SIZE: usize = 50;
    pub const NEUTRAL_RADIUS: f32 = 6.0;
    pub const SCATTER: f32 = 40.0;

    /// Spawner defaults
    pub const MAX_PARTICLES: usize = 400;
    pub const PARTICLE_SPAWN_SECS: f32 = 2.0;
    pub const PICKUP_SPAWN_SECS: f32 = 12.0;
    pub const PICKUP_RADIUS: f32 = 7.0;
    /// Ticks a pickup survives outside any player blob (15 s)
    pub const PICKUP_TTL_TICKS: i64 = 15 * 30;
    /// Duration of timed power-up effects (10 s)
    pub const EFFECT_TICKS: i64 = 10 * 30;
    /// Particles added by a Boost pickup
    pub const BOOST_PARTICLES: usize = 10;
}
