//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one manager tick per schedule step)
//! - Seeded RNG only
//! - Stable iteration order (by particle index, then blob id)
//! - No rendering or platform dependencies

pub mod blob;
pub mod combat;
pub mod connectivity;
pub mod grid;
pub mod particle;
pub mod pickup;
pub mod proximity;
pub mod spawner;
pub mod state;
pub mod tick;

pub use blob::{Blob, BlobId, BlobParams, Effects, NEUTRAL_COLOR, PLAYER_COLORS, Score};
pub use combat::{Bullet, Explosion, GunCooldown, shoot};
pub use connectivity::{collect_stragglers, connect_blob};
pub use grid::UniformGrid;
pub use particle::{Particle, ParticleKind};
pub use pickup::{EffectAgent, PickupExpiry, PickupKind, consume_pickups};
pub use proximity::{apply_constraints, clamp_to_arena, find_pairs};
pub use spawner::Spawner;
pub use state::{
    BlobView, GameEvent, Outcome, ParticleView, PlayerInput, Snapshot, TickInput, World,
};
pub use tick::{ParticleManager, tick};
