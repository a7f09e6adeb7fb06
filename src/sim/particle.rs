//! Particles: the point masses every blob is made of

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::blob::{BlobId, NEUTRAL_COLOR};
use super::pickup::PickupKind;

/// What a particle is, beyond its physics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Plain,
    /// Time-limited power-up, consumed when absorbed into a player blob
    Pickup(PickupKind),
}

/// A point mass with implicit (position-difference) velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    /// Stable key for agents that must find this particle again after compaction
    pub uid: u32,
    pub pos: Vec2,
    /// Position at the previous tick; `pos - prev_pos` is the velocity
    pub prev_pos: Vec2,
    radius: f32,
    /// Radius the particle regrows toward
    pub max_radius: f32,
    /// Owning blob (0 = neutral)
    pub blob: BlobId,
    /// Color tag for renderers (0xRRGGBB)
    pub color: u32,
    pub kind: ParticleKind,
    /// Zero inverse mass: constraint forces never move it (blob anchors)
    pub pinned: bool,
    dead: bool,
    /// Position inside the owning blob's member list
    #[serde(skip)]
    pub(crate) member_slot: usize,
    /// Neighbor indices; valid from the proximity pass until the next structural change
    #[serde(skip)]
    pub neighbors: Vec<usize>,
}

impl Particle {
    pub fn new(pos: Vec2, radius: f32, blob: BlobId) -> Self {
        Self {
            uid: 0,
            pos,
            prev_pos: pos,
            radius: radius.max(0.0),
            max_radius: radius.max(0.0),
            blob,
            color: NEUTRAL_COLOR,
            kind: ParticleKind::Plain,
            pinned: false,
            dead: radius <= 0.0,
            member_slot: 0,
            neighbors: Vec::new(),
        }
    }

    /// Create a pickup particle (always neutral until absorbed)
    pub fn pickup(pos: Vec2, radius: f32, kind: PickupKind) -> Self {
        let mut p = Self::new(pos, radius, BlobId::NEUTRAL);
        p.kind = ParticleKind::Pickup(kind);
        p.color = kind.color();
        p
    }

    pub fn with_max_radius(mut self, max_radius: f32) -> Self {
        self.max_radius = max_radius.max(self.radius);
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the radius; zero or below kills the particle
    pub fn set_radius(&mut self, radius: f32) {
        if radius <= 0.0 {
            self.radius = 0.0;
            self.dead = true;
        } else {
            self.radius = radius;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead || self.radius <= 0.0
    }

    /// Flag for removal at the start of the owning blob's next pass
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Shrink by `amount`; damage at least as large as the radius kills
    pub fn damage(&mut self, amount: f32) {
        if amount >= self.radius {
            self.set_radius(0.0);
        } else {
            self.radius -= amount;
        }
    }

    /// Inverse mass (1 / radius); pinned or dead particles have none
    pub fn inverse_mass(&self) -> f32 {
        if self.pinned || self.radius <= 0.0 {
            0.0
        } else {
            1.0 / self.radius
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev_pos
    }

    /// Displace without changing the remembered previous position
    pub fn push(&mut self, delta: Vec2) {
        self.pos += delta;
    }

    /// Change velocity by `delta`, taking effect at the next integration
    pub fn impulse(&mut self, delta: Vec2) {
        self.prev_pos -= delta;
    }

    /// Two particles are enemies iff they belong to different non-neutral blobs
    pub fn is_enemy(&self, other: &Particle) -> bool {
        self.is_enemy_of(other.blob)
    }

    pub fn is_enemy_of(&self, blob: BlobId) -> bool {
        blob != self.blob && !blob.is_neutral() && !self.blob.is_neutral()
    }

    pub fn is_pickup(&self) -> bool {
        matches!(self.kind, ParticleKind::Pickup(_))
    }

    /// Advance one tick of position-difference integration
    ///
    /// Velocity is scaled by `friction`, zeroed below `min_speed` and capped at
    /// `max_speed`. The radius regrows by `growth` toward `max_radius`.
    pub fn integrate(&mut self, friction: f32, min_speed: f32, max_speed: f32, growth: f32) {
        let mut vel = self.velocity() * friction;
        let speed = vel.length();
        if speed < min_speed {
            vel = Vec2::ZERO;
        } else if speed > max_speed {
            vel *= max_speed / speed;
        }
        self.prev_pos = self.pos;
        self.pos += vel;

        if self.radius < self.max_radius {
            self.radius = (self.radius + growth).min(self.max_radius);
        }
    }
}
