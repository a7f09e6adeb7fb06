//! Blobs: dynamically-membered clusters of particles sharing an owner

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particle::Particle;

/// Color tag of the neutral blob and its particles
pub const NEUTRAL_COLOR: u32 = 0xC0C0C0;

/// Color tags handed to player blobs in join order
pub const PLAYER_COLORS: [u32; 4] = [0x00FF00, 0x0000FF, 0xFF0000, 0xFFFF00];

/// Blob identifier; 0 is the neutral blob
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlobId(pub u8);

impl BlobId {
    pub const NEUTRAL: BlobId = BlobId(0);

    pub fn is_neutral(self) -> bool {
        self.0 == 0
    }

    /// Slot in the world's dense blob table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tunable per-blob physics parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Stick-constraint stiffness (fraction of the error corrected per tick)
    pub stiffness: f32,
    /// Rest separation between friendly particles, beyond their radii
    pub pull_distance: f32,
    pub friction: f32,
    /// Speeds below this come to rest
    pub min_speed: f32,
    pub max_speed: f32,
    /// Anchor steering impulse per tick
    pub accel: f32,
    /// Radius members regrow toward
    pub max_radius: f32,
    /// Radius regained per tick
    pub growth: f32,
    /// Ticks between shots
    pub cooldown_ticks: i64,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            stiffness: 0.05,
            pull_distance: 20.0,
            friction: 0.97,
            min_speed: 0.05,
            max_speed: 10.0,
            accel: 1.5,
            max_radius: 8.0,
            growth: 0.01,
            cooldown_ticks: 10,
        }
    }
}

/// Per-blob scoring counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Particles taken over from another owner
    pub absorbed: u32,
    pub damage_dealt: f32,
    pub pickups: u32,
}

impl Score {
    pub fn total(&self) -> u64 {
        self.absorbed as u64 * 10 + self.damage_dealt.round() as u64 + self.pickups as u64 * 50
    }
}

/// Active timed power-up effects (counters so overlapping effects stack)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    pub invulnerable: u32,
    pub nitro: u32,
    pub glue: u32,
}

impl Effects {
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0
    }
}

/// A named cluster of particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub id: BlobId,
    pub color: u32,
    /// Member particle indices (anchor first, then search order)
    pub(crate) members: Vec<usize>,
    /// Player-controlled root of the connectivity search (None for neutral)
    pub(crate) anchor: Option<usize>,
    pub params: BlobParams,
    /// Sum of member radii, refreshed each tick
    health: f32,
    pub score: Score,
    pub effects: Effects,
    /// Direction the anchor faces; bullets leave along it
    pub heading: Vec2,
    pub(crate) fire_ready: bool,
    /// Flagged for removal at the end of the current tick
    pub(crate) dead: bool,
    /// Start offsets of disjoint clusters within `members` (neutral blob, cluster tracking)
    pub(crate) clusters: Vec<usize>,
}

impl Blob {
    pub fn new(id: BlobId, color: u32, params: BlobParams) -> Self {
        Self {
            id,
            color,
            members: Vec::new(),
            anchor: None,
            params,
            health: 0.0,
            score: Score::default(),
            effects: Effects::default(),
            heading: Vec2::X,
            fire_ready: true,
            dead: false,
            clusters: Vec::new(),
        }
    }

    pub fn neutral(params: BlobParams) -> Self {
        Self::new(BlobId::NEUTRAL, NEUTRAL_COLOR, params)
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn is_player(&self) -> bool {
        !self.id.is_neutral()
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_fire_ready(&self) -> bool {
        self.fire_ready
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    /// Recompute health as the sum of member radii
    pub fn update_health(&mut self, particles: &[Particle]) {
        self.health = self
            .members
            .iter()
            .filter_map(|&i| particles.get(i))
            .map(Particle::radius)
            .sum();
    }

    /// Member slices for each disjoint cluster (one slice when not tracked)
    pub fn clusters(&self) -> Vec<&[usize]> {
        if self.clusters.is_empty() {
            return if self.members.is_empty() {
                Vec::new()
            } else {
                vec![&self.members[..]]
            };
        }
        let mut out = Vec::with_capacity(self.clusters.len());
        for (n, &start) in self.clusters.iter().enumerate() {
            let end = self
                .clusters
                .get(n + 1)
                .copied()
                .unwrap_or(self.members.len());
            out.push(&self.members[start..end]);
        }
        out
    }
}
