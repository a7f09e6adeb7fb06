//! World state: the particle arena, blob table and per-tick I/O

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::blob::{Blob, BlobId, Effects, PLAYER_COLORS, Score};
use super::grid::UniformGrid;
use super::particle::{Particle, ParticleKind};
use super::pickup::PickupKind;
use super::spawner::Spawner;
use crate::consts::SCATTER;
use crate::error::{Result, SimError};
use crate::settings::SimConfig;

/// Steering and trigger state for one player this tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    pub blob: BlobId,
    /// Desired direction; longer than 1 is clamped
    pub steer: Vec2,
    pub fire: bool,
}

/// Input for a single simulation tick (input mapping happens outside the core)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub players: Vec<PlayerInput>,
}

impl TickInput {
    pub fn for_blob(&self, id: BlobId) -> Option<&PlayerInput> {
        self.players.iter().find(|p| p.blob == id)
    }
}

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Exactly one player blob survives
    Winner(BlobId),
    /// The last players were eliminated on the same tick
    Draw,
}

/// Notifications raised during a tick, drained by the game wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerEliminated { blob: BlobId, remaining: usize },
    Outcome(Outcome),
}

/// Renderer-facing view of a particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub radius: f32,
    pub blob: BlobId,
    pub color: u32,
    pub pickup: Option<PickupKind>,
}

/// Renderer/HUD-facing view of a blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobView {
    pub id: BlobId,
    pub color: u32,
    pub health: f32,
    pub members: usize,
    pub score: Score,
    pub effects: Effects,
}

/// Serializable picture of the world after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub particles: Vec<ParticleView>,
    pub blobs: Vec<BlobView>,
}

/// The shared simulation world every agent mutates
///
/// Particles live in a dense vector and are identified by slot index. Removal
/// swaps the last particle into the hole, so indices stay dense; the owning
/// blob's member list and anchor are patched in O(1) through `member_slot`.
#[derive(Debug)]
pub struct World {
    pub config: SimConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub(crate) particles: Vec<Particle>,
    /// Blob table indexed by id; slot 0 is always the neutral blob
    pub(crate) blobs: Vec<Option<Blob>>,
    /// Input consumed by the next manager tick
    pub input: TickInput,
    pub(crate) grid: UniformGrid,
    pub(crate) spawner: Spawner,
    events: Vec<GameEvent>,
    next_uid: u32,
    /// Manager ticks processed
    pub ticks: u64,
    /// An outcome has already been announced
    pub(crate) finished: bool,
}

impl World {
    /// Create an empty world (only the neutral blob) with the given seed
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let neutral = Blob::neutral(config.neutral_params);
        let spawner = Spawner::new(&config);
        Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            particles: Vec::new(),
            blobs: vec![Some(neutral)],
            input: TickInput::default(),
            grid: UniformGrid::default(),
            spawner,
            events: Vec::new(),
            next_uid: 1,
            ticks: 0,
            finished: false,
        }
    }

    /// Reset to the starting layout: player blobs on a ring, one neutral cluster in the middle
    pub fn populate(&mut self) -> Result<()> {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.particles.clear();
        self.blobs = vec![Some(Blob::neutral(self.config.neutral_params))];
        self.spawner = Spawner::new(&self.config);
        self.input = TickInput::default();
        self.events.clear();
        self.next_uid = 1;
        self.ticks = 0;
        self.finished = false;

        let center = self.arena_center();
        let ring = self.config.arena_width.min(self.config.arena_height) * 0.35;
        let players = self.config.players;

        for k in 0..players {
            let id = BlobId(k as u8 + 1);
            let color = PLAYER_COLORS[k % PLAYER_COLORS.len()];
            let params = self.config.player_params;
            let angle = TAU * k as f32 / players as f32;
            let home = center + Vec2::from_angle(angle) * ring;

            let mut blob = Blob::new(id, color, params);
            blob.heading = (center - home).normalize_or(Vec2::X);
            self.insert_blob(blob);

            let mut anchor = Particle::new(home, self.config.anchor_radius, id);
            anchor.pinned = true;
            anchor.color = color;
            let anchor = self.add_particle(anchor)?;
            self.blob_mut(id)?.anchor = Some(anchor);

            for _ in 1..self.config.particles_per_blob {
                let pos = home + self.scatter();
                let mut p = Particle::new(pos, params.max_radius, id);
                p.color = color;
                self.add_particle(p)?;
            }
        }

        for _ in 0..self.config.neutral_cluster_size {
            let pos = center + self.scatter();
            self.add_particle(Particle::new(pos, self.config.neutral_radius, BlobId::NEUTRAL))?;
        }

        log::info!(
            "World populated: seed={}, players={}, particles={}",
            self.seed,
            players,
            self.particles.len()
        );
        Ok(())
    }

    fn scatter(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.random_range(-SCATTER..SCATTER),
            self.rng.random_range(-SCATTER..SCATTER),
        )
    }

    /// Seeded RNG shared by every gameplay decision
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn arena_center(&self) -> Vec2 {
        Vec2::new(self.config.arena_width, self.config.arena_height) * 0.5
    }

    /// Whether `pos` lies inside the arena rectangle
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0
            && pos.y >= 0.0
            && pos.x <= self.config.arena_width
            && pos.y <= self.config.arena_height
    }

    // === Particles ===

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, index: usize) -> Result<&Particle> {
        let len = self.particles.len();
        self.particles
            .get(index)
            .ok_or(SimError::ParticleOutOfRange { index, len })
    }

    pub fn particle_mut(&mut self, index: usize) -> Result<&mut Particle> {
        let len = self.particles.len();
        self.particles
            .get_mut(index)
            .ok_or(SimError::ParticleOutOfRange { index, len })
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Below the spawner cap
    pub fn has_room(&self) -> bool {
        self.particles.len() < self.config.max_particles
    }

    /// Linear lookup by stable uid
    pub fn find_particle_by_uid(&self, uid: u32) -> Option<usize> {
        self.particles.iter().position(|p| p.uid == uid)
    }

    /// Append a particle to the arena and its blob's member list
    ///
    /// Returns the new particle's index.
    pub fn add_particle(&mut self, mut particle: Particle) -> Result<usize> {
        let id = particle.blob;
        let blob = self
            .blobs
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SimError::UnknownBlob(id))?;

        let index = self.particles.len();
        particle.uid = self.next_uid;
        self.next_uid = self.next_uid.wrapping_add(1);
        particle.member_slot = blob.members.len();
        blob.members.push(index);
        self.particles.push(particle);
        Ok(index)
    }

    /// Remove a particle in O(1) by swapping the last particle into its slot
    ///
    /// The moved particle's blob membership and anchor are rewritten to the new
    /// index. Neighbor lists are not patched; they are rebuilt every tick.
    pub fn remove_particle(&mut self, index: usize) -> Result<Particle> {
        let len = self.particles.len();
        if index >= len {
            return Err(SimError::ParticleOutOfRange { index, len });
        }

        self.detach(index);
        let last = len - 1;
        if index != last {
            self.relocate(last, index);
        }
        Ok(self.particles.swap_remove(index))
    }

    /// Drop a particle from its blob's member list (and anchor)
    fn detach(&mut self, index: usize) {
        let p = &self.particles[index];
        let Some(blob) = self.blobs.get_mut(p.blob.index()).and_then(Option::as_mut) else {
            return;
        };

        let slot = if blob.members.get(p.member_slot) == Some(&index) {
            Some(p.member_slot)
        } else {
            blob.members.iter().position(|&m| m == index)
        };
        if let Some(slot) = slot {
            blob.members.swap_remove(slot);
            if let Some(&moved) = blob.members.get(slot) {
                self.particles[moved].member_slot = slot;
            }
            blob.clusters.clear();
        }
        if blob.anchor == Some(index) {
            blob.anchor = None;
        }
    }

    /// Rewrite references to the particle at `from`, which is about to live at `to`
    fn relocate(&mut self, from: usize, to: usize) {
        let p = &self.particles[from];
        let Some(blob) = self.blobs.get_mut(p.blob.index()).and_then(Option::as_mut) else {
            return;
        };
        let slot = if blob.members.get(p.member_slot) == Some(&from) {
            Some(p.member_slot)
        } else {
            blob.members.iter().position(|&m| m == from)
        };
        if let Some(slot) = slot {
            blob.members[slot] = to;
        }
        if blob.anchor == Some(from) {
            blob.anchor = Some(to);
        }
    }

    /// Remove every dead particle; returns how many were excised
    pub fn excise_dead(&mut self) -> usize {
        let dead: Vec<usize> = (0..self.particles.len())
            .filter(|&i| self.particles[i].is_dead())
            .collect();
        // Descending, so pending indices are never the swapped-in last slot
        for &index in dead.iter().rev() {
            self.detach(index);
            let last = self.particles.len() - 1;
            if index != last {
                self.relocate(last, index);
            }
            self.particles.swap_remove(index);
        }
        dead.len()
    }

    // === Blobs ===

    pub fn blob(&self, id: BlobId) -> Option<&Blob> {
        self.blobs.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable blob lookup; unknown or removed ids are an error
    pub fn blob_mut(&mut self, id: BlobId) -> Result<&mut Blob> {
        self.blobs
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SimError::UnknownBlob(id))
    }

    /// Every blob present, in id order
    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.iter().flatten()
    }

    pub fn neutral(&self) -> Option<&Blob> {
        self.blob(BlobId::NEUTRAL)
    }

    /// Ids of player blobs not flagged dead, in id order
    pub fn living_players(&self) -> Vec<BlobId> {
        self.blobs()
            .filter(|b| b.is_player() && !b.is_dead())
            .map(|b| b.id)
            .collect()
    }

    /// Put a blob into its id's slot, replacing whatever was there
    pub fn insert_blob(&mut self, blob: Blob) {
        let slot = blob.id.index();
        if self.blobs.len() <= slot {
            self.blobs.resize_with(slot + 1, || None);
        }
        self.blobs[slot] = Some(blob);
    }

    /// Remove a player blob; any particles it still owns fall to the neutral blob
    pub fn remove_blob(&mut self, id: BlobId) -> Result<Blob> {
        if id.is_neutral() {
            return Err(SimError::UnknownBlob(id));
        }
        let blob = self
            .blobs
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(SimError::UnknownBlob(id))?;

        for &i in &blob.members {
            let p = &mut self.particles[i];
            p.blob = BlobId::NEUTRAL;
            p.pinned = false;
            if p.kind == ParticleKind::Plain {
                p.color = super::blob::NEUTRAL_COLOR;
            }
            if let Some(neutral) = self.blobs[0].as_mut() {
                p.member_slot = neutral.members.len();
                neutral.members.push(i);
            }
        }
        Ok(blob)
    }

    // === Events ===

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.ticks,
            particles: self
                .particles
                .iter()
                .map(|p| ParticleView {
                    pos: p.pos,
                    radius: p.radius(),
                    blob: p.blob,
                    color: p.color,
                    pickup: match p.kind {
                        ParticleKind::Pickup(kind) => Some(kind),
                        ParticleKind::Plain => None,
                    },
                })
                .collect(),
            blobs: self
                .blobs()
                .map(|b| BlobView {
                    id: b.id,
                    color: b.color,
                    health: b.health(),
                    members: b.len(),
                    score: b.score,
                    effects: b.effects,
                })
                .collect(),
        }
    }

    /// Check the ownership invariants; used by tests and debug builds
    ///
    /// Every particle appears exactly once, in the member list of the blob its
    /// id names, at the slot it records.
    pub fn check_ownership(&self) -> bool {
        let mut seen = vec![false; self.particles.len()];
        for blob in self.blobs() {
            for (slot, &i) in blob.members.iter().enumerate() {
                let Some(p) = self.particles.get(i) else {
                    return false;
                };
                if seen[i] || p.blob != blob.id || p.member_slot != slot {
                    return false;
                }
                seen[i] = true;
            }
            if let Some(anchor) = blob.anchor
                && self.particles.get(anchor).is_none_or(|p| p.blob != blob.id)
            {
                return false;
            }
        }
        seen.into_iter().all(|s| s)
    }
}
