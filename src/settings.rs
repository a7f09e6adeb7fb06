//! Simulation settings and tuning
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::sim::BlobParams;

/// Arena size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArenaPreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl ArenaPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaPreset::Small => "Small",
            ArenaPreset::Medium => "Medium",
            ArenaPreset::Large => "Large",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" => Some(ArenaPreset::Small),
            "medium" | "med" => Some(ArenaPreset::Medium),
            "large" => Some(ArenaPreset::Large),
            _ => None,
        }
    }

    /// Arena width and height
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            ArenaPreset::Small => (620.0, 470.0),
            ArenaPreset::Medium => (ARENA_WIDTH, ARENA_HEIGHT),
            ArenaPreset::Large => (1220.0, 920.0),
        }
    }

    /// Particle cap for the spawner
    pub fn max_particles(&self) -> usize {
        match self {
            ArenaPreset::Small => 250,
            ArenaPreset::Medium => MAX_PARTICLES,
            ArenaPreset::Large => 800,
        }
    }
}

/// How the proximity pass discovers pairs in range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum NeighborSearch {
    /// Test every unordered pair
    #[default]
    AllPairs,
    /// Bucket by a uniform grid; `cell_size` is raised to the range if smaller
    Grid { cell_size: f32 },
}

/// What straggler collection does with disjoint neutral clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StragglerPolicy {
    /// All unclaimed clusters share blob 0 as one member list
    #[default]
    Merge,
    /// Still blob 0, but cluster boundaries are recorded on the neutral blob
    TrackClusters,
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub preset: ArenaPreset,

    // === Timing ===
    /// Ticks per second of the external clock
    pub tick_rate: f32,
    pub priority_levels: usize,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Clearance beyond the radius kept from each wall
    pub clamp_margin: f32,

    // === Forces ===
    /// Pairs closer than this are neighbors
    pub range: f32,
    /// Rest separation between enemies, beyond their radii
    pub push_distance: f32,
    pub neighbor_search: NeighborSearch,
    pub straggler_policy: StragglerPolicy,

    // === Spawning ===
    pub max_particles: usize,
    /// Mean seconds between neutral particle spawns (0 disables)
    pub particle_spawn_secs: f32,
    /// Mean seconds between pickup spawns (0 disables)
    pub pickup_spawn_secs: f32,
    pub pickup_radius: f32,
    pub pickup_ttl_ticks: i64,
    pub effect_ticks: i64,
    pub boost_particles: usize,

    // === Starting layout ===
    pub players: usize,
    pub particles_per_blob: usize,
    pub neutral_cluster_size: usize,
    pub anchor_radius: f32,
    pub neutral_radius: f32,

    // === Blobs ===
    pub player_params: BlobParams,
    pub neutral_params: BlobParams,

    // === Combat ===
    pub bullet_speed: f32,
    pub bullet_lifetime_ticks: u32,
    pub explosion_radius: f32,
    pub explosion_ticks: u32,
    /// Peak outward displacement per tick at the explosion center
    pub explosion_accel: f32,
    /// Damage per unit of bullet radius
    pub explosion_damage: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            preset: ArenaPreset::Medium,

            tick_rate: TICK_RATE,
            priority_levels: PRIORITY_LEVELS,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            clamp_margin: CLAMP_MARGIN,

            range: INTERACTION_RANGE,
            push_distance: PUSH_DISTANCE,
            neighbor_search: NeighborSearch::AllPairs,
            straggler_policy: StragglerPolicy::Merge,

            max_particles: MAX_PARTICLES,
            particle_spawn_secs: PARTICLE_SPAWN_SECS,
            pickup_spawn_secs: PICKUP_SPAWN_SECS,
            pickup_radius: PICKUP_RADIUS,
            pickup_ttl_ticks: PICKUP_TTL_TICKS,
            effect_ticks: EFFECT_TICKS,
            boost_particles: BOOST_PARTICLES,

            players: 2,
            particles_per_blob: PARTICLES_PER_BLOB,
            neutral_cluster_size: NEUTRAL_CLUSTER_SIZE,
            anchor_radius: ANCHOR_RADIUS,
            neutral_radius: NEUTRAL_RADIUS,

            player_params: BlobParams::default(),
            neutral_params: BlobParams {
                accel: 0.0,
                ..BlobParams::default()
            },

            bullet_speed: 15.0,
            bullet_lifetime_ticks: 45,
            explosion_radius: 80.0,
            explosion_ticks: 6,
            explosion_accel: 0.5,
            explosion_damage: 1.5,
        }
    }
}

impl SimConfig {
    /// Create settings from a preset (applies preset dimensions and cap)
    pub fn from_preset(preset: ArenaPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    pub fn apply_preset(&mut self, preset: ArenaPreset) {
        self.preset = preset;
        let (w, h) = preset.dimensions();
        self.arena_width = w;
        self.arena_height = h;
        self.max_particles = preset.max_particles();
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(SimError::InvalidConfig(msg.to_string()));

        if self.priority_levels <= TIMER_PRIORITY.max(MANAGER_PRIORITY) {
            return fail("priority_levels must cover the manager and timer levels");
        }
        if !(self.tick_rate > 0.0) {
            return fail("tick_rate must be positive");
        }
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return fail("arena dimensions must be positive");
        }
        if !(self.range > 0.0) {
            return fail("range must be positive");
        }
        if let NeighborSearch::Grid { cell_size } = self.neighbor_search {
            if !(cell_size > 0.0) {
                return fail("grid cell_size must be positive");
            }
        }
        if self.players > u8::MAX as usize {
            return fail("too many players");
        }
        if self.particle_spawn_secs < 0.0 || self.pickup_spawn_secs < 0.0 {
            return fail("spawn intervals cannot be negative");
        }
        if self.pickup_ttl_ticks <= 0 || self.effect_ticks <= 0 {
            return fail("pickup and effect durations must be at least 1 tick");
        }
        for params in [&self.player_params, &self.neutral_params] {
            if params.min_speed < 0.0
                || params.max_speed <= 0.0
                || params.min_speed > params.max_speed
            {
                return fail("speed limits must satisfy 0 <= min_speed <= max_speed, max_speed > 0");
            }
            if params.cooldown_ticks <= 0 {
                return fail("cooldown_ticks must be at least 1");
            }
        }
        Ok(())
    }

    /// Per-tick Bernoulli probability for a mean inter-arrival time in seconds
    pub fn per_tick_probability(&self, mean_secs: f32) -> f64 {
        if mean_secs <= 0.0 {
            return 0.0;
        }
        let ticks = mean_secs as f64 * self.tick_rate as f64;
        if !(ticks > 0.0) {
            return 0.0;
        }
        (1.0 - (-1.0 / ticks).exp()).clamp(0.0, 1.0)
    }
}
