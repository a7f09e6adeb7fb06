//! Shooting: bullets, explosions and the gun cooldown

use glam::Vec2;

use super::blob::BlobId;
use super::state::World;
use crate::consts::TIMER_PRIORITY;
use crate::error::{Result, SimError};
use crate::schedule::{Agent, Schedule};

/// How quickly the explosion falloff drops to zero (higher is steeper)
const FALLOFF_SCALE: f32 = 5.0;

/// Inverse-square falloff, `max_f` at `t = 0` and exactly zero at `t = max_t`
pub fn falloff(t: f32, max_t: f32, max_f: f32) -> f32 {
    let st = FALLOFF_SCALE * t / max_t;
    max_f / (st * st + 1.0) - max_f / (FALLOFF_SCALE * FALLOFF_SCALE + 1.0)
}

/// Linear interpolation from `min_f` at `t = 0` to `max_f` at `t = max_t`
pub fn lerp(t: f32, max_t: f32, min_f: f32, max_f: f32) -> f32 {
    t * (max_f - min_f) / max_t + min_f
}

/// Fire a player's gun if it is ready
///
/// Consumes the last living non-anchor member as ammunition. Returns whether
/// a bullet was launched.
pub fn shoot(world: &mut World, schedule: &mut Schedule<World>, id: BlobId) -> Result<bool> {
    let blob = world.blob(id).ok_or(SimError::UnknownBlob(id))?;
    let Some(anchor) = blob.anchor() else {
        return Ok(false);
    };
    if !blob.is_fire_ready() {
        return Ok(false);
    }
    let heading = blob.heading.normalize_or(Vec2::X);
    let cooldown = blob.params.cooldown_ticks;
    let ammo = blob
        .members()
        .iter()
        .rev()
        .copied()
        .find(|&i| i != anchor && !world.particles[i].is_dead());
    let Some(ammo) = ammo else {
        return Ok(false);
    };

    let radius = world.particles[ammo].radius();
    world.particles[ammo].kill();
    let origin = &world.particles[anchor];
    let bullet = Bullet {
        pos: origin.pos + heading * (origin.radius() + radius),
        vel: heading * world.config.bullet_speed,
        radius,
        owner: id,
        ttl: world.config.bullet_lifetime_ticks,
    };
    world.blob_mut(id)?.fire_ready = false;

    schedule.schedule(TIMER_PRIORITY, Box::new(bullet))?;
    schedule.schedule_in(cooldown, TIMER_PRIORITY, Box::new(GunCooldown { blob: id }))?;
    log::debug!("Blob {} fired (radius {:.1})", id, radius);
    Ok(true)
}

/// Re-arms a blob's gun
pub struct GunCooldown {
    pub blob: BlobId,
}

impl Agent<World> for GunCooldown {
    fn go(
        self: Box<Self>,
        world: &mut World,
        _schedule: &mut Schedule<World>,
        _tick: i64,
        _priority: usize,
    ) -> Result<()> {
        if let Ok(blob) = world.blob_mut(self.blob) {
            blob.fire_ready = true;
        }
        Ok(())
    }
}

/// A projectile that detonates near an enemy, at the arena edge, or when it runs out of time
#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub owner: BlobId,
    /// Ticks of flight left
    pub ttl: u32,
}

impl Bullet {
    fn hits_enemy(&self, world: &World) -> bool {
        world.particles().iter().any(|p| {
            let reach = self.radius + p.radius();
            !p.is_dead()
                && p.is_enemy_of(self.owner)
                && p.pos.distance_squared(self.pos) < reach * reach
        })
    }
}

impl Agent<World> for Bullet {
    fn go(
        mut self: Box<Self>,
        world: &mut World,
        schedule: &mut Schedule<World>,
        _tick: i64,
        priority: usize,
    ) -> Result<()> {
        self.pos += self.vel;
        self.ttl = self.ttl.saturating_sub(1);

        if self.ttl == 0 || !world.contains(self.pos) || self.hits_enemy(world) {
            let explosion = Explosion::new(self.pos, self.owner, self.radius, world);
            schedule.schedule(priority, Box::new(explosion))
        } else {
            schedule.schedule(priority, self)
        }
    }
}

/// An expanding ring that shrinks and pushes everything it passes over
///
/// Each particle is hit at most once: every tick only the annulus between the
/// previous and current ring radius is affected.
#[derive(Debug, Clone)]
pub struct Explosion {
    pub center: Vec2,
    pub owner: BlobId,
    /// Final ring radius
    pub radius: f32,
    /// Peak push factor at the center
    pub accel: f32,
    /// Damage per unit of push
    pub damage: f32,
    /// Ticks until the ring reaches full radius
    pub duration: u32,
    time: u32,
    inner: f32,
}

impl Explosion {
    pub fn new(center: Vec2, owner: BlobId, bullet_radius: f32, world: &World) -> Self {
        let config = &world.config;
        Self {
            center,
            owner,
            radius: config.explosion_radius,
            accel: config.explosion_accel,
            damage: bullet_radius * config.explosion_damage,
            duration: config.explosion_ticks.max(1),
            time: 0,
            inner: 0.0,
        }
    }
}

impl Agent<World> for Explosion {
    fn go(
        mut self: Box<Self>,
        world: &mut World,
        schedule: &mut Schedule<World>,
        _tick: i64,
        priority: usize,
    ) -> Result<()> {
        self.time += 1;
        let outer = lerp(self.time as f32, self.duration as f32, 0.0, self.radius);
        // The first ring includes the center itself
        let min_r2 = if self.time == 1 { -1.0 } else { self.inner * self.inner };
        let max_r2 = outer * outer;
        self.inner = outer;

        let shielded: Vec<BlobId> = world
            .blobs()
            .filter(|b| b.effects.is_invulnerable())
            .map(|b| b.id)
            .collect();

        let mut dealt = 0.0;
        for p in world.particles.iter_mut() {
            if p.is_dead() || p.blob == self.owner || shielded.contains(&p.blob) {
                continue;
            }
            let offset = p.pos - self.center;
            let dist2 = offset.length_squared();
            if dist2 > max_r2 || dist2 <= min_r2 {
                continue;
            }
            let speed = falloff(dist2.sqrt(), self.radius, self.accel);
            let amount = (speed * self.damage).min(p.radius());
            p.damage(amount);
            p.push(offset * speed);
            dealt += amount;
        }

        if let Ok(shooter) = world.blob_mut(self.owner) {
            shooter.score.damage_dealt += dealt;
        }

        if self.time < self.duration {
            schedule.schedule(priority, self)?;
        }
        Ok(())
    }
}
