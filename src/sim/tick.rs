//! Per-tick particle management
//!
//! The particle manager is the one agent that always runs: every tick it
//! integrates, rebuilds the neighbor graph, applies constraints, recomputes
//! ownership and spawns, then reschedules itself at its own priority level.

use std::collections::VecDeque;

use glam::Vec2;

use super::blob::BlobId;
use super::combat::shoot;
use super::connectivity::{collect_stragglers, connect_blob};
use super::pickup::consume_pickups;
use super::proximity::{apply_constraints, clamp_to_arena, find_pairs};
use super::state::{GameEvent, Outcome, World};
use crate::error::Result;
use crate::schedule::{Agent, Schedule};

/// Agent driving `tick` once per scheduler step
#[derive(Debug, Default, Clone, Copy)]
pub struct ParticleManager;

impl Agent<World> for ParticleManager {
    fn go(
        self: Box<Self>,
        world: &mut World,
        schedule: &mut Schedule<World>,
        _tick: i64,
        priority: usize,
    ) -> Result<()> {
        tick(world, schedule)?;
        schedule.schedule(priority, self)
    }
}

/// Run one full simulation tick on the world
pub fn tick(world: &mut World, schedule: &mut Schedule<World>) -> Result<()> {
    world.ticks += 1;

    integrate(world, schedule)?;
    let excised = world.excise_dead();
    if excised > 0 {
        log::trace!("Excised {} dead particles", excised);
    }
    flag_dead_players(world);

    for p in world.particles.iter_mut() {
        p.neighbors.clear();
    }
    let pairs = find_pairs(
        &world.particles,
        world.config.range,
        world.config.neighbor_search,
        &mut world.grid,
    );
    apply_constraints(
        &mut world.particles,
        &world.blobs,
        &pairs,
        world.config.push_distance,
    );
    clamp_to_arena(
        &mut world.particles,
        world.config.arena_width,
        world.config.arena_height,
        world.config.clamp_margin,
    );

    rebuild_membership(world);
    consume_pickups(world, schedule)?;

    let spawner = world.spawner;
    spawner.run(world, schedule)?;

    for blob in world.blobs.iter_mut().flatten() {
        blob.update_health(&world.particles);
    }
    remove_eliminated(world)?;

    debug_assert!(world.check_ownership(), "ownership broken at tick {}", world.ticks);
    Ok(())
}

/// Steer, fire and advance every blob's members
fn integrate(world: &mut World, schedule: &mut Schedule<World>) -> Result<()> {
    let ids: Vec<BlobId> = world.blobs().map(|b| b.id).collect();

    for id in ids {
        if let Some(input) = world.input.for_blob(id).copied() {
            let blob = world.blob_mut(id)?;
            let steer = input.steer.clamp_length_max(1.0);
            if steer != Vec2::ZERO {
                blob.heading = steer.normalize();
            }
            if let Some(anchor) = blob.anchor() {
                let accel = blob.params.accel;
                world.particles[anchor].impulse(steer * accel);
            }
            if input.fire {
                shoot(world, schedule, id)?;
            }
        }

        let Some(blob) = world.blobs[id.index()].as_ref() else {
            continue;
        };
        let params = blob.params;
        for &i in &blob.members {
            world.particles[i].integrate(
                params.friction,
                params.min_speed,
                params.max_speed,
                params.growth,
            );
        }
    }
    Ok(())
}

/// A player blob without an anchor or members is out of the game
fn flag_dead_players(world: &mut World) {
    for blob in world.blobs.iter_mut().flatten() {
        if blob.is_player() && !blob.dead && (blob.anchor.is_none() || blob.members.is_empty()) {
            blob.dead = true;
            log::info!("Blob {} lost its anchor", blob.id);
        }
    }
}

/// Clear every member list, then rebuild them breadth-first from the anchors
fn rebuild_membership(world: &mut World) {
    for blob in world.blobs.iter_mut().flatten() {
        blob.members.clear();
    }

    let mut visited = vec![false; world.particles.len()];
    let mut queue = VecDeque::new();
    let policy = world.config.straggler_policy;

    for blob in world.blobs.iter_mut().skip(1).flatten() {
        if blob.dead {
            continue;
        }
        let absorbed = connect_blob(&mut world.particles, blob, &mut visited, &mut queue);
        blob.score.absorbed += absorbed;
    }
    if let Some(neutral) = world.blobs[0].as_mut() {
        collect_stragglers(&mut world.particles, neutral, &mut visited, &mut queue, policy);
    }
}

/// Drop flagged blobs, announce each elimination and, once, the outcome
fn remove_eliminated(world: &mut World) -> Result<()> {
    let dead: Vec<BlobId> = world
        .blobs()
        .filter(|b| b.is_dead())
        .map(|b| b.id)
        .collect();
    if dead.is_empty() {
        return Ok(());
    }

    for &id in &dead {
        world.remove_blob(id)?;
    }
    let remaining = world.living_players();
    for id in dead {
        log::info!("Blob {} eliminated, {} remaining", id, remaining.len());
        world.push_event(GameEvent::PlayerEliminated {
            blob: id,
            remaining: remaining.len(),
        });
    }

    if world.finished {
        return Ok(());
    }
    let outcome = match remaining.as_slice() {
        [] => Outcome::Draw,
        [winner] => Outcome::Winner(*winner),
        _ => return Ok(()),
    };
    log::info!("Game over: {:?}", outcome);
    world.finished = true;
    world.push_event(GameEvent::Outcome(outcome));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MANAGER_PRIORITY;
    use crate::settings::SimConfig;
    use crate::sim::particle::Particle;
    use crate::sim::state::{PlayerInput, TickInput};

    fn quiet_config() -> SimConfig {
        SimConfig {
            particle_spawn_secs: 0.0,
            pickup_spawn_secs: 0.0,
            ..SimConfig::default()
        }
    }

    fn start(config: SimConfig, seed: u64) -> (World, Schedule<World>) {
        let mut world = World::new(config, seed);
        world.populate().unwrap();
        let mut schedule = Schedule::new(world.config.priority_levels);
        schedule
            .schedule(MANAGER_PRIORITY, Box::new(ParticleManager))
            .unwrap();
        (world, schedule)
    }

    fn run(world: &mut World, schedule: &mut Schedule<World>, ticks: usize) {
        for _ in 0..ticks {
            schedule.step(world).unwrap();
        }
    }

    #[test]
    fn test_manager_reschedules_itself() {
        let (mut world, mut schedule) = start(quiet_config(), 1);
        run(&mut world, &mut schedule, 10);
        assert_eq!(world.ticks, 10);
        assert_eq!(schedule.pending(), 1);
    }

    #[test]
    fn test_steering_moves_anchor() {
        let config = SimConfig {
            players: 1,
            particles_per_blob: 1,
            neutral_cluster_size: 0,
            ..quiet_config()
        };
        let (mut world, mut schedule) = start(config, 1);
        let anchor = world.blob(BlobId(1)).unwrap().anchor().unwrap();
        let before = world.particles()[anchor].pos;

        world.input = TickInput {
            players: vec![PlayerInput {
                blob: BlobId(1),
                steer: Vec2::new(0.0, -3.0),
                fire: false,
            }],
        };
        run(&mut world, &mut schedule, 1);
        let blob = world.blob(BlobId(1)).unwrap();
        let after = world.particles()[anchor].pos;
        // Direction is clamped to unit length before scaling by accel
        let expected = blob.params.accel * blob.params.friction;
        assert!((before.y - after.y - expected).abs() < 1e-4);
        assert_eq!(blob.heading, Vec2::new(0.0, -1.0));

        // Momentum carries without input
        world.input = TickInput::default();
        run(&mut world, &mut schedule, 1);
        assert!(world.particles()[anchor].pos.y < after.y);
    }

    #[test]
    fn test_absorbs_neutral_in_reach() {
        let config = SimConfig {
            players: 1,
            particles_per_blob: 1,
            neutral_cluster_size: 0,
            ..quiet_config()
        };
        let (mut world, mut schedule) = start(config, 1);
        let anchor = world.blob(BlobId(1)).unwrap().anchor().unwrap();
        let pos = world.particles()[anchor].pos + Vec2::new(20.0, 0.0);
        let far = world.particles()[anchor].pos + Vec2::new(0.0, 150.0);
        world.add_particle(Particle::new(pos, 6.0, BlobId::NEUTRAL)).unwrap();
        world.add_particle(Particle::new(far, 6.0, BlobId::NEUTRAL)).unwrap();

        run(&mut world, &mut schedule, 1);
        let blob = world.blob(BlobId(1)).unwrap();
        assert_eq!(blob.len(), 2);
        assert_eq!(blob.score.absorbed, 1);
        assert_eq!(world.neutral().unwrap().len(), 1);
        assert!(
            world
                .particles()
                .iter()
                .filter(|p| p.blob == BlobId(1))
                .all(|p| p.color == blob.color)
        );
    }

    #[test]
    fn test_anchor_death_eliminates_player() {
        let config = SimConfig {
            players: 2,
            particles_per_blob: 5,
            ..quiet_config()
        };
        let (mut world, mut schedule) = start(config, 9);
        let anchor = world.blob(BlobId(1)).unwrap().anchor().unwrap();
        world.particles[anchor].kill();

        run(&mut world, &mut schedule, 1);
        assert!(world.blob(BlobId(1)).is_none());
        assert!(world.particles().iter().all(|p| p.blob != BlobId(1)));
        assert_eq!(
            world.drain_events(),
            vec![
                GameEvent::PlayerEliminated {
                    blob: BlobId(1),
                    remaining: 1
                },
                GameEvent::Outcome(Outcome::Winner(BlobId(2))),
            ]
        );
        assert!(world.check_ownership());
    }

    #[test]
    fn test_simultaneous_elimination_is_draw() {
        let (mut world, mut schedule) = start(quiet_config(), 9);
        for id in [BlobId(1), BlobId(2)] {
            let anchor = world.blob(id).unwrap().anchor().unwrap();
            world.particles[anchor].kill();
        }
        run(&mut world, &mut schedule, 1);
        let events = world.drain_events();
        assert_eq!(events.last(), Some(&GameEvent::Outcome(Outcome::Draw)));
        assert!(world.living_players().is_empty());
    }

    #[test]
    fn test_health_tracks_member_radii() {
        let (mut world, mut schedule) = start(quiet_config(), 4);
        run(&mut world, &mut schedule, 1);
        let blob = world.blob(BlobId(1)).unwrap();
        let sum: f32 = blob
            .members()
            .iter()
            .map(|&i| world.particles()[i].radius())
            .sum();
        assert!((blob.health() - sum).abs() < 1e-3);
        assert!(blob.health() > 0.0);
    }

    #[test]
    fn test_boundary_holds() {
        let config = SimConfig {
            pickup_spawn_secs: 0.0,
            ..SimConfig::default()
        };
        let (mut world, mut schedule) = start(config, 5);
        for _ in 0..30 {
            world.input = TickInput {
                players: vec![PlayerInput {
                    blob: BlobId(1),
                    steer: Vec2::new(1.0, 0.0),
                    fire: false,
                }],
            };
            run(&mut world, &mut schedule, 1);
            let c = &world.config;
            for p in world.particles() {
                let inset = p.radius() + c.clamp_margin;
                assert!(p.pos.x >= inset - 1e-3 && p.pos.x <= c.arena_width - inset + 1e-3);
                assert!(p.pos.y >= inset - 1e-3 && p.pos.y <= c.arena_height - inset + 1e-3);
            }
        }
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs must stay identical
        let (mut world1, mut schedule1) = start(SimConfig::default(), 99999);
        let (mut world2, mut schedule2) = start(SimConfig::default(), 99999);

        for t in 0..90 {
            let input = TickInput {
                players: vec![
                    PlayerInput {
                        blob: BlobId(1),
                        steer: Vec2::new(-1.0, (t as f32 * 0.1).sin()),
                        fire: t % 20 == 0,
                    },
                    PlayerInput {
                        blob: BlobId(2),
                        steer: Vec2::new(1.0, 0.0),
                        fire: t % 15 == 0,
                    },
                ],
            };
            world1.input = input.clone();
            world2.input = input;
            schedule1.step(&mut world1).unwrap();
            schedule2.step(&mut world2).unwrap();
        }

        assert_eq!(world1.snapshot(), world2.snapshot());
        assert_eq!(world1.drain_events(), world2.drain_events());
    }
}
