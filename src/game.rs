//! Game wrapper: schedule, world and the game-flow collaborator
//!
//! The external clock calls `Game::step` once per tick with that tick's input.
//! Eliminations and the final outcome are forwarded to the `GameFlow`
//! implementation (menus, score screens and so on live behind it).

use crate::consts::MANAGER_PRIORITY;
use crate::error::Result;
use crate::schedule::Schedule;
use crate::settings::SimConfig;
use crate::sim::{BlobId, GameEvent, ParticleManager, TickInput, World};

pub use crate::sim::state::Outcome;

/// Receives game-level notifications from the simulation
pub trait GameFlow {
    /// A player blob was removed; `remaining` players are still alive
    fn player_eliminated(&mut self, blob: BlobId, remaining: usize);

    /// The game is decided
    fn outcome(&mut self, outcome: Outcome);
}

/// Flow that only logs
#[derive(Debug, Default)]
pub struct LogFlow;

impl GameFlow for LogFlow {
    fn player_eliminated(&mut self, blob: BlobId, remaining: usize) {
        log::info!("Player {} eliminated ({} left)", blob, remaining);
    }

    fn outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Winner(id) => log::info!("Player {} wins", id),
            Outcome::Draw => log::info!("Draw"),
        }
    }
}

/// A running game
pub struct Game {
    schedule: Schedule<World>,
    world: World,
    flow: Box<dyn GameFlow>,
    paused: bool,
    outcome: Option<Outcome>,
}

impl Game {
    /// Create a game and lay out the starting world
    pub fn new(config: SimConfig, seed: u64, flow: Box<dyn GameFlow>) -> Result<Self> {
        config.validate()?;
        let schedule = Schedule::new(config.priority_levels);
        let world = World::new(config, seed);
        let mut game = Self {
            schedule,
            world,
            flow,
            paused: false,
            outcome: None,
        };
        game.reset()?;
        Ok(game)
    }

    /// Drop all pending agents, rebuild the world and restart the particle manager
    pub fn reset(&mut self) -> Result<()> {
        self.schedule.clear();
        self.world.populate()?;
        self.schedule
            .schedule(MANAGER_PRIORITY, Box::new(ParticleManager))?;
        self.paused = false;
        self.outcome = None;
        log::info!("Game reset at tick {}", self.schedule.now());
        Ok(())
    }

    /// Reset with a fresh seed
    pub fn reseed(&mut self, seed: u64) -> Result<()> {
        self.world.seed = seed;
        self.reset()
    }

    /// Advance one tick (no-op while paused)
    pub fn step(&mut self, input: TickInput) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        self.world.input = input;
        self.schedule.step(&mut self.world)?;

        for event in self.world.drain_events() {
            match event {
                GameEvent::PlayerEliminated { blob, remaining } => {
                    self.flow.player_eliminated(blob, remaining)
                }
                GameEvent::Outcome(outcome) => {
                    self.outcome = Some(outcome);
                    self.flow.outcome(outcome);
                }
            }
        }
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
        log::debug!("Paused: {}", self.paused);
    }

    /// Decided outcome, once there is one
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn schedule(&self) -> &Schedule<World> {
        &self.schedule
    }

    /// Scheduler access for gameplay agents added from outside
    pub fn schedule_mut(&mut self) -> &mut Schedule<World> {
        &mut self.schedule
    }

    /// Current tick
    pub fn now(&self) -> i64 {
        self.schedule.now()
    }
}
