#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven scheduler that advances the world and every system in a fixed
//! order.
//!
//! One call to [`Simulation::step`] is one logical frame:
//!
//! 1. `Command::Tick` advances the clock.
//! 2. Spawning emits the enemies due this tick.
//! 3. Movement re-plans and steers every enemy.
//! 4. Targeting repairs claims and fires at them.
//! 5. Combat flies projectiles and resolves hits.
//! 6. `Command::ReapDestroyed` removes depleted enemies and spent projectiles.
//!
//! Each system sees the events produced so far in the tick. Destruction
//! notifications raised by the reap are delivered to the systems at the start
//! of the following tick.

use std::{mem, time::Duration};

use outpost_core::{Command, Event};
use outpost_system_movement::Movement;
use outpost_system_spawning::{ConfigError, Spawning, WaveConfig};
use outpost_system_tower_combat::TowerCombat;
use outpost_system_tower_targeting::TowerTargeting;
use outpost_world::{self as world, query, LevelConfig, World, WorldError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete description of a run: the level, its waves and the RNG seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Seed for deterministic spawner selection.
    #[serde(default)]
    pub seed: u64,
    /// Static level description.
    pub level: LevelConfig,
    /// Wave composition and timings.
    #[serde(default)]
    pub waves: WaveConfig,
}

/// Errors raised while assembling a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The level could not be built.
    #[error("invalid level")]
    World(#[from] WorldError),
    /// The wave description was rejected.
    #[error("invalid wave configuration")]
    Waves(#[from] ConfigError),
}

/// Terminal state of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The goal was destroyed.
    Defeated,
    /// Every configured wave was spawned and cleared.
    Cleared,
}

/// Result of [`Simulation::run_for_ticks`].
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Terminal state reached, if any.
    pub outcome: Option<Outcome>,
    /// Index of the last processed tick.
    pub final_tick: u64,
    /// Every event broadcast during the run, in order.
    pub events: Vec<Event>,
}

/// World plus systems, advanced together one tick at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    spawning: Spawning,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    notifications: Vec<Event>,
    backlog: Vec<Event>,
}

impl Simulation {
    /// Builds the world, places the level's turrets and prepares every system.
    pub fn new(scenario: &ScenarioConfig) -> Result<Self, SimulationError> {
        let mut world = World::new(&scenario.level)?;
        let spawning = Spawning::new(scenario.waves.to_config(scenario.seed)?);

        let mut backlog = Vec::new();
        for placement in &scenario.level.turrets {
            world::apply(
                &mut world,
                Command::PlaceTurret {
                    tier: placement.tier,
                    position: placement.position,
                },
                &mut backlog,
            );
        }
        for event in &backlog {
            if let Event::TurretPlacementRejected {
                tier,
                position,
                reason,
            } = event
            {
                tracing::warn!(?tier, %position, ?reason, "turret placement rejected");
            }
        }

        Ok(Self {
            world,
            spawning,
            movement: Movement::default(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            notifications: Vec::new(),
            backlog,
        })
    }

    /// Advances the simulation by one tick and returns the events it produced.
    pub fn step(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = mem::take(&mut self.notifications);
        let carried = events.len();
        let mut commands = Vec::new();

        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let enemies = query::enemy_view(&self.world);
        self.spawning
            .handle(&events, &enemies, query::spawners(&self.world), &mut commands);
        self.dispatch(&mut commands, &mut events);

        let enemies = query::enemy_view(&self.world);
        self.movement.handle(
            &events,
            &enemies,
            query::grid(&self.world),
            query::goal_position(&self.world),
            &mut commands,
        );
        self.dispatch(&mut commands, &mut events);

        let enemies = query::enemy_view(&self.world);
        let turrets = query::turret_view(&self.world);
        self.targeting
            .handle(&events, &turrets, &enemies, &mut commands);
        self.dispatch(&mut commands, &mut events);

        let enemies = query::enemy_view(&self.world);
        let projectiles = query::projectile_view(&self.world);
        self.combat
            .handle(&events, &projectiles, &enemies, &mut commands);
        self.dispatch(&mut commands, &mut events);

        let reaped_from = events.len();
        world::apply(&mut self.world, Command::ReapDestroyed, &mut events);
        self.notifications.extend(
            events[reaped_from..]
                .iter()
                .filter(|event| matches!(event, Event::EnemyDestroyed { .. }))
                .cloned(),
        );

        let mut produced = mem::take(&mut self.backlog);
        produced.extend(events.drain(carried..));
        produced
    }

    /// Steps until a terminal outcome is reached or `max_ticks` have run.
    pub fn run_for_ticks(&mut self, max_ticks: u64, dt: Duration) -> RunResult {
        let mut all_events = Vec::new();

        for _ in 0..max_ticks {
            if self.outcome().is_some() {
                break;
            }
            all_events.extend(self.step(dt));
        }

        let outcome = self.outcome();
        if let Some(outcome) = outcome {
            tracing::info!(?outcome, tick = query::tick_index(&self.world), "run finished");
        }

        RunResult {
            outcome,
            final_tick: query::tick_index(&self.world),
            events: all_events,
        }
    }

    /// Terminal state reached so far, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        if query::is_defeated(&self.world) {
            Some(Outcome::Defeated)
        } else if self.spawning.is_finished() && query::enemy_count(&self.world) == 0 {
            Some(Outcome::Cleared)
        } else {
            None
        }
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave spawner.
    #[must_use]
    pub fn spawning(&self) -> &Spawning {
        &self.spawning
    }

    /// Read-only access to the movement controller.
    #[must_use]
    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Read-only access to the targeting engine.
    #[must_use]
    pub fn targeting(&self) -> &TowerTargeting {
        &self.targeting
    }

    fn dispatch(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }
}
