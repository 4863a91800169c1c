#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Outpost.
//!
//! The world owns the baked navigation grid, the enemy roster, placed turrets,
//! projectiles in flight and the goal. [`apply`] is the only mutation entry
//! point; [`query`] exposes read-only views for systems and adapters.

mod config;
mod turrets;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use outpost_core::{
    Command, Damage, DamageTarget, EnemyArchetype, EnemyId, Event, Health, PlacementError,
    ProjectileId, SpawnerId, TurretId, TurretTier,
};
use outpost_navigation::{Grid, GridError};
use thiserror::Error;

pub use config::{GoalConfig, LevelConfig, TurretPlacement};

use turrets::TurretRegistry;

/// Configuration errors surfaced while creating a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The navigation grid could not be built.
    #[error("failed to build the navigation grid")]
    Grid(#[from] GridError),
    /// The goal lies outside the walkable area.
    #[error("goal position {0} lies outside the level")]
    GoalOutOfBounds(Vec2),
    /// The goal was configured without positive health.
    #[error("goal health must be finite and positive, got {0}")]
    InvalidGoalHealth(f32),
    /// A spawner lies outside the walkable area.
    #[error("spawner {index} at {position} lies outside the level")]
    SpawnerOutOfBounds {
        /// Index of the spawner in the level description.
        index: usize,
        /// Configured spawner position.
        position: Vec2,
    },
}

/// Represents the authoritative Outpost world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    goal: Goal,
    spawners: Vec<Vec2>,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
    turrets: TurretRegistry,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world from a level description.
    ///
    /// Turrets listed in the level are not placed here; the caller submits
    /// [`Command::PlaceTurret`] for each so placements are broadcast.
    pub fn new(level: &LevelConfig) -> Result<Self, WorldError> {
        let grid = Grid::build(level.grid, &level.geometry)?;

        if !contains(&grid, level.goal.position) {
            return Err(WorldError::GoalOutOfBounds(level.goal.position));
        }
        if !level.goal.health.is_finite() || level.goal.health <= 0.0 {
            return Err(WorldError::InvalidGoalHealth(level.goal.health));
        }
        for (index, position) in level.spawners.iter().copied().enumerate() {
            if !contains(&grid, position) {
                return Err(WorldError::SpawnerOutOfBounds { index, position });
            }
        }

        tracing::info!(
            spawners = level.spawners.len(),
            goal_health = level.goal.health,
            "world created"
        );

        Ok(Self {
            grid,
            goal: Goal {
                position: level.goal.position,
                health: Health::new(level.goal.health),
                destroyed: false,
            },
            spawners: level.spawners.clone(),
            enemies: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
            turrets: TurretRegistry::new(),
            projectiles: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
            tick_index: 0,
            elapsed: Duration::ZERO,
        })
    }

    fn spawn_enemy(
        &mut self,
        spawner: SpawnerId,
        archetype: EnemyArchetype,
        wave: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(position) = self.spawners.get(spawner.get() as usize).copied() else {
            tracing::warn!(spawner = spawner.get(), "spawn requested from unknown spawner");
            out_events.push(Event::SpawnRejected { spawner });
            return;
        };

        let enemy = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(enemy.get().wrapping_add(1));
        let _ = self.enemies.insert(
            enemy,
            Enemy {
                archetype,
                position,
                health: archetype.max_health(),
                arrived: false,
            },
        );
        out_events.push(Event::EnemySpawned {
            enemy,
            archetype,
            spawner,
            position,
            wave,
        });
    }

    fn place_turret(&mut self, tier: TurretTier, position: Vec2, out_events: &mut Vec<Event>) {
        let rejection = if !contains(&self.grid, position) {
            Some(PlacementError::OutOfBounds)
        } else if !self.grid.node_from_world(position).is_walkable() {
            Some(PlacementError::Impassable)
        } else {
            None
        };

        if let Some(reason) = rejection {
            out_events.push(Event::TurretPlacementRejected {
                tier,
                position,
                reason,
            });
            return;
        }

        let turret = self.turrets.insert(tier, position);
        out_events.push(Event::TurretPlaced {
            turret,
            tier,
            position,
        });
    }

    fn fire_projectile(&mut self, turret: TurretId, target: EnemyId, out_events: &mut Vec<Event>) {
        let target_alive = self
            .enemies
            .get(&target)
            .is_some_and(|enemy| enemy.is_alive());
        let Some(state) = self.turrets.get_mut(turret) else {
            return;
        };
        if !target_alive {
            tracing::debug!(turret = turret.get(), target = target.get(), "fire at dead target ignored");
            return;
        }

        state.active_projectiles = state.active_projectiles.saturating_add(1);
        let projectile = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(projectile.get().wrapping_add(1));
        let _ = self.projectiles.insert(
            projectile,
            Projectile {
                turret,
                target,
                position: state.position,
                speed: state.tier.projectile_speed(),
                damage: state.tier.projectile_damage(),
                spent: false,
            },
        );
        out_events.push(Event::ProjectileFired {
            projectile,
            turret,
            target,
        });
    }

    fn expire_projectile(&mut self, projectile: ProjectileId, hit: bool, out_events: &mut Vec<Event>) {
        let Some(state) = self.projectiles.get_mut(&projectile) else {
            return;
        };
        if state.spent {
            return;
        }
        state.spent = true;
        let turret = state.turret;
        if let Some(owner) = self.turrets.get_mut(turret) {
            owner.active_projectiles = owner.active_projectiles.saturating_sub(1);
        }
        out_events.push(Event::ProjectileExpired {
            projectile,
            turret,
            hit,
        });
    }

    fn resolve_arrival(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if !state.is_alive() {
            return;
        }

        let damage = state.archetype.goal_damage();
        state.arrived = true;
        state.health = Health::ZERO;
        out_events.push(Event::EnemyArrived { enemy, damage });
        self.apply_damage(DamageTarget::Goal, damage, None, out_events);
    }

    /// Subtracts health from a target. Targets already at or below zero
    /// health are left untouched.
    fn apply_damage(
        &mut self,
        target: DamageTarget,
        amount: Damage,
        source: Option<TurretId>,
        out_events: &mut Vec<Event>,
    ) {
        match target {
            DamageTarget::Enemy(enemy) => {
                let Some(state) = self.enemies.get_mut(&enemy) else {
                    return;
                };
                if !state.is_alive() {
                    return;
                }

                state.health = state.health.after(amount);
                let remaining = state.health;
                out_events.push(Event::DamageApplied {
                    target,
                    amount,
                    remaining,
                });

                if remaining.is_depleted() {
                    if let Some(turret) = source {
                        self.turrets.credit_kill(turret);
                    }
                    out_events.push(Event::EnemyKilled { enemy, by: source });
                }
            }
            DamageTarget::Goal => {
                if self.goal.destroyed {
                    return;
                }

                self.goal.health = self.goal.health.after(amount);
                out_events.push(Event::DamageApplied {
                    target,
                    amount,
                    remaining: self.goal.health,
                });

                if self.goal.health.is_depleted() {
                    self.goal.destroyed = true;
                    tracing::info!(tick = self.tick_index, "goal destroyed");
                    out_events.push(Event::GoalDestroyed);
                }
            }
        }
    }

    fn reap_destroyed(&mut self, out_events: &mut Vec<Event>) {
        let destroyed: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|(_, enemy)| !enemy.is_alive())
            .map(|(id, _)| *id)
            .collect();

        for enemy in destroyed {
            let _ = self.enemies.remove(&enemy);
            out_events.push(Event::EnemyDestroyed { enemy });
        }

        self.projectiles.retain(|_, projectile| !projectile.spent);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEnemy {
            spawner,
            archetype,
            wave,
        } => world.spawn_enemy(spawner, archetype, wave, out_events),
        Command::MoveEnemy { enemy, to } => {
            if !to.is_finite() {
                return;
            }
            if let Some(state) = world.enemies.get_mut(&enemy) {
                if state.is_alive() && state.position != to {
                    let from = state.position;
                    state.position = to;
                    out_events.push(Event::EnemyMoved { enemy, from, to });
                }
            }
        }
        Command::ResolveArrival { enemy } => world.resolve_arrival(enemy, out_events),
        Command::PlaceTurret { tier, position } => world.place_turret(tier, position, out_events),
        Command::FireProjectile { turret, target } => {
            world.fire_projectile(turret, target, out_events);
        }
        Command::MoveProjectile { projectile, to } => {
            if !to.is_finite() {
                return;
            }
            if let Some(state) = world.projectiles.get_mut(&projectile) {
                if !state.spent {
                    state.position = to;
                    out_events.push(Event::ProjectileMoved { projectile, to });
                }
            }
        }
        Command::ExpireProjectile { projectile, hit } => {
            world.expire_projectile(projectile, hit, out_events);
        }
        Command::ApplyDamage {
            target,
            amount,
            source,
        } => world.apply_damage(target, amount, source, out_events),
        Command::ReapDestroyed => world.reap_destroyed(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use outpost_core::{
        EnemySnapshot, EnemyView, Health, ProjectileSnapshot, ProjectileView, TurretView,
    };
    use outpost_navigation::Grid;

    use super::World;

    /// Provides read-only access to the baked navigation grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// World position of the goal, or `None` once it has been destroyed.
    #[must_use]
    pub fn goal_position(world: &World) -> Option<Vec2> {
        (!world.goal.destroyed).then_some(world.goal.position)
    }

    /// Remaining goal health.
    #[must_use]
    pub fn goal_health(world: &World) -> Health {
        world.goal.health
    }

    /// Reports whether the goal has been destroyed.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.goal.destroyed
    }

    /// Spawner positions indexed by spawner identifier.
    #[must_use]
    pub fn spawners(world: &World) -> &[Vec2] {
        &world.spawners
    }

    /// Captures the enemy roster, including enemies depleted this tick that
    /// have not been reaped yet.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|(id, enemy)| EnemySnapshot {
                id: *id,
                archetype: enemy.archetype,
                position: enemy.position,
                health: enemy.health,
                speed: enemy.archetype.speed(),
                collision_radius: enemy.archetype.collision_radius(),
                path_check_interval: enemy.archetype.path_check_interval(),
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Number of enemies on the roster.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures all placed turrets.
    #[must_use]
    pub fn turret_view(world: &World) -> TurretView {
        TurretView::from_snapshots(world.turrets.iter().map(|turret| turret.snapshot()).collect())
    }

    /// Captures all projectiles that are still in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let snapshots = world
            .projectiles
            .iter()
            .filter(|(_, projectile)| !projectile.spent)
            .map(|(id, projectile)| ProjectileSnapshot {
                id: *id,
                turret: projectile.turret,
                target: projectile.target,
                position: projectile.position,
                speed: projectile.speed,
                damage: projectile.damage,
            })
            .collect();
        ProjectileView::from_snapshots(snapshots)
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}

#[derive(Clone, Debug)]
struct Goal {
    position: Vec2,
    health: Health,
    destroyed: bool,
}

#[derive(Clone, Debug)]
struct Enemy {
    archetype: EnemyArchetype,
    position: Vec2,
    health: Health,
    arrived: bool,
}

impl Enemy {
    fn is_alive(&self) -> bool {
        !self.arrived && !self.health.is_depleted()
    }
}

#[derive(Clone, Debug)]
struct Projectile {
    turret: TurretId,
    target: EnemyId,
    position: Vec2,
    speed: f32,
    damage: Damage,
    spent: bool,
}

fn contains(grid: &Grid, position: Vec2) -> bool {
    let extent = Vec2::new(grid.width() as f32, grid.height() as f32) * grid.node_diameter();
    position.is_finite()
        && position.x >= 0.0
        && position.y >= 0.0
        && position.x <= extent.x
        && position.y <= extent.y
}
