#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Outpost engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The scheduler submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod cadence;

pub use cadence::Cadence;
pub use glam::Vec2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a spawner emit a new enemy into the level.
    SpawnEnemy {
        /// Spawner responsible for creating the enemy.
        spawner: SpawnerId,
        /// Archetype assigned to the spawned enemy.
        archetype: EnemyArchetype,
        /// Wave number the enemy belongs to.
        wave: u32,
    },
    /// Requests that an enemy relocate to the provided world position.
    MoveEnemy {
        /// Identifier of the enemy being moved.
        enemy: EnemyId,
        /// Destination expressed in world units.
        to: Vec2,
    },
    /// Reports that an enemy exhausted its path and should resolve its end-of-path effect.
    ResolveArrival {
        /// Identifier of the enemy that arrived.
        enemy: EnemyId,
    },
    /// Requests placement of a turret at the provided world position.
    PlaceTurret {
        /// Tier of turret to construct.
        tier: TurretTier,
        /// World position of the turret.
        position: Vec2,
    },
    /// Requests that a turret launch a projectile at a claimed target.
    FireProjectile {
        /// Turret firing the projectile.
        turret: TurretId,
        /// Enemy the projectile tracks.
        target: EnemyId,
    },
    /// Requests that a projectile relocate to the provided world position.
    MoveProjectile {
        /// Identifier of the projectile being moved.
        projectile: ProjectileId,
        /// Destination expressed in world units.
        to: Vec2,
    },
    /// Requests that a projectile be retired.
    ExpireProjectile {
        /// Identifier of the projectile to retire.
        projectile: ProjectileId,
        /// Indicates whether the projectile reached its target.
        hit: bool,
    },
    /// Applies damage through the world's damage sink.
    ApplyDamage {
        /// Entity receiving the damage.
        target: DamageTarget,
        /// Amount of damage to subtract from the target's health.
        amount: Damage,
        /// Turret credited with the damage, if any.
        source: Option<TurretId>,
    },
    /// Removes depleted enemies and retired projectiles from the world.
    ReapDestroyed,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy joined the roster.
    EnemySpawned {
        /// Identifier assigned to the newly spawned enemy.
        enemy: EnemyId,
        /// Archetype of the spawned enemy.
        archetype: EnemyArchetype,
        /// Spawner that produced the enemy.
        spawner: SpawnerId,
        /// World position the enemy occupies after spawning.
        position: Vec2,
        /// Wave number the enemy belongs to.
        wave: u32,
    },
    /// Reports that a spawn request referenced an unknown spawner.
    SpawnRejected {
        /// Spawner named by the rejected request.
        spawner: SpawnerId,
    },
    /// Confirms that an enemy moved.
    EnemyMoved {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Position before the move.
        from: Vec2,
        /// Position after the move.
        to: Vec2,
    },
    /// Reports that an enemy reached the end of its route and damaged the goal.
    EnemyArrived {
        /// Identifier of the arriving enemy.
        enemy: EnemyId,
        /// Damage dealt to the goal.
        damage: Damage,
    },
    /// Reports that damage was subtracted from a target.
    DamageApplied {
        /// Entity that received the damage.
        target: DamageTarget,
        /// Damage that was applied.
        amount: Damage,
        /// Health remaining after the damage.
        remaining: Health,
    },
    /// Reports that an enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Turret credited with the kill, if any.
        by: Option<TurretId>,
    },
    /// Destruction notification fired after an enemy left the roster.
    EnemyDestroyed {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
    },
    /// Announces that the goal's health was depleted.
    GoalDestroyed,
    /// Confirms that a turret was placed.
    TurretPlaced {
        /// Identifier assigned to the turret.
        turret: TurretId,
        /// Tier of the turret.
        tier: TurretTier,
        /// World position of the turret.
        position: Vec2,
    },
    /// Reports that a turret placement request was rejected.
    TurretPlacementRejected {
        /// Tier requested for placement.
        tier: TurretTier,
        /// Position provided in the placement request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Turret that fired the projectile.
        turret: TurretId,
        /// Enemy the projectile tracks.
        target: EnemyId,
    },
    /// Confirms that a projectile moved.
    ProjectileMoved {
        /// Identifier of the projectile that moved.
        projectile: ProjectileId,
        /// Position after the move.
        to: Vec2,
    },
    /// Reports that a projectile was retired.
    ProjectileExpired {
        /// Identifier of the retired projectile.
        projectile: ProjectileId,
        /// Turret that fired the projectile.
        turret: TurretId,
        /// Indicates whether the projectile reached its target.
        hit: bool,
    },
}

/// Entity that may receive damage through the world's damage sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageTarget {
    /// A roster enemy.
    Enemy(EnemyId),
    /// The goal that enemies attempt to reach.
    Goal,
}

/// Reasons a turret placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested position lies outside the level extents.
    OutOfBounds,
    /// The requested position resolves to an impassable node.
    Impassable,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a turret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurretId(u32);

impl TurretId {
    /// Creates a new turret identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a spawner within the level definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnerId(u32);

impl SpawnerId {
    /// Creates a new spawner identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a navigation node expressed as non-negative grid indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: u32,
    y: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Walkability classification of a navigation node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Traversable node.
    Normal,
    /// Node overlapping blocking geometry; never expanded by searches.
    Impassable,
}

/// Remaining hit points of an entity.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Health(f32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Health value that marks an entity as destroyed.
    pub const ZERO: Self = Self(0.0);

    /// Retrieves the raw health value.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }

    /// Reports whether the entity is at or below zero health.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.0 <= 0.0
    }

    /// Returns the health remaining after subtracting the provided damage.
    #[must_use]
    pub fn after(self, damage: Damage) -> Self {
        Self(self.0 - damage.get())
    }
}

/// Amount of health removed by a single damage application.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Damage(f32);

impl Damage {
    /// Creates a new damage amount.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Retrieves the raw damage value.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }
}

/// Size classes of enemies; each class carries its own movement and durability profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyArchetype {
    /// Fast and fragile.
    Small,
    /// Baseline enemy.
    Medium,
    /// Slow and durable.
    Large,
    /// Very slow, very durable, hits the goal hard.
    Huge,
}

impl EnemyArchetype {
    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Small => 2.0,
            Self::Medium => 1.0,
            Self::Large => 0.75,
            Self::Huge => 0.5,
        }
    }

    /// Health assigned at spawn time.
    #[must_use]
    pub const fn max_health(self) -> Health {
        match self {
            Self::Small => Health::new(50.0),
            Self::Medium => Health::new(100.0),
            Self::Large => Health::new(250.0),
            Self::Huge => Health::new(600.0),
        }
    }

    /// Damage dealt to the goal when the enemy completes its route.
    #[must_use]
    pub const fn goal_damage(self) -> Damage {
        match self {
            Self::Small => Damage::new(5.0),
            Self::Medium => Damage::new(10.0),
            Self::Large => Damage::new(25.0),
            Self::Huge => Damage::new(60.0),
        }
    }

    /// Radius used when projectiles test for contact.
    #[must_use]
    pub const fn collision_radius(self) -> f32 {
        match self {
            Self::Small => 0.2,
            Self::Medium => 0.3,
            Self::Large => 0.4,
            Self::Huge => 0.5,
        }
    }

    /// Interval between path re-plans.
    #[must_use]
    pub const fn path_check_interval(self) -> Duration {
        Duration::from_secs(1)
    }
}

/// Upgrade tiers of turrets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurretTier {
    /// Entry-level turret that tracks a single target.
    Tier1,
    /// Turret that splits fire between two targets.
    Tier2,
    /// Long-range turret that engages three targets.
    Tier3,
}

impl TurretTier {
    /// Targeting radius measured in world units.
    #[must_use]
    pub const fn range(self) -> f32 {
        match self {
            Self::Tier1 => 3.0,
            Self::Tier2 => 4.0,
            Self::Tier3 => 5.5,
        }
    }

    /// Period between targeting cycles while at least one target is claimed.
    #[must_use]
    pub const fn fire_rate(self) -> Duration {
        match self {
            Self::Tier1 => Duration::from_millis(1_000),
            Self::Tier2 => Duration::from_millis(800),
            Self::Tier3 => Duration::from_millis(600),
        }
    }

    /// Maximum number of simultaneously claimed targets.
    #[must_use]
    pub const fn maximum_targets(self) -> usize {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Damage carried by each projectile.
    #[must_use]
    pub const fn projectile_damage(self) -> Damage {
        match self {
            Self::Tier1 => Damage::new(20.0),
            Self::Tier2 => Damage::new(30.0),
            Self::Tier3 => Damage::new(45.0),
        }
    }

    /// Projectile speed in world units per second.
    #[must_use]
    pub const fn projectile_speed(self) -> f32 {
        match self {
            Self::Tier1 => 6.0,
            Self::Tier2 => 8.0,
            Self::Tier3 => 10.0,
        }
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Size class of the enemy.
    pub archetype: EnemyArchetype,
    /// Current world position.
    pub position: Vec2,
    /// Remaining health.
    pub health: Health,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Radius used for projectile contact tests.
    pub collision_radius: f32,
    /// Interval between path re-plans.
    pub path_check_interval: Duration,
}

/// Read-only snapshot describing the live enemy roster.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single turret's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TurretSnapshot {
    /// Identifier allocated to the turret by the world.
    pub id: TurretId,
    /// Tier of the turret.
    pub tier: TurretTier,
    /// World position of the turret.
    pub position: Vec2,
    /// Number of enemies killed by this turret's projectiles.
    pub kills: u32,
    /// Number of this turret's projectiles still in flight.
    pub active_projectiles: u32,
}

/// Read-only snapshot describing all placed turrets.
#[derive(Clone, Debug, Default)]
pub struct TurretView {
    snapshots: Vec<TurretSnapshot>,
}

impl TurretView {
    /// Creates a new turret view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TurretSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TurretSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TurretSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Turret that fired the projectile.
    pub turret: TurretId,
    /// Enemy the projectile tracks.
    pub target: EnemyId,
    /// Current world position.
    pub position: Vec2,
    /// Speed in world units per second.
    pub speed: f32,
    /// Damage applied on contact.
    pub damage: Damage,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectiles are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Moves `from` toward `to` by at most `max_step`, never overshooting.
#[must_use]
pub fn move_towards(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return to;
    }
    if max_step <= 0.0 {
        return from;
    }
    from + delta / distance * max_step
}
