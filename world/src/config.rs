//! Static level description consumed when the world is created.

use glam::Vec2;
use outpost_core::TurretTier;
use outpost_navigation::{BlockingGeometry, GridSettings};
use serde::{Deserialize, Serialize};

/// Everything required to build a level: walkable area, walls, goal, spawners
/// and pre-placed turrets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Walkable area and node size.
    pub grid: GridSettings,
    /// Blocking shapes baked into the grid.
    #[serde(default)]
    pub geometry: BlockingGeometry,
    /// Goal that enemies march toward.
    pub goal: GoalConfig,
    /// World positions enemies enter from, indexed by `SpawnerId`.
    #[serde(default)]
    pub spawners: Vec<Vec2>,
    /// Turrets placed when the level starts.
    #[serde(default)]
    pub turrets: Vec<TurretPlacement>,
}

/// Goal position and durability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    /// World position of the goal.
    pub position: Vec2,
    /// Starting health.
    #[serde(default = "default_goal_health")]
    pub health: f32,
}

fn default_goal_health() -> f32 {
    100.0
}

/// Turret requested at level start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretPlacement {
    /// Tier of the turret.
    pub tier: TurretTier,
    /// World position of the turret.
    pub position: Vec2,
}
