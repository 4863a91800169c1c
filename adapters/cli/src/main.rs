#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for outpost scenarios.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Vec2;
use outpost_core::Event;
use outpost_navigation::{Circle, Grid};
use outpost_simulation::{RunResult, ScenarioConfig, Simulation};
use outpost_world::query;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Keeps scattered obstacles away from spawners, the goal and turrets.
const OBSTACLE_CLEARANCE: f32 = 1.5;
const OBSTACLE_ATTEMPTS_PER_PILLAR: usize = 32;

/// Runs a tower-defence scenario without rendering and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "outpost", version, about)]
struct Args {
    /// Scenario TOML file; the built-in scenario is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 3_000)]
    ticks: u64,

    /// Simulated duration of one tick in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Overrides the scenario's RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of unit pillars scattered over the level before the run.
    #[arg(long, default_value_t = 0)]
    obstacles: usize,

    /// Tracing filter directive; falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    if args.tick_ms == 0 {
        bail!("--tick-ms must be greater than zero");
    }

    let mut scenario = load_scenario(args.scenario.as_ref())?;
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if args.obstacles > 0 {
        let placed = scatter_obstacles(&mut scenario, args.obstacles);
        tracing::info!(requested = args.obstacles, placed, "scattered obstacles");
    }

    let mut simulation = Simulation::new(&scenario).context("failed to build scenario")?;
    let result = simulation.run_for_ticks(args.ticks, Duration::from_millis(args.tick_ms));

    println!("{}", summarize(&simulation, &result));
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn load_scenario(path: Option<&PathBuf>) -> Result<ScenarioConfig> {
    let Some(path) = path else {
        return toml::from_str(DEFAULT_SCENARIO).context("failed to parse built-in scenario");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse scenario toml at {}", path.display()))
}

/// Adds up to `count` pillars on walkable node centres and returns how many were placed.
fn scatter_obstacles(scenario: &mut ScenarioConfig, count: usize) -> usize {
    let level = &mut scenario.level;
    let grid = match Grid::build(level.grid, &level.geometry) {
        Ok(grid) => grid,
        Err(error) => {
            tracing::warn!(%error, "cannot scatter obstacles over an invalid grid");
            return 0;
        }
    };
    let centres: Vec<Vec2> = grid
        .nodes()
        .iter()
        .filter(|node| node.is_walkable())
        .map(|node| node.position())
        .collect();
    if centres.is_empty() {
        return 0;
    }

    let mut keep_clear: Vec<Vec2> = level.spawners.clone();
    keep_clear.push(level.goal.position);
    keep_clear.extend(level.turrets.iter().map(|turret| turret.position));

    let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let mut placed = 0;
    for _ in 0..count.saturating_mul(OBSTACLE_ATTEMPTS_PER_PILLAR) {
        if placed == count {
            break;
        }
        let center = centres[rng.gen_range(0..centres.len())];
        let crowded = keep_clear
            .iter()
            .any(|point| point.distance(center) < OBSTACLE_CLEARANCE);
        if crowded {
            continue;
        }
        level.geometry.circles.push(Circle {
            center,
            radius: grid.node_radius(),
        });
        keep_clear.push(center);
        placed += 1;
    }
    placed
}

fn summarize(simulation: &Simulation, result: &RunResult) -> String {
    let world = simulation.world();
    let mut spawned = 0;
    let mut killed = 0;
    let mut arrived = 0;
    let mut shots = 0;
    for event in &result.events {
        match event {
            Event::EnemySpawned { .. } => spawned += 1,
            Event::EnemyKilled { by: Some(_), .. } => killed += 1,
            Event::EnemyArrived { .. } => arrived += 1,
            Event::ProjectileFired { .. } => shots += 1,
            _ => {}
        }
    }

    let outcome = match result.outcome {
        Some(outcome) => format!("{outcome:?}"),
        None => "undecided".to_owned(),
    };

    let mut lines = vec![
        format!(
            "outcome: {outcome} after {} ticks ({:.1}s)",
            result.final_tick,
            query::elapsed(world).as_secs_f32()
        ),
        format!(
            "waves: {} | enemies spawned {spawned}, killed {killed}, arrived {arrived}, alive {}",
            simulation.spawning().wave(),
            query::enemy_count(world)
        ),
        format!(
            "goal health: {:.1} | projectiles fired: {shots}",
            query::goal_health(world).get()
        ),
    ];
    for turret in query::turret_view(world).iter() {
        lines.push(format!(
            "turret {} {:?} at ({:.1}, {:.1}): {} kills",
            turret.id.get(),
            turret.tier,
            turret.position.x,
            turret.position.y,
            turret.kills
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_scenario() -> ScenarioConfig {
        load_scenario(None).expect("built-in scenario parses")
    }

    #[test]
    fn built_in_scenario_builds_a_simulation() {
        let scenario = default_scenario();
        assert_eq!(scenario.level.turrets.len(), 3);
        assert_eq!(scenario.waves.max_waves, Some(3));

        let simulation = Simulation::new(&scenario).expect("simulation builds");
        assert_eq!(query::spawners(simulation.world()).len(), 2);
    }

    #[test]
    fn scattered_obstacles_are_seeded_and_keep_clear_of_entities() {
        let mut first = default_scenario();
        let mut second = default_scenario();
        let existing = first.level.geometry.circles.len();

        let placed = scatter_obstacles(&mut first, 6);
        assert_eq!(placed, 6);
        assert_eq!(scatter_obstacles(&mut second, 6), placed);
        assert_eq!(first.level.geometry, second.level.geometry);

        let new_pillars = &first.level.geometry.circles[existing..];
        for pillar in new_pillars {
            assert!(pillar.center.distance(first.level.goal.position) >= OBSTACLE_CLEARANCE);
            for spawner in &first.level.spawners {
                assert!(pillar.center.distance(*spawner) >= OBSTACLE_CLEARANCE);
            }
        }
    }

    #[test]
    fn scattered_obstacles_sit_on_node_centres_of_coarse_grids() {
        let mut scenario = default_scenario();
        scenario.level.grid.node_radius = 1.0;
        let existing = scenario.level.geometry.circles.len();
        let grid = Grid::build(scenario.level.grid, &scenario.level.geometry)
            .expect("coarse grid builds");

        let placed = scatter_obstacles(&mut scenario, 4);
        assert!(placed > 0);

        for pillar in &scenario.level.geometry.circles[existing..] {
            assert_eq!(pillar.radius, 1.0);
            assert!(grid
                .nodes()
                .iter()
                .any(|node| node.position() == pillar.center && node.is_walkable()));
        }
    }

    #[test]
    fn summary_reports_outcome_and_turrets() {
        let scenario = default_scenario();
        let mut simulation = Simulation::new(&scenario).expect("simulation builds");
        let result = simulation.run_for_ticks(20, Duration::from_millis(50));

        let summary = summarize(&simulation, &result);
        assert!(summary.starts_with("outcome: undecided after 20 ticks"));
        assert_eq!(summary.lines().filter(|line| line.starts_with("turret ")).count(), 3);
    }
}
