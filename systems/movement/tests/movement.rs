use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    mem,
    time::Duration,
};

use outpost_core::{
    Command, Damage, DamageTarget, EnemyArchetype, EnemyId, Event, Health, SpawnerId, Vec2,
};
use outpost_navigation::{BlockingGeometry, Circle, GridSettings, Rect};
use outpost_system_movement::{AgentState, Movement};
use outpost_world::{self as world, query, GoalConfig, LevelConfig, World};

fn open_level(goal_health: f32) -> LevelConfig {
    LevelConfig {
        grid: GridSettings::new(Vec2::new(5.0, 5.0), 0.5),
        geometry: BlockingGeometry::new(),
        goal: GoalConfig {
            position: Vec2::new(4.5, 0.5),
            health: goal_health,
        },
        spawners: vec![Vec2::new(0.5, 0.5)],
        turrets: Vec::new(),
    }
}

/// Drives one tick through the world and the movement system.
///
/// Destruction notifications raised by the reap are returned so the caller can
/// hand them to the next tick.
fn pump_tick(
    world: &mut World,
    movement: &mut Movement,
    carried: Vec<Event>,
    log: &mut Vec<Event>,
) -> Vec<Event> {
    let mut events = carried;
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        &mut events,
    );

    let enemies = query::enemy_view(world);
    let mut commands = Vec::new();
    movement.handle(
        &events,
        &enemies,
        query::grid(world),
        query::goal_position(world),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }

    let mut reaped = Vec::new();
    world::apply(world, Command::ReapDestroyed, &mut reaped);
    log.extend(mem::take(&mut events));
    log.extend(reaped.iter().cloned());
    reaped
}

fn spawn(world: &mut World, spawner: u32, archetype: EnemyArchetype) -> EnemyId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnEnemy {
            spawner: SpawnerId::new(spawner),
            archetype,
            wave: 1,
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("enemy spawned")
}

#[test]
fn enemy_walks_to_the_goal_and_is_dropped_after_reaping() {
    let mut world = World::new(&open_level(100.0)).expect("world builds");
    let mut movement = Movement::default();
    let enemy = spawn(&mut world, 0, EnemyArchetype::Medium);
    let mut log = Vec::new();
    let mut carried = Vec::new();

    for _ in 0..20 {
        carried = pump_tick(&mut world, &mut movement, carried, &mut log);
        if query::enemy_count(&world) == 0 {
            break;
        }
    }

    assert!(log.contains(&Event::EnemyArrived {
        enemy,
        damage: EnemyArchetype::Medium.goal_damage(),
    }));
    assert!(log.contains(&Event::EnemyDestroyed { enemy }));
    assert_eq!(query::goal_health(&world), Health::new(90.0));
    assert_eq!(movement.state(enemy), Some(AgentState::Arrived));

    let final_moves: Vec<Vec2> = log
        .iter()
        .filter_map(|event| match event {
            Event::EnemyMoved { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert!(final_moves.iter().all(|to| (to.y - 0.5).abs() < f32::EPSILON));

    let _ = pump_tick(&mut world, &mut movement, carried, &mut log);
    assert_eq!(movement.state(enemy), None);
}

#[test]
fn enemy_holds_position_without_a_goal() {
    let mut world = World::new(&open_level(5.0)).expect("world builds");
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ApplyDamage {
            target: DamageTarget::Goal,
            amount: Damage::new(10.0),
            source: None,
        },
        &mut events,
    );
    assert!(events.contains(&Event::GoalDestroyed));

    let mut movement = Movement::default();
    let enemy = spawn(&mut world, 0, EnemyArchetype::Small);
    let mut log = Vec::new();
    let mut carried = Vec::new();
    for _ in 0..3 {
        carried = pump_tick(&mut world, &mut movement, carried, &mut log);
    }

    assert_eq!(movement.state(enemy), Some(AgentState::Lost));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::EnemyMoved { .. })));
    let position = query::enemy_view(&world).get(enemy).expect("enemy").position;
    assert_eq!(position, Vec2::new(0.5, 0.5));
}

#[test]
fn sealed_spawner_resolves_as_an_immediate_arrival() {
    let level = LevelConfig {
        geometry: BlockingGeometry::new().with_rect(Rect::new(
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 5.0),
        )),
        ..open_level(100.0)
    };
    let mut world = World::new(&level).expect("world builds");
    let mut movement = Movement::default();
    let enemy = spawn(&mut world, 0, EnemyArchetype::Large);
    let mut log = Vec::new();

    let _ = pump_tick(&mut world, &mut movement, Vec::new(), &mut log);

    assert_eq!(movement.state(enemy), Some(AgentState::Arrived));
    assert!(log.contains(&Event::EnemyArrived {
        enemy,
        damage: EnemyArchetype::Large.goal_damage(),
    }));
}

#[test]
fn deterministic_replay_matches_between_runs() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> u64 {
    let level = LevelConfig {
        grid: GridSettings::new(Vec2::new(12.0, 8.0), 0.5),
        geometry: BlockingGeometry::new()
            .with_rect(Rect::new(Vec2::new(5.0, 1.0), Vec2::new(6.0, 8.0)))
            .with_circle(Circle {
                center: Vec2::new(8.5, 3.5),
                radius: 1.0,
            }),
        goal: GoalConfig {
            position: Vec2::new(11.5, 6.5),
            health: 1_000.0,
        },
        spawners: vec![Vec2::new(0.5, 0.5), Vec2::new(0.5, 7.5)],
        turrets: Vec::new(),
    };
    let mut world = World::new(&level).expect("world builds");
    let mut movement = Movement::default();
    let mut log = Vec::new();
    let mut carried = Vec::new();

    let script = [
        (0, 0, EnemyArchetype::Small),
        (2, 1, EnemyArchetype::Medium),
        (3, 0, EnemyArchetype::Huge),
        (7, 1, EnemyArchetype::Large),
    ];
    for tick in 0..80 {
        for (_, spawner, archetype) in script.iter().filter(|(at, _, _)| *at == tick) {
            let _ = spawn(&mut world, *spawner, *archetype);
        }
        carried = pump_tick(&mut world, &mut movement, carried, &mut log);
    }

    let mut hasher = DefaultHasher::new();
    for event in &log {
        format!("{event:?}").hash(&mut hasher);
    }
    query::goal_health(&world).get().to_bits().hash(&mut hasher);
    hasher.finish()
}
