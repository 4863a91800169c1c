#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave spawning system responsible for emitting enemy spawn commands.
//!
//! After an initial delay each wave spawns its groups in order, one enemy per
//! spawn delay. Once the last enemy is out the wave stays active until the
//! roster is empty, then the next wave starts after the wave interval.

use std::time::Duration;

use outpost_core::{Cadence, Command, EnemyArchetype, EnemyView, Event, SpawnerId, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Number of enemies of one archetype spawned per wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Archetype to spawn.
    pub archetype: EnemyArchetype,
    /// Number of enemies spawned each wave.
    pub count: u32,
}

/// Serializable wave description with timings in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Delay before the first wave.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f32,
    /// Delay between consecutive spawns within a wave.
    #[serde(default = "default_spawn_delay_secs")]
    pub spawn_delay_secs: f32,
    /// Pause between a cleared wave and the next one.
    #[serde(default = "default_wave_interval_secs")]
    pub wave_interval_secs: f32,
    /// Stops after this many waves when set.
    #[serde(default)]
    pub max_waves: Option<u32>,
    /// Groups spawned each wave, in order.
    pub groups: Vec<SpawnGroup>,
}

fn default_initial_delay_secs() -> f32 {
    DEFAULT_INITIAL_DELAY.as_secs_f32()
}

fn default_spawn_delay_secs() -> f32 {
    0.5
}

fn default_wave_interval_secs() -> f32 {
    5.0
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            spawn_delay_secs: default_spawn_delay_secs(),
            wave_interval_secs: default_wave_interval_secs(),
            max_waves: None,
            groups: vec![SpawnGroup {
                archetype: EnemyArchetype::Medium,
                count: 10,
            }],
        }
    }
}

impl WaveConfig {
    /// Validates the timings and builds a spawning configuration.
    pub fn to_config(&self, rng_seed: u64) -> Result<Config, ConfigError> {
        let initial_delay = seconds("initial_delay_secs", self.initial_delay_secs)?;
        let spawn_delay = seconds("spawn_delay_secs", self.spawn_delay_secs)?;
        let wave_interval = seconds("wave_interval_secs", self.wave_interval_secs)?;

        let mut config = Config::new(self.groups.clone(), spawn_delay, wave_interval, rng_seed)
            .with_initial_delay(initial_delay);
        if config.enemies_per_wave() == 0 {
            return Err(ConfigError::NoEnemies);
        }
        if let Some(max_waves) = self.max_waves {
            config = config.with_max_waves(max_waves);
        }
        Ok(config)
    }
}

fn seconds(field: &'static str, value: f32) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidDelay { field, value });
    }
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidDelay { field, value })
}

/// Errors raised while validating a [`WaveConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A delay was negative or not finite.
    #[error("{field} must be a finite, non-negative number of seconds, got {value}")]
    InvalidDelay {
        /// Name of the offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// No group spawns any enemy.
    #[error("waves must spawn at least one enemy")]
    NoEnemies,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    groups: Vec<SpawnGroup>,
    initial_delay: Duration,
    spawn_delay: Duration,
    wave_interval: Duration,
    max_waves: Option<u32>,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with a one second initial delay and no wave limit.
    #[must_use]
    pub fn new(
        groups: Vec<SpawnGroup>,
        spawn_delay: Duration,
        wave_interval: Duration,
        rng_seed: u64,
    ) -> Self {
        Self {
            groups,
            initial_delay: DEFAULT_INITIAL_DELAY,
            spawn_delay,
            wave_interval,
            max_waves: None,
            rng_seed,
        }
    }

    /// Overrides the delay before the first wave.
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Stops spawning after the provided number of waves.
    #[must_use]
    pub fn with_max_waves(mut self, max_waves: u32) -> Self {
        self.max_waves = Some(max_waves);
        self
    }

    /// Total number of enemies spawned each wave.
    #[must_use]
    pub fn enemies_per_wave(&self) -> u32 {
        self.groups
            .iter()
            .fold(0_u32, |total, group| total.saturating_add(group.count))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Warmup,
    Spawning { group: usize, spawned: u32 },
    Draining,
    Interval,
    Finished,
}

/// Pure system that deterministically emits spawn commands wave by wave.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    phase: Phase,
    timer: Cadence,
    wave: u32,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            phase: Phase::Warmup,
            timer: Cadence::delayed(config.initial_delay),
            wave: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Consumes events and the live roster to emit spawn commands.
    ///
    /// At most one enemy is spawned per tick.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        spawners: &[Vec2],
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        let mut ticked = false;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                ticked = true;
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if !ticked || spawners.is_empty() {
            return;
        }

        self.timer.advance(accumulated);

        loop {
            match self.phase {
                Phase::Finished => break,
                Phase::Warmup | Phase::Interval => {
                    if !self.timer.is_due() {
                        break;
                    }
                    if self.config.enemies_per_wave() == 0 {
                        tracing::warn!("wave configuration spawns no enemies; stopping");
                        self.phase = Phase::Finished;
                        break;
                    }
                    self.start_wave();
                }
                Phase::Spawning { group, spawned } => {
                    if !self.timer.is_due() {
                        break;
                    }
                    let Some((group, spawned)) = self.next_slot(group, spawned) else {
                        self.phase = Phase::Draining;
                        continue;
                    };

                    let archetype = self.config.groups[group].archetype;
                    let spawner = self.select_spawner(spawners);
                    out.push(Command::SpawnEnemy {
                        spawner,
                        archetype,
                        wave: self.wave,
                    });

                    self.timer.rearm_after(self.config.spawn_delay);
                    self.phase = if self.next_slot(group, spawned + 1).is_some() {
                        Phase::Spawning {
                            group,
                            spawned: spawned + 1,
                        }
                    } else {
                        Phase::Draining
                    };
                    break;
                }
                Phase::Draining => {
                    if !self.timer.is_due() || !enemies.is_empty() {
                        break;
                    }
                    if self
                        .config
                        .max_waves
                        .is_some_and(|max_waves| self.wave >= max_waves)
                    {
                        tracing::info!(waves = self.wave, "all waves cleared");
                        self.phase = Phase::Finished;
                        break;
                    }
                    tracing::debug!(wave = self.wave, "wave cleared");
                    self.phase = Phase::Interval;
                    self.timer.rearm_after(self.config.wave_interval);
                }
            }
        }
    }

    /// Reports whether a wave is spawning or still has enemies alive.
    #[must_use]
    pub fn wave_active(&self) -> bool {
        matches!(self.phase, Phase::Spawning { .. } | Phase::Draining)
    }

    /// Number of the current or most recent wave; zero before the first wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Reports whether the configured number of waves has been cleared.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    fn start_wave(&mut self) {
        self.wave = self.wave.saturating_add(1);
        self.phase = Phase::Spawning {
            group: 0,
            spawned: 0,
        };
        self.timer.rearm_after(Duration::ZERO);
        tracing::info!(
            wave = self.wave,
            enemies = self.config.enemies_per_wave(),
            "wave started"
        );
    }

    fn next_slot(&self, mut group: usize, mut spawned: u32) -> Option<(usize, u32)> {
        while let Some(entry) = self.config.groups.get(group) {
            if spawned < entry.count {
                return Some((group, spawned));
            }
            group += 1;
            spawned = 0;
        }
        None
    }

    fn select_spawner(&mut self, spawners: &[Vec2]) -> SpawnerId {
        let index = self.rng.gen_range(0..spawners.len());
        SpawnerId::new(index as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{EnemyId, EnemySnapshot, Health};

    fn config() -> Config {
        Config::new(
            vec![
                SpawnGroup {
                    archetype: EnemyArchetype::Small,
                    count: 2,
                },
                SpawnGroup {
                    archetype: EnemyArchetype::Large,
                    count: 1,
                },
            ],
            Duration::from_millis(500),
            Duration::from_secs(2),
            7,
        )
    }

    fn tick() -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(250),
        }]
    }

    fn occupied() -> EnemyView {
        EnemyView::from_snapshots(vec![EnemySnapshot {
            id: EnemyId::new(0),
            archetype: EnemyArchetype::Small,
            position: Vec2::ZERO,
            health: Health::new(1.0),
            speed: 1.0,
            collision_radius: 0.2,
            path_check_interval: Duration::from_secs(1),
        }])
    }

    fn spawned(commands: &[Command]) -> Vec<(EnemyArchetype, u32)> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy {
                    archetype, wave, ..
                } => Some((*archetype, *wave)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn waves_follow_initial_delay_spawn_delay_and_interval() {
        let mut spawning = Spawning::new(config());
        let spawners = [Vec2::new(0.5, 0.5)];
        let mut log = Vec::new();

        for tick_index in 1..=18_u32 {
            let mut commands = Vec::new();
            spawning.handle(&tick(), &EnemyView::default(), &spawners, &mut commands);
            for entry in spawned(&commands) {
                log.push((tick_index, entry));
            }
        }

        assert_eq!(
            log,
            vec![
                (4, (EnemyArchetype::Small, 1)),
                (6, (EnemyArchetype::Small, 1)),
                (8, (EnemyArchetype::Large, 1)),
                (18, (EnemyArchetype::Small, 2)),
            ]
        );
    }

    #[test]
    fn wave_stays_active_until_roster_is_empty() {
        let mut spawning = Spawning::new(config().with_initial_delay(Duration::ZERO));
        let spawners = [Vec2::ZERO];
        let mut commands = Vec::new();
        assert!(!spawning.wave_active());

        for _ in 0..20 {
            spawning.handle(&tick(), &occupied(), &spawners, &mut commands);
        }
        assert_eq!(spawned(&commands).len(), 3);
        assert!(spawning.wave_active());
        assert_eq!(spawning.wave(), 1);

        spawning.handle(&tick(), &EnemyView::default(), &spawners, &mut commands);
        assert!(!spawning.wave_active());
        assert_eq!(spawning.wave(), 1);
    }

    #[test]
    fn stops_after_max_waves() {
        let mut spawning = Spawning::new(
            config()
                .with_initial_delay(Duration::ZERO)
                .with_max_waves(2),
        );
        let spawners = [Vec2::ZERO];
        let mut commands = Vec::new();

        for _ in 0..200 {
            spawning.handle(&tick(), &EnemyView::default(), &spawners, &mut commands);
        }

        assert!(spawning.is_finished());
        assert_eq!(spawning.wave(), 2);
        assert_eq!(spawned(&commands).len(), 6);
    }

    #[test]
    fn spawner_selection_is_seeded() {
        let spawners = [Vec2::ZERO, Vec2::ONE, Vec2::new(2.0, 2.0)];
        let run = || {
            let mut spawning = Spawning::new(
                config()
                    .with_initial_delay(Duration::ZERO)
                    .with_max_waves(4),
            );
            let mut commands = Vec::new();
            for _ in 0..200 {
                spawning.handle(&tick(), &EnemyView::default(), &spawners, &mut commands);
            }
            commands
                .into_iter()
                .filter_map(|command| match command {
                    Command::SpawnEnemy { spawner, .. } => Some(spawner.get()),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first.len(), 12);
        assert_eq!(first, run());
        assert!(first.iter().all(|index| (*index as usize) < spawners.len()));
    }

    #[test]
    fn nothing_spawns_without_spawners_or_time() {
        let mut spawning = Spawning::new(config().with_initial_delay(Duration::ZERO));
        let mut commands = Vec::new();
        spawning.handle(&tick(), &EnemyView::default(), &[], &mut commands);
        spawning.handle(&[], &EnemyView::default(), &[Vec2::ZERO], &mut commands);
        assert!(commands.is_empty());
        assert_eq!(spawning.wave(), 0);
    }

    #[test]
    fn empty_waves_finish_instead_of_cycling() {
        let mut spawning = Spawning::new(
            Config::new(Vec::new(), Duration::ZERO, Duration::ZERO, 1)
                .with_initial_delay(Duration::ZERO),
        );
        let mut commands = Vec::new();

        spawning.handle(&tick(), &EnemyView::default(), &[Vec2::ZERO], &mut commands);
        spawning.handle(&tick(), &EnemyView::default(), &[Vec2::ZERO], &mut commands);

        assert!(commands.is_empty());
        assert!(spawning.is_finished());
        assert_eq!(spawning.wave(), 0);
    }

    #[test]
    fn wave_config_without_enemies_is_rejected() {
        let empty = WaveConfig {
            wave_interval_secs: 0.0,
            groups: Vec::new(),
            ..WaveConfig::default()
        };
        assert_eq!(empty.to_config(1).unwrap_err(), ConfigError::NoEnemies);

        let zero_counts = WaveConfig {
            groups: vec![SpawnGroup {
                archetype: EnemyArchetype::Medium,
                count: 0,
            }],
            ..WaveConfig::default()
        };
        assert_eq!(zero_counts.to_config(1).unwrap_err(), ConfigError::NoEnemies);
    }

    #[test]
    fn wave_config_parses_and_validates() {
        let config: WaveConfig = toml::from_str(
            r#"
                spawn_delay_secs = 0.25
                max_waves = 3

                [[groups]]
                archetype = "small"
                count = 4

                [[groups]]
                archetype = "huge"
                count = 1
            "#,
        )
        .expect("wave config parses");

        assert_eq!(config.initial_delay_secs, 1.0);
        let built = config.to_config(1).expect("valid timings");
        assert_eq!(built.enemies_per_wave(), 5);

        let invalid = WaveConfig {
            wave_interval_secs: -1.0,
            ..WaveConfig::default()
        };
        assert_eq!(
            invalid.to_config(1).unwrap_err(),
            ConfigError::InvalidDelay {
                field: "wave_interval_secs",
                value: -1.0,
            }
        );
    }
}
