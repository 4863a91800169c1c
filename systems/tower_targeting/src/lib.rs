#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that maintains per-turret target claims and requests attacks.
//!
//! Each turret runs a cycle every `fire_rate`. A cycle first repairs the claim
//! list, dropping enemies that left the roster, were depleted or moved out of
//! range, then tops it up with the nearest unclaimed enemies in range until
//! `maximum_targets` is reached or the roster is exhausted. Claims survive
//! across cycles while they stay valid. Every claim is attacked once per
//! cycle. A turret without claims re-checks on every tick instead of waiting
//! for its next cycle.
//!
//! Equidistant candidates resolve to roster order, which is ascending
//! [`EnemyId`].

use std::{collections::BTreeMap, time::Duration};

use outpost_core::{
    Cadence, Command, EnemyId, EnemyView, Event, TurretId, TurretSnapshot, TurretView, Vec2,
};

/// Tower targeting system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    cycles: BTreeMap<TurretId, TargetingCycle>,
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every turret's targeting cycle and emits attack commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        turrets: &TurretView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        let mut ticked = false;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => {
                    ticked = true;
                    dt = dt.saturating_add(*step);
                }
                Event::EnemyDestroyed { enemy } => {
                    for cycle in self.cycles.values_mut() {
                        cycle.claims.retain(|claim| claim != enemy);
                    }
                }
                _ => {}
            }
        }

        self.cycles
            .retain(|id, _| turrets.iter().any(|turret| turret.id == *id));

        if !ticked {
            return;
        }

        self.prepare_candidates(enemies);

        for turret in turrets.iter() {
            let cycle = self
                .cycles
                .entry(turret.id)
                .or_insert_with(|| TargetingCycle::new(turret.tier.fire_rate()));

            cycle.cadence.advance(dt);
            if !cycle.cadence.is_due() {
                continue;
            }

            cycle.run(turret, &self.candidates, out);
        }
    }

    /// Enemies currently claimed by the provided turret, in claim order.
    #[must_use]
    pub fn claims(&self, turret: TurretId) -> &[EnemyId] {
        self.cycles
            .get(&turret)
            .map(|cycle| cycle.claims.as_slice())
            .unwrap_or(&[])
    }

    fn prepare_candidates(&mut self, enemies: &EnemyView) {
        self.candidates.clear();
        self.candidates.extend(
            enemies
                .iter()
                .filter(|enemy| !enemy.health.is_depleted())
                .map(|enemy| Candidate {
                    id: enemy.id,
                    position: enemy.position,
                }),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: EnemyId,
    position: Vec2,
}

#[derive(Debug)]
struct TargetingCycle {
    claims: Vec<EnemyId>,
    cadence: Cadence,
}

impl TargetingCycle {
    fn new(fire_rate: Duration) -> Self {
        Self {
            claims: Vec::new(),
            cadence: Cadence::immediate(fire_rate),
        }
    }

    fn run(&mut self, turret: &TurretSnapshot, candidates: &[Candidate], out: &mut Vec<Command>) {
        let range_sq = turret.tier.range() * turret.tier.range();
        let in_range = |candidate: &Candidate| {
            candidate.position.distance_squared(turret.position) <= range_sq
        };

        self.claims.retain(|claim| {
            candidates
                .binary_search_by_key(claim, |candidate| candidate.id)
                .ok()
                .is_some_and(|index| in_range(&candidates[index]))
        });

        while self.claims.len() < turret.tier.maximum_targets() {
            let mut best: Option<(f32, EnemyId)> = None;
            for candidate in candidates {
                if self.claims.contains(&candidate.id) || !in_range(candidate) {
                    continue;
                }
                let distance_sq = candidate.position.distance_squared(turret.position);
                if best.map_or(true, |(nearest, _)| distance_sq < nearest) {
                    best = Some((distance_sq, candidate.id));
                }
            }

            let Some((_, enemy)) = best else {
                break;
            };
            tracing::debug!(turret = turret.id.get(), enemy = enemy.get(), "target acquired");
            self.claims.push(enemy);
        }

        for target in &self.claims {
            out.push(Command::FireProjectile {
                turret: turret.id,
                target: *target,
            });
        }

        if self.claims.is_empty() {
            self.cadence.rearm_after(Duration::ZERO);
        } else {
            self.cadence.rearm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{EnemyArchetype, EnemySnapshot, Health, TurretTier};

    fn turret(tier: TurretTier) -> TurretView {
        TurretView::from_snapshots(vec![TurretSnapshot {
            id: TurretId::new(0),
            tier,
            position: Vec2::ZERO,
            kills: 0,
            active_projectiles: 0,
        }])
    }

    fn enemy(id: u32, position: Vec2) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            archetype: EnemyArchetype::Medium,
            position,
            health: Health::new(100.0),
            speed: 1.0,
            collision_radius: 0.3,
            path_check_interval: Duration::from_secs(1),
        }
    }

    fn tick(ms: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(ms),
        }]
    }

    fn fired(commands: &[Command]) -> Vec<u32> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::FireProjectile { target, .. } => Some(target.get()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn claims_two_nearest_targets_in_range() {
        let tier = TurretTier::Tier2;
        let range = tier.range();
        let distances = [3.0, range + 2.0, 1.0, range + 1.0, 2.0];
        let enemies = EnemyView::from_snapshots(
            distances
                .iter()
                .enumerate()
                .map(|(id, distance)| enemy(id as u32, Vec2::new(*distance, 0.0)))
                .collect(),
        );
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();

        targeting.handle(&tick(16), &turret(tier), &enemies, &mut commands);

        assert_eq!(
            targeting.claims(TurretId::new(0)),
            &[EnemyId::new(2), EnemyId::new(4)]
        );
        assert_eq!(fired(&commands), vec![2, 4]);
    }

    #[test]
    fn equidistant_targets_resolve_by_roster_order() {
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, Vec2::new(0.0, 2.0)),
            enemy(3, Vec2::new(2.0, 0.0)),
            enemy(5, Vec2::new(-2.0, 0.0)),
        ]);
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();

        targeting.handle(&tick(16), &turret(TurretTier::Tier1), &enemies, &mut commands);
        assert_eq!(targeting.claims(TurretId::new(0)), &[EnemyId::new(3)]);
    }

    #[test]
    fn claims_persist_until_invalid() {
        let tier = TurretTier::Tier1;
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();

        let far = EnemyView::from_snapshots(vec![enemy(0, Vec2::new(2.5, 0.0))]);
        targeting.handle(&tick(16), &turret(tier), &far, &mut commands);
        assert_eq!(targeting.claims(TurretId::new(0)), &[EnemyId::new(0)]);

        let closer = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(2.8, 0.0)),
            enemy(1, Vec2::new(0.5, 0.0)),
        ]);
        commands.clear();
        targeting.handle(&tick(1_000), &turret(tier), &closer, &mut commands);
        assert_eq!(targeting.claims(TurretId::new(0)), &[EnemyId::new(0)]);
        assert_eq!(fired(&commands), vec![0]);

        let escaped = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(3.5, 0.0)),
            enemy(1, Vec2::new(0.5, 0.0)),
        ]);
        commands.clear();
        targeting.handle(&tick(1_000), &turret(tier), &escaped, &mut commands);
        assert_eq!(targeting.claims(TurretId::new(0)), &[EnemyId::new(1)]);
    }

    #[test]
    fn cycles_wait_for_fire_rate_while_engaged() {
        let tier = TurretTier::Tier1;
        let enemies = EnemyView::from_snapshots(vec![enemy(0, Vec2::new(1.0, 0.0))]);
        let mut targeting = TowerTargeting::new();
        let mut shots = 0;

        for _ in 0..10 {
            let mut commands = Vec::new();
            targeting.handle(&tick(250), &turret(tier), &enemies, &mut commands);
            shots += fired(&commands).len();
        }

        assert_eq!(shots, 3);
    }

    #[test]
    fn idle_turret_rechecks_every_tick() {
        let tier = TurretTier::Tier1;
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();

        targeting.handle(&tick(16), &turret(tier), &EnemyView::default(), &mut commands);
        assert!(commands.is_empty());

        let arrived = EnemyView::from_snapshots(vec![enemy(9, Vec2::new(1.0, 1.0))]);
        targeting.handle(&tick(16), &turret(tier), &arrived, &mut commands);
        assert_eq!(fired(&commands), vec![9]);
    }

    #[test]
    fn destruction_notifications_prune_claims() {
        let tier = TurretTier::Tier3;
        let enemies = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(1.0, 0.0)),
            enemy(1, Vec2::new(2.0, 0.0)),
        ]);
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();
        targeting.handle(&tick(16), &turret(tier), &enemies, &mut commands);
        assert_eq!(targeting.claims(TurretId::new(0)).len(), 2);

        targeting.handle(
            &[Event::EnemyDestroyed {
                enemy: EnemyId::new(0),
            }],
            &turret(tier),
            &enemies,
            &mut commands,
        );
        assert_eq!(targeting.claims(TurretId::new(0)), &[EnemyId::new(1)]);
    }

    #[test]
    fn depleted_enemies_are_never_claimed() {
        let mut dying = enemy(0, Vec2::new(1.0, 0.0));
        dying.health = Health::ZERO;
        let enemies = EnemyView::from_snapshots(vec![dying]);
        let mut targeting = TowerTargeting::new();
        let mut commands = Vec::new();

        targeting.handle(&tick(16), &turret(TurretTier::Tier1), &enemies, &mut commands);
        assert!(commands.is_empty());
        assert!(targeting.claims(TurretId::new(0)).is_empty());
    }
}
