#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that flies projectiles toward their targets and resolves hits.

use std::time::Duration;

use outpost_core::{
    move_towards, Command, DamageTarget, EnemyView, Event, ProjectileSnapshot, ProjectileView,
};

/// Projectile resolution system that queues movement, damage and expiry commands.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every projectile toward its target's current position.
    ///
    /// A projectile that comes within its target's collision radius applies
    /// its damage once and expires. A projectile whose target left the roster
    /// or is already depleted expires without effect.
    pub fn handle(
        &mut self,
        events: &[Event],
        projectiles: &ProjectileView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        let mut ticked = false;
        for event in events {
            if let Event::TimeAdvanced { dt: step } = event {
                ticked = true;
                dt = dt.saturating_add(*step);
            }
        }

        if !ticked || projectiles.is_empty() {
            return;
        }

        self.scratch.clear();
        for projectile in projectiles.iter() {
            self.resolve(projectile, enemies, dt);
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn resolve(&mut self, projectile: &ProjectileSnapshot, enemies: &EnemyView, dt: Duration) {
        let target = enemies
            .get(projectile.target)
            .filter(|enemy| !enemy.health.is_depleted());
        let Some(target) = target else {
            self.scratch.push(Command::ExpireProjectile {
                projectile: projectile.id,
                hit: false,
            });
            return;
        };

        let step = projectile.speed * dt.as_secs_f32();
        let position = move_towards(projectile.position, target.position, step);
        if position != projectile.position {
            self.scratch.push(Command::MoveProjectile {
                projectile: projectile.id,
                to: position,
            });
        }

        if position.distance(target.position) <= target.collision_radius {
            tracing::debug!(
                projectile = projectile.id.get(),
                target = target.id.get(),
                "projectile hit"
            );
            self.scratch.push(Command::ApplyDamage {
                target: DamageTarget::Enemy(target.id),
                amount: projectile.damage,
                source: Some(projectile.turret),
            });
            self.scratch.push(Command::ExpireProjectile {
                projectile: projectile.id,
                hit: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{
        Damage, EnemyArchetype, EnemyId, EnemySnapshot, Health, ProjectileId, TurretId, Vec2,
    };

    fn enemy(position: Vec2, health: f32) -> EnemyView {
        EnemyView::from_snapshots(vec![EnemySnapshot {
            id: EnemyId::new(1),
            archetype: EnemyArchetype::Medium,
            position,
            health: Health::new(health),
            speed: 1.0,
            collision_radius: 0.3,
            path_check_interval: Duration::from_secs(1),
        }])
    }

    fn projectile(position: Vec2) -> ProjectileView {
        ProjectileView::from_snapshots(vec![ProjectileSnapshot {
            id: ProjectileId::new(0),
            turret: TurretId::new(2),
            target: EnemyId::new(1),
            position,
            speed: 4.0,
            damage: Damage::new(25.0),
        }])
    }

    fn tick() -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(500),
        }]
    }

    #[test]
    fn projectile_closes_in_on_target() {
        let mut combat = TowerCombat::new();
        let mut commands = Vec::new();
        combat.handle(
            &tick(),
            &projectile(Vec2::ZERO),
            &enemy(Vec2::new(5.0, 0.0), 100.0),
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![Command::MoveProjectile {
                projectile: ProjectileId::new(0),
                to: Vec2::new(2.0, 0.0),
            }]
        );
    }

    #[test]
    fn contact_applies_damage_once_and_expires() {
        let mut combat = TowerCombat::new();
        let mut commands = Vec::new();
        combat.handle(
            &tick(),
            &projectile(Vec2::new(3.5, 0.0)),
            &enemy(Vec2::new(5.0, 0.0), 100.0),
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![
                Command::MoveProjectile {
                    projectile: ProjectileId::new(0),
                    to: Vec2::new(5.0, 0.0),
                },
                Command::ApplyDamage {
                    target: DamageTarget::Enemy(EnemyId::new(1)),
                    amount: Damage::new(25.0),
                    source: Some(TurretId::new(2)),
                },
                Command::ExpireProjectile {
                    projectile: ProjectileId::new(0),
                    hit: true,
                },
            ]
        );
    }

    #[test]
    fn depleted_target_expires_projectile_without_damage() {
        let mut combat = TowerCombat::new();
        let mut commands = Vec::new();
        combat.handle(
            &tick(),
            &projectile(Vec2::new(4.9, 0.0)),
            &enemy(Vec2::new(5.0, 0.0), 0.0),
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![Command::ExpireProjectile {
                projectile: ProjectileId::new(0),
                hit: false,
            }]
        );
    }

    #[test]
    fn missing_target_expires_projectile() {
        let mut combat = TowerCombat::new();
        let mut commands = Vec::new();
        combat.handle(
            &tick(),
            &projectile(Vec2::ZERO),
            &EnemyView::default(),
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![Command::ExpireProjectile {
                projectile: ProjectileId::new(0),
                hit: false,
            }]
        );
    }

    #[test]
    fn nothing_happens_without_time_passing() {
        let mut combat = TowerCombat::new();
        let mut commands = Vec::new();
        combat.handle(
            &[],
            &projectile(Vec2::ZERO),
            &enemy(Vec2::new(0.1, 0.0), 100.0),
            &mut commands,
        );
        assert!(commands.is_empty());
    }
}
