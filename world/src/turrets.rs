//! Authoritative turret state management utilities.

use std::collections::BTreeMap;

use glam::Vec2;
use outpost_core::{TurretId, TurretSnapshot, TurretTier};

/// Turret stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TurretState {
    /// Identifier allocated by the world for the turret.
    pub(crate) id: TurretId,
    /// Tier of the turret.
    pub(crate) tier: TurretTier,
    /// World position of the turret.
    pub(crate) position: Vec2,
    /// Enemies killed by this turret's projectiles.
    pub(crate) kills: u32,
    /// Projectiles fired by this turret that have not expired.
    pub(crate) active_projectiles: u32,
}

impl TurretState {
    pub(crate) fn snapshot(&self) -> TurretSnapshot {
        TurretSnapshot {
            id: self.id,
            tier: self.tier,
            position: self.position,
            kills: self.kills,
            active_projectiles: self.active_projectiles,
        }
    }
}

/// Registry that stores turrets and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TurretRegistry {
    entries: BTreeMap<TurretId, TurretState>,
    next_turret_id: TurretId,
}

impl TurretRegistry {
    /// Creates an empty turret registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_turret_id: TurretId::new(0),
        }
    }

    /// Stores a new turret and returns its identifier.
    pub(crate) fn insert(&mut self, tier: TurretTier, position: Vec2) -> TurretId {
        let id = self.next_turret_id;
        self.next_turret_id = TurretId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            TurretState {
                id,
                tier,
                position,
                kills: 0,
                active_projectiles: 0,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: TurretId) -> Option<&mut TurretState> {
        self.entries.get_mut(&id)
    }

    /// Iterates turrets in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TurretState> {
        self.entries.values()
    }

    pub(crate) fn credit_kill(&mut self, id: TurretId) {
        if let Some(turret) = self.entries.get_mut(&id) {
            turret.kills = turret.kills.saturating_add(1);
        }
    }
}
