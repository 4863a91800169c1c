#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that re-plans enemy paths and steers enemies
//! along them.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use outpost_core::{move_towards, Cadence, Command, EnemyId, EnemySnapshot, EnemyView, Event, Vec2};
use outpost_navigation::{Grid, PathResult, Pathfinder, Waypoint};

/// Lifecycle of a single enemy as seen by the movement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Registered but no search has been attempted yet.
    Idle,
    /// A search is due or the last one failed; the agent holds position.
    PathPending,
    /// The agent is travelling along its current path.
    Following,
    /// The path was exhausted; the end-of-path effect has been requested.
    Arrived,
    /// There is no goal to travel to.
    Lost,
    /// The enemy left the roster.
    Destroyed,
}

#[derive(Debug)]
struct Agent {
    state: AgentState,
    replan: Cadence,
    waypoints: VecDeque<Waypoint>,
}

impl Agent {
    fn new(path_check_interval: Duration) -> Self {
        Self {
            state: AgentState::Idle,
            replan: Cadence::immediate(path_check_interval),
            waypoints: VecDeque::new(),
        }
    }
}

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    agents: BTreeMap<EnemyId, Agent>,
    pathfinder: Pathfinder,
}

impl Movement {
    /// Consumes world events and the live roster to emit movement commands.
    ///
    /// Each agent re-plans on its first tick and every `path_check_interval`
    /// afterwards, replacing its previous path wholesale. Between re-plans it
    /// consumes waypoints that lie within the grid's node radius and moves
    /// toward the next one by `speed * dt`. An exhausted path resolves the
    /// agent as arrived.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        grid: &Grid,
        goal: Option<Vec2>,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => dt = dt.saturating_add(*step),
                Event::EnemyDestroyed { enemy } => {
                    if let Some(agent) = self.agents.get_mut(enemy) {
                        agent.state = AgentState::Destroyed;
                        agent.waypoints.clear();
                    }
                }
                _ => {}
            }
        }

        let ticked = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if ticked {
            for enemy in enemies.iter() {
                if enemy.health.is_depleted() {
                    continue;
                }
                let agent = self
                    .agents
                    .entry(enemy.id)
                    .or_insert_with(|| Agent::new(enemy.path_check_interval));
                advance_agent(agent, &mut self.pathfinder, enemy, grid, goal, dt, out);
            }
        }

        self.agents.retain(|id, agent| {
            agent.state != AgentState::Destroyed || enemies.get(*id).is_some()
        });
    }

    /// Current lifecycle state of the provided enemy.
    #[must_use]
    pub fn state(&self, enemy: EnemyId) -> Option<AgentState> {
        self.agents.get(&enemy).map(|agent| agent.state)
    }

    /// Number of waypoints left on the enemy's current path.
    #[must_use]
    pub fn remaining_waypoints(&self, enemy: EnemyId) -> Option<usize> {
        self.agents.get(&enemy).map(|agent| agent.waypoints.len())
    }
}

fn advance_agent(
    agent: &mut Agent,
    pathfinder: &mut Pathfinder,
    enemy: &EnemySnapshot,
    grid: &Grid,
    goal: Option<Vec2>,
    dt: Duration,
    out: &mut Vec<Command>,
) {
    match agent.state {
        AgentState::Arrived | AgentState::Destroyed => return,
        AgentState::Idle | AgentState::PathPending | AgentState::Following | AgentState::Lost => {}
    }

    let Some(goal) = goal else {
        agent.state = AgentState::Lost;
        agent.waypoints.clear();
        return;
    };

    if agent.replan.poll(dt) {
        match pathfinder.calculate_path(grid, enemy.position, goal) {
            PathResult::Found(path) => {
                agent.waypoints = path.into_waypoints().into();
                agent.state = AgentState::Following;
            }
            PathResult::NotFound => {
                tracing::debug!(enemy = enemy.id.get(), "no route to goal; resolving as arrived");
                agent.waypoints.clear();
                agent.state = AgentState::Following;
            }
            PathResult::Error(error) => {
                tracing::warn!(enemy = enemy.id.get(), %error, "path request failed; holding position");
                agent.state = AgentState::PathPending;
                agent.replan.rearm_after(Duration::ZERO);
                return;
            }
        }
    }

    if agent.state != AgentState::Following {
        return;
    }

    if agent
        .waypoints
        .iter()
        .any(|waypoint| grid.node(waypoint.node()).is_none())
    {
        tracing::warn!(enemy = enemy.id.get(), "path references unknown node; holding position");
        agent.waypoints.clear();
        agent.state = AgentState::PathPending;
        agent.replan.rearm_after(Duration::ZERO);
        return;
    }

    let reach = grid.node_radius();
    consume_reached(&mut agent.waypoints, enemy.position, reach);

    let Some(next) = agent.waypoints.front() else {
        arrive(agent, enemy.id, out);
        return;
    };

    let step = enemy.speed * dt.as_secs_f32();
    let position = move_towards(enemy.position, next.position(), step);
    if position != enemy.position {
        out.push(Command::MoveEnemy {
            enemy: enemy.id,
            to: position,
        });
    }

    consume_reached(&mut agent.waypoints, position, reach);
    if agent.waypoints.is_empty() {
        arrive(agent, enemy.id, out);
    }
}

fn consume_reached(waypoints: &mut VecDeque<Waypoint>, position: Vec2, reach: f32) {
    while waypoints
        .front()
        .is_some_and(|waypoint| waypoint.position().distance(position) < reach)
    {
        let _ = waypoints.pop_front();
    }
}

fn arrive(agent: &mut Agent, enemy: EnemyId, out: &mut Vec<Command>) {
    agent.state = AgentState::Arrived;
    out.push(Command::ResolveArrival { enemy });
}
