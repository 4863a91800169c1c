//! A* search over a baked [`Grid`].

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::Vec2;
use outpost_core::GridCoord;
use thiserror::Error;

use crate::{grid::Grid, node::NodeIndex};

/// A single step of a computed path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    node: NodeIndex,
    coord: GridCoord,
    position: Vec2,
    g_cost: f32,
}

impl Waypoint {
    /// Arena index of the node backing the waypoint.
    #[must_use]
    pub const fn node(&self) -> NodeIndex {
        self.node
    }

    /// Grid coordinate of the waypoint.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// World-space centre of the waypoint.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Accumulated travel cost from the search start to this waypoint.
    #[must_use]
    pub const fn g_cost(&self) -> f32 {
        self.g_cost
    }
}

/// Ordered route from (excluding) the start node to (including) the goal node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Creates a path without waypoints; the start already is the goal.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Total travel cost of the path.
    #[must_use]
    pub fn cost(&self) -> f32 {
        self.waypoints.last().map_or(0.0, Waypoint::g_cost)
    }

    /// Iterates over the waypoints in travel order.
    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Consumes the path, returning its waypoints.
    #[must_use]
    pub fn into_waypoints(self) -> Vec<Waypoint> {
        self.waypoints
    }
}

/// Failures that prevent a search from producing a meaningful answer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PathError {
    /// A world-space endpoint contained NaN or infinity.
    #[error("path endpoint {position} is not finite")]
    NonFiniteEndpoint {
        /// Offending endpoint.
        position: Vec2,
    },
    /// A grid-space endpoint lies outside the grid.
    #[error("grid coordinate ({}, {}) lies outside the grid", .coord.x(), .coord.y())]
    CoordOutOfBounds {
        /// Offending coordinate.
        coord: GridCoord,
    },
    /// Walking the parent chain back from the goal did not reach the start.
    #[error("parent chain broke at node {}", .node.get())]
    BrokenParentChain {
        /// Node whose parent was missing.
        node: NodeIndex,
    },
}

/// Outcome of a single search.
#[derive(Clone, Debug, PartialEq)]
pub enum PathResult {
    /// A route exists; it is empty when start and goal coincide.
    Found(Path),
    /// The open set was exhausted without reaching the goal.
    NotFound,
    /// The search could not run or its result could not be assembled.
    Error(PathError),
}

impl PathResult {
    /// Returns the found path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound | Self::Error(_) => None,
        }
    }

    /// Reports whether a route was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Consumes the result, returning the found path, if any.
    #[must_use]
    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound | Self::Error(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SlotState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, Default)]
struct NodeScratch {
    generation: u32,
    g: f32,
    parent: Option<NodeIndex>,
    state: SlotState,
    sequence: u64,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f32,
    h: f32,
    sequence: u64,
    node: NodeIndex,
}

impl Ord for OpenEntry {
    // Reversed so the max-heap yields the lowest f, then lowest h, then the
    // earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Reusable A* search state.
///
/// Per-node costs and parents live in a scratch arena owned by the
/// pathfinder, keyed by [`NodeIndex`] and invalidated lazily through a
/// generation stamp. The [`Grid`] itself is never written, so any number of
/// pathfinders may search the same grid at once.
#[derive(Debug, Default)]
pub struct Pathfinder {
    scratch: Vec<NodeScratch>,
    open: BinaryHeap<OpenEntry>,
    generation: u32,
    sequence: u64,
    expanded: usize,
}

impl Pathfinder {
    /// Creates a pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes closed by the most recent search.
    #[must_use]
    pub fn expanded_nodes(&self) -> usize {
        self.expanded
    }

    /// Searches between two world positions.
    ///
    /// Both endpoints are snapped to nodes with
    /// [`Grid::node_from_world_position`].
    pub fn calculate_path(&mut self, grid: &Grid, start: Vec2, end: Vec2) -> PathResult {
        for position in [start, end] {
            if !position.is_finite() {
                return PathResult::Error(PathError::NonFiniteEndpoint { position });
            }
        }

        let start = grid.node_from_world_position(start);
        let goal = grid.node_from_world_position(end);
        self.search(grid, start, goal)
    }

    /// Searches between two grid coordinates.
    pub fn calculate_path_between(
        &mut self,
        grid: &Grid,
        start: GridCoord,
        goal: GridCoord,
    ) -> PathResult {
        let Some(start) = grid.index_of(start) else {
            return PathResult::Error(PathError::CoordOutOfBounds { coord: start });
        };
        let Some(goal) = grid.index_of(goal) else {
            return PathResult::Error(PathError::CoordOutOfBounds { coord: goal });
        };
        self.search(grid, start, goal)
    }

    fn search(&mut self, grid: &Grid, start: NodeIndex, goal: NodeIndex) -> PathResult {
        self.begin(grid);

        if start == goal {
            return PathResult::Found(Path::empty());
        }

        let (Some(start_node), Some(goal_node)) = (grid.node(start), grid.node(goal)) else {
            return PathResult::NotFound;
        };
        let goal_position = goal_node.position();

        let h = start_node.position().distance(goal_position);
        self.open_slot(start, 0.0, h, None);

        while let Some(entry) = self.open.pop() {
            let generation = self.generation;
            let current = &mut self.scratch[entry.node.slot()];
            if current.generation != generation
                || current.state != SlotState::Open
                || current.sequence != entry.sequence
            {
                continue;
            }
            current.state = SlotState::Closed;
            let current_g = current.g;
            self.expanded += 1;

            if entry.node == goal {
                return self.finish(grid, start, goal);
            }

            let Some(node) = grid.node(entry.node) else {
                continue;
            };
            let origin = node.position();

            for &neighbor_index in node.neighbors() {
                let Some(neighbor) = grid.node(neighbor_index) else {
                    continue;
                };
                if !neighbor.is_walkable() {
                    continue;
                }

                let slot = self.slot(neighbor_index);
                if slot.state == SlotState::Closed {
                    continue;
                }

                let candidate = current_g + origin.distance(neighbor.position());
                if slot.state != SlotState::Open || candidate < slot.g {
                    let h = neighbor.position().distance(goal_position);
                    self.open_slot(neighbor_index, candidate, h, Some(entry.node));
                }
            }
        }

        tracing::debug!(
            start = start.get(),
            goal = goal.get(),
            expanded = self.expanded,
            "no path"
        );
        PathResult::NotFound
    }

    fn begin(&mut self, grid: &Grid) {
        if self.scratch.len() != grid.len() {
            self.scratch.resize(grid.len(), NodeScratch::default());
        }
        if self.generation == u32::MAX {
            self.scratch.fill(NodeScratch::default());
            self.generation = 0;
        }
        self.generation += 1;
        self.open.clear();
        self.expanded = 0;
    }

    fn slot(&mut self, index: NodeIndex) -> NodeScratch {
        let generation = self.generation;
        let slot = &mut self.scratch[index.slot()];
        if slot.generation != generation {
            *slot = NodeScratch {
                generation,
                ..NodeScratch::default()
            };
        }
        *slot
    }

    fn open_slot(&mut self, index: NodeIndex, g: f32, h: f32, parent: Option<NodeIndex>) {
        self.sequence = self.sequence.wrapping_add(1);
        let sequence = self.sequence;
        self.scratch[index.slot()] = NodeScratch {
            generation: self.generation,
            g,
            parent,
            state: SlotState::Open,
            sequence,
        };
        self.open.push(OpenEntry {
            f: g + h,
            h,
            sequence,
            node: index,
        });
    }

    fn finish(&self, grid: &Grid, start: NodeIndex, goal: NodeIndex) -> PathResult {
        let mut waypoints = Vec::new();
        let mut cursor = goal;

        while cursor != start {
            let slot = &self.scratch[cursor.slot()];
            let (Some(node), Some(parent)) = (grid.node(cursor), slot.parent) else {
                return PathResult::Error(PathError::BrokenParentChain { node: cursor });
            };
            if slot.generation != self.generation || waypoints.len() >= grid.len() {
                return PathResult::Error(PathError::BrokenParentChain { node: cursor });
            }

            waypoints.push(Waypoint {
                node: cursor,
                coord: node.coord(),
                position: node.position(),
                g_cost: slot.g,
            });
            cursor = parent;
        }

        waypoints.reverse();
        let path = Path { waypoints };
        tracing::debug!(
            start = start.get(),
            goal = goal.get(),
            waypoints = path.len(),
            cost = path.cost(),
            expanded = self.expanded,
            "path found"
        );
        PathResult::Found(path)
    }
}
