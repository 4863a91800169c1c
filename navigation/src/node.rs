//! Navigation nodes stored in the grid arena.

use glam::Vec2;
use outpost_core::{GridCoord, NodeKind};

/// Position of a node within the grid arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Creates a node index from its raw arena offset.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw arena offset.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Immutable spatial identity of a grid cell plus its precomputed adjacency.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    position: Vec2,
    coord: GridCoord,
    kind: NodeKind,
    neighbors: Vec<NodeIndex>,
}

impl Node {
    pub(crate) fn new(position: Vec2, coord: GridCoord, kind: NodeKind) -> Self {
        Self {
            position,
            coord,
            kind,
            neighbors: Vec::new(),
        }
    }

    /// World-space centre of the node.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Grid coordinate of the node.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Walkability classification.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Reports whether searches may expand into this node.
    #[must_use]
    pub fn is_walkable(&self) -> bool {
        self.kind == NodeKind::Normal
    }

    /// Adjacent nodes, clipped at the grid boundary.
    #[must_use]
    pub fn neighbors(&self) -> &[NodeIndex] {
        &self.neighbors
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: Vec<NodeIndex>) {
        self.neighbors = neighbors;
    }
}
