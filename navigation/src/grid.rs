//! Statically baked walkability grid.

use glam::Vec2;
use outpost_core::{GridCoord, NodeKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    geometry::Obstruction,
    node::{Node, NodeIndex},
};

/// Neighbour offsets along the axes, in expansion order.
const CARDINAL_OFFSETS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
/// Diagonal neighbour offsets, appended only when diagonal travel is allowed.
const DIAGONAL_OFFSETS: [(i64, i64); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// Parameters used to bake a [`Grid`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Size of the walkable area in world units.
    pub extents: Vec2,
    /// Half the edge length of a node.
    pub node_radius: f32,
    /// Whether nodes link to their four diagonal neighbours.
    #[serde(default)]
    pub allow_diagonal: bool,
}

impl GridSettings {
    /// Creates settings for a grid without diagonal links.
    #[must_use]
    pub const fn new(extents: Vec2, node_radius: f32) -> Self {
        Self {
            extents,
            node_radius,
            allow_diagonal: false,
        }
    }

    /// Enables or disables diagonal links.
    #[must_use]
    pub const fn with_diagonal(mut self, allow_diagonal: bool) -> Self {
        self.allow_diagonal = allow_diagonal;
        self
    }

    /// Edge length of a node.
    #[must_use]
    pub fn node_diameter(&self) -> f32 {
        self.node_radius * 2.0
    }
}

/// Configuration errors that prevent a grid from being built.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// The node radius was zero, negative, or not finite.
    #[error("node radius must be finite and positive, got {0}")]
    InvalidNodeRadius(f32),
    /// The world extents were negative or not finite.
    #[error("world extents must be finite and non-negative, got {0}")]
    InvalidExtents(Vec2),
    /// The extents round to a grid without any cells.
    #[error("grid resolves to {width}x{height} nodes; at least one node per axis is required")]
    Empty {
        /// Computed node count along x.
        width: u32,
        /// Computed node count along y.
        height: u32,
    },
    /// The node count cannot be addressed by a [`NodeIndex`].
    #[error("grid of {width}x{height} nodes exceeds the addressable node count")]
    TooLarge {
        /// Computed node count along x.
        width: u64,
        /// Computed node count along y.
        height: u64,
    },
}

/// Immutable 2D arena of navigation nodes.
///
/// Dimensions are fixed at build time. Nodes are stored row-major, so the node
/// at `(x, y)` lives at arena offset `y * width + x`.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    node_radius: f32,
    allow_diagonal: bool,
    nodes: Vec<Node>,
}

impl Grid {
    /// Bakes a grid from the provided settings and obstruction test.
    ///
    /// The obstruction test is invoked once per cell with the cell centre and
    /// the node radius.
    pub fn build<O>(settings: GridSettings, obstruction: &O) -> Result<Self, GridError>
    where
        O: Obstruction + ?Sized,
    {
        let node_radius = settings.node_radius;
        if !node_radius.is_finite() || node_radius <= 0.0 {
            return Err(GridError::InvalidNodeRadius(node_radius));
        }

        let extents = settings.extents;
        if !extents.is_finite() || extents.x < 0.0 || extents.y < 0.0 {
            return Err(GridError::InvalidExtents(extents));
        }

        let diameter = settings.node_diameter();
        let width_f = (extents.x / diameter).round_ties_even();
        let height_f = (extents.y / diameter).round_ties_even();
        if !width_f.is_finite()
            || !height_f.is_finite()
            || width_f > u32::MAX as f32
            || height_f > u32::MAX as f32
        {
            return Err(GridError::InvalidExtents(extents));
        }

        let width = width_f as u32;
        let height = height_f as u32;
        if width == 0 || height == 0 {
            return Err(GridError::Empty { width, height });
        }

        let node_count = u64::from(width) * u64::from(height);
        if node_count > u64::from(u32::MAX) {
            return Err(GridError::TooLarge {
                width: u64::from(width),
                height: u64::from(height),
            });
        }

        let mut nodes = Vec::with_capacity(node_count as usize);
        for y in 0..height {
            for x in 0..width {
                let position =
                    Vec2::new(x as f32 + node_radius, y as f32 + node_radius) * diameter;
                let kind = if obstruction.overlaps(position, node_radius) {
                    NodeKind::Impassable
                } else {
                    NodeKind::Normal
                };
                nodes.push(Node::new(position, GridCoord::new(x, y), kind));
            }
        }

        let mut grid = Self {
            width,
            height,
            node_radius,
            allow_diagonal: settings.allow_diagonal,
            nodes,
        };
        grid.link_neighbors();

        tracing::info!(
            width,
            height,
            impassable = grid.impassable_count(),
            allow_diagonal = settings.allow_diagonal,
            "navigation grid built"
        );

        Ok(grid)
    }

    fn link_neighbors(&mut self) {
        for slot in 0..self.nodes.len() {
            let coord = self.nodes[slot].coord();
            let mut neighbors = Vec::with_capacity(if self.allow_diagonal { 8 } else { 4 });

            let diagonal: &[(i64, i64)] = if self.allow_diagonal {
                &DIAGONAL_OFFSETS
            } else {
                &[]
            };

            for &(dx, dy) in CARDINAL_OFFSETS.iter().chain(diagonal) {
                let x = i64::from(coord.x()) + dx;
                let y = i64::from(coord.y()) + dy;
                if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
                    continue;
                }
                if let Some(index) = self.index_of(GridCoord::new(x as u32, y as u32)) {
                    neighbors.push(index);
                }
            }

            self.nodes[slot].set_neighbors(neighbors);
        }
    }

    /// Number of nodes along x.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of nodes along y.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Half the edge length of a node in world units.
    #[must_use]
    pub const fn node_radius(&self) -> f32 {
        self.node_radius
    }

    /// Edge length of a node in world units.
    #[must_use]
    pub fn node_diameter(&self) -> f32 {
        self.node_radius * 2.0
    }

    /// Reports whether nodes are linked to their diagonal neighbours.
    #[must_use]
    pub const fn allows_diagonal(&self) -> bool {
        self.allow_diagonal
    }

    /// Total number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; built grids contain at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in row-major order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes classified as impassable.
    #[must_use]
    pub fn impassable_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_walkable()).count()
    }

    /// Returns the node stored at the provided arena index.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.slot())
    }

    /// Returns the node at the provided grid coordinate.
    #[must_use]
    pub fn node_at(&self, coord: GridCoord) -> Option<&Node> {
        self.index_of(coord).and_then(|index| self.node(index))
    }

    /// Converts a grid coordinate into an arena index.
    #[must_use]
    pub fn index_of(&self, coord: GridCoord) -> Option<NodeIndex> {
        if coord.x() >= self.width || coord.y() >= self.height {
            return None;
        }
        let offset = u64::from(coord.y()) * u64::from(self.width) + u64::from(coord.x());
        u32::try_from(offset).ok().map(NodeIndex::new)
    }

    /// Maps a world position onto a node by index interpolation.
    ///
    /// Each axis is clamped into `[0, size]` and mapped through
    /// `round((size - 1) * clamp01(pos / size))`. This approximates rather than
    /// searches for the nearest node; out-of-bounds and non-finite positions
    /// clamp to the border instead of failing.
    #[must_use]
    pub fn node_from_world_position(&self, position: Vec2) -> NodeIndex {
        let x = axis_index(position.x, self.width);
        let y = axis_index(position.y, self.height);
        NodeIndex::new(y * self.width + x)
    }

    /// Convenience wrapper returning the node for a world position.
    #[must_use]
    pub fn node_from_world(&self, position: Vec2) -> &Node {
        &self.nodes[self.node_from_world_position(position).slot()]
    }
}

fn axis_index(value: f32, size: u32) -> u32 {
    let ratio = clamp01(value / size as f32);
    let last = size.saturating_sub(1);
    let index = (last as f32 * ratio).round_ties_even() as u32;
    index.min(last)
}

fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
