#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid-based navigation for Outpost.
//!
//! A [`Grid`] is baked once from world extents and an [`Obstruction`] test,
//! storing every [`Node`] in a flat arena addressed by [`NodeIndex`]. A
//! [`Pathfinder`] runs A* over a shared `&Grid`, keeping all per-search cost
//! bookkeeping in its own scratch arena so that independent pathfinders never
//! alias each other's state.

mod geometry;
mod grid;
mod node;
mod pathfinder;

pub use geometry::{BlockingGeometry, Circle, Obstruction, Rect};
pub use grid::{Grid, GridError, GridSettings};
pub use node::{Node, NodeIndex};
pub use pathfinder::{Path, PathError, PathResult, Pathfinder, Waypoint};
