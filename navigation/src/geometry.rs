//! World geometry provider consulted while baking the grid.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Reports whether a circle overlaps blocking level geometry.
///
/// Consulted exactly once per grid cell while the grid is built.
pub trait Obstruction {
    /// Returns `true` when a circle at `center` with `radius` touches blocking geometry.
    fn overlaps(&self, center: Vec2, radius: f32) -> bool;
}

impl<F> Obstruction for F
where
    F: Fn(Vec2, f32) -> bool,
{
    fn overlaps(&self, center: Vec2, radius: f32) -> bool {
        self(center, radius)
    }
}

/// Axis-aligned rectangle of blocking geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left corner in world units.
    pub min: Vec2,
    /// Upper-right corner in world units.
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle spanning the two provided corners in any order.
    #[must_use]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min.min(self.max), self.max.max(self.min));
        closest.distance_squared(center) < radius * radius
    }
}

/// Circular obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Centre in world units.
    pub center: Vec2,
    /// Radius in world units.
    pub radius: f32,
}

impl Circle {
    fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.center.distance_squared(center) < reach * reach
    }
}

/// Static collection of blocking shapes describing a level's walls.
///
/// Shapes that merely touch a probe circle do not block it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingGeometry {
    /// Rectangular walls.
    #[serde(default)]
    pub rects: Vec<Rect>,
    /// Circular pillars.
    #[serde(default)]
    pub circles: Vec<Circle>,
}

impl BlockingGeometry {
    /// Creates an empty geometry set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rectangular wall.
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rects.push(rect);
        self
    }

    /// Adds a circular pillar.
    #[must_use]
    pub fn with_circle(mut self, circle: Circle) -> Self {
        self.circles.push(circle);
        self
    }

    /// Number of shapes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len() + self.circles.len()
    }

    /// Reports whether the set has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Obstruction for BlockingGeometry {
    fn overlaps(&self, center: Vec2, radius: f32) -> bool {
        self.rects
            .iter()
            .any(|rect| rect.intersects_circle(center, radius))
            || self
                .circles
                .iter()
                .any(|circle| circle.intersects_circle(center, radius))
    }
}
