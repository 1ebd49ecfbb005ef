//! Geometric primitives and the intersection tests between them
//!
//! Every shape is a plain `Copy` value. Each container shape answers
//! `contains_*` with a [`ContainmentType`]; where a boolean or a hit distance
//! makes more sense the shape offers `intersects_*` as well.
//!
//! Degenerate inputs are never errors here: a parallel ray, a zero-length
//! segment or a flat triangle simply produce "no intersection".

mod aabb;
mod frustum;
mod plane;
mod ray;
mod rect;
mod segment;
mod sphere;
mod triangle;

pub use aabb::{AABB, MAX_CLIP_VERTICES};
pub use frustum::{Frustum, CORNER_COUNT, PLANE_COUNT};
pub use plane::Plane;
pub use ray::Ray;
pub use rect::Rect;
pub use segment::LineSegment;
pub use sphere::BoundingSphere;
pub use triangle::Triangle;

use serde::{Deserialize, Serialize};

/// How one volume relates to another
///
/// Ordered from the weakest to the strongest relation, so the more specific
/// of two answers is their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainmentType {
    /// The volumes do not touch
    Disjoint,
    /// The volumes overlap (or touch) without full containment
    Intersects,
    /// The tested volume lies entirely inside the container
    Contains,
}

impl ContainmentType {
    /// Anything other than [`ContainmentType::Disjoint`]
    pub fn is_overlapping(self) -> bool {
        self != Self::Disjoint
    }
}

/// Which side of a plane a shape lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneIntersectionType {
    /// Entirely on the side the normal points to
    Front,
    /// Entirely on the opposite side
    Back,
    /// Straddling (or touching) the plane
    Intersecting,
}
