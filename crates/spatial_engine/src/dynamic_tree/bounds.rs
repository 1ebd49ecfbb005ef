//! Bounds arithmetic the dynamic tree is generic over

use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

use crate::foundation::math::{abs2, abs3, Vec2, Vec3, EPSILON};
use crate::geometry::{ContainmentType, Rect, AABB};

/// Axis-aligned bounds a [`DynamicTree`](super::DynamicTree) can index
pub trait TreeBounds: Copy + Debug + PartialEq {
    /// Point / displacement type of the space
    type Vector: Copy
        + Debug
        + Add<Output = Self::Vector>
        + Sub<Output = Self::Vector>
        + Mul<f32, Output = Self::Vector>
        + Neg<Output = Self::Vector>;

    /// Smallest bounds enclosing both
    fn merged(&self, other: &Self) -> Self;

    /// Insertion cost metric
    fn perimeter(&self) -> f32;

    /// `other` lies fully inside `self` (touching faces allowed)
    fn contains(&self, other: &Self) -> bool;

    /// Overlap test; touching counts
    fn overlaps(&self, other: &Self) -> bool;

    /// Bounds grown by `margin` on every side
    fn fattened(&self, margin: f32) -> Self;

    /// Bounds stretched along `displacement`, one side per axis
    fn swept(&self, displacement: Self::Vector) -> Self;

    /// Bounds moved by `offset`
    fn translated(&self, offset: Self::Vector) -> Self;

    /// Center point
    fn center(&self) -> Self::Vector;

    /// Bounds of the segment `p1..p2`
    fn segment_bounds(p1: Self::Vector, p2: Self::Vector) -> Self;

    /// True when a separating axis perpendicular to the segment exists
    fn segment_separated(&self, p1: Self::Vector, p2: Self::Vector) -> bool;
}

impl TreeBounds for Rect {
    type Vector = Vec2;

    fn merged(&self, other: &Self) -> Self {
        Rect::merged(self, other)
    }

    fn perimeter(&self) -> f32 {
        Rect::perimeter(self)
    }

    fn contains(&self, other: &Self) -> bool {
        self.contains_rect(other) == ContainmentType::Contains
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.intersects(other)
    }

    fn fattened(&self, margin: f32) -> Self {
        Rect::fattened(self, margin)
    }

    fn swept(&self, displacement: Vec2) -> Self {
        Self::new(
            self.min + displacement.inf(&Vec2::zeros()),
            self.max + displacement.sup(&Vec2::zeros()),
        )
    }

    fn translated(&self, offset: Vec2) -> Self {
        Rect::translated(self, &offset)
    }

    fn center(&self) -> Vec2 {
        Rect::center(self)
    }

    fn segment_bounds(p1: Vec2, p2: Vec2) -> Self {
        Self::new(p1.inf(&p2), p1.sup(&p2))
    }

    fn segment_separated(&self, p1: Vec2, p2: Vec2) -> bool {
        let Some(direction) = (p2 - p1).try_normalize(EPSILON) else {
            return false;
        };

        // |dot(v, p1 - c)| > dot(|v|, h) with v perpendicular to the segment
        let perpendicular = Vec2::new(-direction.y, direction.x);
        let separation = perpendicular.dot(&(p1 - self.center())).abs();
        separation > abs2(&perpendicular).dot(&self.extents())
    }
}

impl TreeBounds for AABB {
    type Vector = Vec3;

    fn merged(&self, other: &Self) -> Self {
        AABB::merged(self, other)
    }

    fn perimeter(&self) -> f32 {
        AABB::perimeter(self)
    }

    fn contains(&self, other: &Self) -> bool {
        self.contains_box(other) == ContainmentType::Contains
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.intersects_box(other)
    }

    fn fattened(&self, margin: f32) -> Self {
        AABB::fattened(self, margin)
    }

    fn swept(&self, displacement: Vec3) -> Self {
        Self::new(
            self.min + displacement.inf(&Vec3::zeros()),
            self.max + displacement.sup(&Vec3::zeros()),
        )
    }

    fn translated(&self, offset: Vec3) -> Self {
        AABB::translated(self, &offset)
    }

    fn center(&self) -> Vec3 {
        AABB::center(self)
    }

    fn segment_bounds(p1: Vec3, p2: Vec3) -> Self {
        Self::new(p1.inf(&p2), p1.sup(&p2))
    }

    fn segment_separated(&self, p1: Vec3, p2: Vec3) -> bool {
        let direction = p2 - p1;
        let offset = p1 - self.center();
        let extents = self.extents();

        // Cross-product axes d x e_i; the segment projects to a single point on each
        [Vec3::x(), Vec3::y(), Vec3::z()].iter().any(|axis| {
            let separating = direction.cross(axis);
            separating.dot(&offset).abs() > abs3(&separating).dot(&extents)
        })
    }
}
