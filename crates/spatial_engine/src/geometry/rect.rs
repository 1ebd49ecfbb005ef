//! Axis-aligned rectangle, the 2D counterpart of [`AABB`](super::AABB)

use serde::{Deserialize, Serialize};

use super::ContainmentType;
use crate::foundation::math::{Vec2, EPSILON};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from its corners
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from a center and half extents
    pub fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half extents
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Perimeter length
    pub fn perimeter(&self) -> f32 {
        let size = self.size();
        2.0 * (size.x + size.y)
    }

    /// Area
    pub fn area(&self) -> f32 {
        let size = self.size();
        size.x * size.y
    }

    /// Smallest rectangle enclosing both
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Rectangle grown by `margin` on every side
    pub fn fattened(&self, margin: f32) -> Self {
        let margin = Vec2::repeat(margin);
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Rectangle moved by `offset`
    pub fn translated(&self, offset: &Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Classify a point: strictly inside, on an edge, or outside
    pub fn contains_point(&self, point: &Vec2) -> ContainmentType {
        if point.x < self.min.x || point.x > self.max.x || point.y < self.min.y || point.y > self.max.y {
            ContainmentType::Disjoint
        } else if point.x == self.min.x || point.x == self.max.x || point.y == self.min.y || point.y == self.max.y {
            ContainmentType::Intersects
        } else {
            ContainmentType::Contains
        }
    }

    /// Classify another rectangle against this one
    pub fn contains_rect(&self, other: &Self) -> ContainmentType {
        if !self.intersects(other) {
            ContainmentType::Disjoint
        } else if other.min.x >= self.min.x && other.max.x <= self.max.x
            && other.min.y >= self.min.y && other.max.y <= self.max.y
        {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Overlap (or touch) test
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// 2D slab test; returns the ray parameter of the entry point
    pub fn intersect_ray(&self, origin: &Vec2, direction: &Vec2) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..2 {
            if direction[axis].abs() < EPSILON {
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inverse = 1.0 / direction[axis];
            let mut near = (self.min[axis] - origin[axis]) * inverse;
            let mut far = (self.max[axis] - origin[axis]) * inverse;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 || t_min == f32::NEG_INFINITY {
            None
        } else {
            Some(t_min.max(0.0))
        }
    }
}
