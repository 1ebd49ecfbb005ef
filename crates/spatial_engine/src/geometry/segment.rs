//! Finite line segment

use serde::{Deserialize, Serialize};

use super::{BoundingSphere, Plane, Ray, Triangle, AABB};
use crate::foundation::math::{Vec3, EPSILON};

/// Segment between two points
///
/// Intersection results are fractions in `[0, 1]` along `start -> end`.
/// A zero-length segment never intersects anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    /// First end point
    pub start: Vec3,
    /// Second end point
    pub end: Vec3,
}

impl LineSegment {
    /// Segment from `start` to `end`
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// `end - start`
    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    /// Length of the segment
    pub fn length(&self) -> f32 {
        self.direction().norm()
    }

    /// Point at `fraction` along the segment
    pub fn point_at(&self, fraction: f32) -> Vec3 {
        self.start + self.direction() * fraction
    }

    /// Box around both end points
    pub fn bounds(&self) -> AABB {
        AABB::new(self.start.inf(&self.end), self.start.sup(&self.end))
    }

    /// Point of the segment nearest to `point`
    pub fn closest_point(&self, point: &Vec3) -> Vec3 {
        let direction = self.direction();
        let length_squared = direction.norm_squared();
        if length_squared < EPSILON * EPSILON {
            return self.start;
        }

        let fraction = ((point - self.start).dot(&direction) / length_squared).clamp(0.0, 1.0);
        self.point_at(fraction)
    }

    /// Fraction at which the segment enters the box
    pub fn intersects_box(&self, aabb: &AABB) -> Option<f32> {
        self.as_ray()?.intersects_box(aabb).filter(|t| *t <= 1.0)
    }

    /// Fraction at which the segment enters the sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        self.as_ray()?.intersects_sphere(sphere).filter(|t| *t <= 1.0)
    }

    /// Fraction at which the segment crosses the plane
    pub fn intersects_plane(&self, plane: &Plane) -> Option<f32> {
        self.as_ray()?.intersects_plane(plane).filter(|t| *t <= 1.0)
    }

    /// Fraction at which the segment crosses the triangle
    pub fn intersects_triangle(&self, triangle: &Triangle) -> Option<f32> {
        self.as_ray()?.intersects_triangle(triangle).filter(|t| *t <= 1.0)
    }

    fn as_ray(&self) -> Option<Ray> {
        let direction = self.direction();
        (direction.norm_squared() >= EPSILON * EPSILON).then(|| Ray::new(self.start, direction))
    }
}
