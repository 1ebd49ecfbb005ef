//! Triangle primitive

use serde::{Deserialize, Serialize};

use super::{Ray, AABB};
use crate::foundation::math::{Vec3, EPSILON};

/// A triangle in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// First vertex
    pub v1: Vec3,
    /// Second vertex
    pub v2: Vec3,
    /// Third vertex
    pub v3: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub const fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self { v1, v2, v3 }
    }

    /// Unit normal (right-hand rule), `None` for a degenerate triangle
    pub fn normal(&self) -> Option<Vec3> {
        (self.v2 - self.v1)
            .cross(&(self.v3 - self.v1))
            .try_normalize(EPSILON)
    }

    /// Area of the triangle
    pub fn area(&self) -> f32 {
        (self.v2 - self.v1).cross(&(self.v3 - self.v1)).norm() * 0.5
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v1 + self.v2 + self.v3) / 3.0
    }

    /// Tight box around the three vertices
    pub fn bounds(&self) -> AABB {
        AABB::new(
            self.v1.inf(&self.v2).inf(&self.v3),
            self.v1.sup(&self.v2).sup(&self.v3),
        )
    }

    /// Möller-Trumbore ray-triangle intersection
    ///
    /// Returns `(t, u, v)`: the ray parameter and the barycentric coordinates
    /// of the hit relative to `v2` and `v3`. Both faces are hit.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        let edge1 = self.v2 - self.v1;
        let edge2 = self.v3 - self.v1;

        let h = ray.direction.cross(&edge2);
        let determinant = edge1.dot(&h);

        // Ray parallel to the triangle plane, or a degenerate triangle
        if determinant.abs() < EPSILON {
            return None;
        }

        let inverse = 1.0 / determinant;
        let s = ray.origin - self.v1;
        let u = inverse * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = inverse * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inverse * edge2.dot(&q);
        if t < 0.0 {
            return None;
        }

        Some((t, u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_barycentric_coordinates_of_hit() {
        let triangle = Triangle::new(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::new(0.5, 0.25, 3.0), Vec3::new(0.0, 0.0, -1.0));

        let (t, u, v) = triangle.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 3.0);
        assert_relative_eq!(u, 0.25);
        assert_relative_eq!(v, 0.25);
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let flat = Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));

        assert_eq!(flat.intersect_ray(&ray), None);
        assert_eq!(flat.normal(), None);
        assert_relative_eq!(flat.area(), 0.0);
    }

    #[test]
    fn test_bounds_and_centroid() {
        let triangle = Triangle::new(Vec3::new(1.0, 5.0, -1.0), Vec3::new(-2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 4.0));
        let bounds = triangle.bounds();

        assert_relative_eq!(bounds.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_relative_eq!(bounds.max, Vec3::new(1.0, 5.0, 4.0));
        assert_relative_eq!(triangle.centroid(), Vec3::new(-1.0 / 3.0, 2.0, 1.0));
    }
}
