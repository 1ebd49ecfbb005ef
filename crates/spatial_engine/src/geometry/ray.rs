//! Rays and the ray intersection tests
//!
//! Hit distances are returned in units of `direction`, so for a unit-length
//! direction they are plain world distances. A hit behind the origin is a
//! miss; an origin already inside a volume hits at 0.

use serde::{Deserialize, Serialize};

use super::{BoundingSphere, ContainmentType, Frustum, Plane, Triangle, AABB};
use crate::foundation::math::{Vec3, EPSILON, PLANE_EPSILON};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray; need not be normalized
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point along the ray at parameter `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test against a box
    pub fn intersects_box(&self, aabb: &AABB) -> Option<f32> {
        let mut t_min: Option<f32> = None;
        let mut t_max: Option<f32> = None;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];

            if direction.abs() < EPSILON {
                // Parallel to this slab: either always inside it or never
                if origin < aabb.min[axis] || origin > aabb.max[axis] {
                    return None;
                }
                continue;
            }

            let mut near = (aabb.min[axis] - origin) / direction;
            let mut far = (aabb.max[axis] - origin) / direction;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            if t_min.is_some_and(|t| t > far) || t_max.is_some_and(|t| near > t) {
                return None;
            }

            t_min = Some(t_min.map_or(near, |t| t.max(near)));
            t_max = Some(t_max.map_or(far, |t| t.min(far)));
        }

        match (t_min, t_max) {
            (Some(t_min), Some(t_max)) if t_max >= 0.0 => Some(t_min.max(0.0)),
            // Box behind the origin, or a zero direction
            _ => None,
        }
    }

    /// Distance to the first point on the sphere surface
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let offset = sphere.center - self.origin;
        let offset_squared = offset.norm_squared();
        let radius_squared = sphere.radius * sphere.radius;

        if offset_squared < radius_squared {
            return Some(0.0);
        }

        let length = self.direction.norm();
        if length < EPSILON {
            return None;
        }
        let unit = self.direction / length;

        let projection = unit.dot(&offset);
        if projection < 0.0 {
            return None;
        }

        let discriminant = radius_squared + projection * projection - offset_squared;
        if discriminant < 0.0 {
            return None;
        }

        Some((projection - discriminant.sqrt()) / length)
    }

    /// Distance to the plane, `None` when parallel or behind
    pub fn intersects_plane(&self, plane: &Plane) -> Option<f32> {
        let denominator = plane.dot_normal(&self.direction);
        if denominator.abs() < EPSILON {
            return None;
        }

        let t = -plane.dot_coordinate(&self.origin) / denominator;
        if t < -PLANE_EPSILON {
            None
        } else {
            Some(t.max(0.0))
        }
    }

    /// Distance to the triangle (Möller-Trumbore)
    pub fn intersects_triangle(&self, triangle: &Triangle) -> Option<f32> {
        triangle.intersect_ray(self).map(|(t, _, _)| t)
    }

    /// Distance to the frustum volume
    ///
    /// Clips the ray parameter range against each (outward facing) plane.
    pub fn intersects_frustum(&self, frustum: &Frustum) -> Option<f32> {
        if frustum.contains_point(&self.origin) != ContainmentType::Disjoint {
            return Some(0.0);
        }

        let mut t_enter = 0.0_f32;
        let mut t_exit = f32::INFINITY;
        for plane in frustum.planes() {
            let distance = plane.dot_coordinate(&self.origin);
            let denominator = plane.dot_normal(&self.direction);

            if denominator.abs() < EPSILON {
                if distance > 0.0 {
                    return None;
                }
                continue;
            }

            let t = -distance / denominator;
            if denominator < 0.0 {
                t_enter = t_enter.max(t);
            } else {
                t_exit = t_exit.min(t);
            }

            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario_box() -> AABB {
        AABB::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn test_ray_box_from_both_sides() {
        let aabb = scenario_box();
        let center = aabb.center();

        let from_left = Ray::new(center - Vec3::x() * 40.0, Vec3::x());
        let from_right = Ray::new(center + Vec3::x() * 40.0, -Vec3::x());

        assert_relative_eq!(from_left.intersects_box(&aabb).unwrap(), 30.0);
        assert_relative_eq!(from_right.intersects_box(&aabb).unwrap(), 30.0);
    }

    #[test]
    fn test_ray_box_from_inside_hits_at_zero() {
        let aabb = scenario_box();
        for direction in [Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()] {
            let ray = Ray::new(aabb.center(), direction);
            assert_eq!(ray.intersects_box(&aabb), Some(0.0));
        }
    }

    #[test]
    fn test_ray_box_pointing_away_misses() {
        let aabb = scenario_box();
        let ray = Ray::new(aabb.center() - Vec3::x() * 40.0, -Vec3::x());
        assert_eq!(ray.intersects_box(&aabb), None);
    }

    #[test]
    fn test_ray_box_parallel_outside_slab_misses() {
        let aabb = scenario_box();
        let ray = Ray::new(Vec3::new(-40.0, 20.0, 0.0), Vec3::x());
        assert_eq!(ray.intersects_box(&aabb), None);

        let diagonal = Ray::new(Vec3::new(-20.0, -20.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(diagonal.intersects_box(&aabb).unwrap(), 10.0);
    }

    #[test]
    fn test_ray_sphere() {
        let sphere = BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 2.0);

        assert_relative_eq!(Ray::new(Vec3::zeros(), Vec3::x()).intersects_sphere(&sphere).unwrap(), 8.0);
        // Same ray with a longer direction reports the parameter, not the distance
        assert_relative_eq!(Ray::new(Vec3::zeros(), Vec3::x() * 2.0).intersects_sphere(&sphere).unwrap(), 4.0);
        assert_eq!(Ray::new(Vec3::zeros(), -Vec3::x()).intersects_sphere(&sphere), None);
        assert_eq!(Ray::new(Vec3::zeros(), Vec3::y()).intersects_sphere(&sphere), None);
        assert_eq!(Ray::new(Vec3::new(10.5, 0.0, 0.0), Vec3::y()).intersects_sphere(&sphere), Some(0.0));
    }

    #[test]
    fn test_ray_plane() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 5.0, 0.0), Vec3::y());

        assert_relative_eq!(Ray::new(Vec3::zeros(), Vec3::y()).intersects_plane(&plane).unwrap(), 5.0);
        assert_eq!(Ray::new(Vec3::zeros(), -Vec3::y()).intersects_plane(&plane), None);
        assert_eq!(Ray::new(Vec3::zeros(), Vec3::x()).intersects_plane(&plane), None);
    }

    #[test]
    fn test_ray_triangle() {
        let triangle = Triangle::new(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        let down = Ray::new(Vec3::new(0.5, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(down.intersects_triangle(&triangle).unwrap(), 1.0);

        let up = Ray::new(Vec3::new(0.5, 0.25, 1.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(up.intersects_triangle(&triangle), None);

        // (1, 1) is past the hypotenuse x + 2y = 2
        let beside = Ray::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(beside.intersects_triangle(&triangle), None);

        // Aimed from (1, 1, 1) at the point (0, 0, -1): crosses z = 0 at (0.5, 0.5, 0)
        let origin = Vec3::new(1.0, 1.0, 1.0);
        let aimed = Ray::new(origin, Vec3::new(0.0, 0.0, -1.0) - origin);
        assert_relative_eq!(aimed.intersects_triangle(&triangle).unwrap(), 0.5, epsilon = 1e-5);
        assert_relative_eq!(aimed.point_at(0.5), Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-5);

        let aimed_away = Ray::new(origin, origin - Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(aimed_away.intersects_triangle(&triangle), None);
    }
}
