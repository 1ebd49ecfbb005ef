//! Plane in Hessian normal form: `normal · p + d = 0`

use serde::{Deserialize, Serialize};

use super::{BoundingSphere, PlaneIntersectionType, AABB};
use crate::foundation::math::{Vec3, EPSILON};

/// Plane defined by a normal and a distance term
///
/// Signed distances are only metric when `normal` is unit length; the
/// constructors that derive a plane from points always normalize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Normal vector; the "front" side is the one it points to
    pub normal: Vec3,
    /// Distance term of the plane equation
    pub d: f32,
}

impl Plane {
    /// Plane from a raw normal and distance term (not normalized)
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through `point` facing along `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.try_normalize(EPSILON).unwrap_or(normal);
        Self {
            normal,
            d: -normal.dot(&point),
        }
    }

    /// Plane through three points, wound counter-clockwise when seen from the front
    ///
    /// Collinear points give a plane with a zero normal that classifies
    /// everything as touching.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_normal(a, normal)
    }

    /// Same plane scaled so the normal has unit length
    pub fn normalized(&self) -> Self {
        let length = self.normal.norm();
        if length < EPSILON {
            return *self;
        }
        Self {
            normal: self.normal / length,
            d: self.d / length,
        }
    }

    /// `normal · point + d`
    pub fn dot_coordinate(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// `normal · direction`
    pub fn dot_normal(&self, direction: &Vec3) -> f32 {
        self.normal.dot(direction)
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.dot_coordinate(point)
    }

    /// Side of the plane a point lies on
    pub fn classify_point(&self, point: &Vec3) -> PlaneIntersectionType {
        let distance = self.dot_coordinate(point);
        if distance > 0.0 {
            PlaneIntersectionType::Front
        } else if distance < 0.0 {
            PlaneIntersectionType::Back
        } else {
            PlaneIntersectionType::Intersecting
        }
    }

    /// Side of the plane a box lies on
    pub fn classify_box(&self, aabb: &AABB) -> PlaneIntersectionType {
        // Extreme vertices along the normal
        let mut positive = aabb.min;
        let mut negative = aabb.max;
        for axis in 0..3 {
            if self.normal[axis] >= 0.0 {
                positive[axis] = aabb.max[axis];
                negative[axis] = aabb.min[axis];
            }
        }

        if self.dot_coordinate(&negative) > 0.0 {
            PlaneIntersectionType::Front
        } else if self.dot_coordinate(&positive) < 0.0 {
            PlaneIntersectionType::Back
        } else {
            PlaneIntersectionType::Intersecting
        }
    }

    /// Side of the plane a sphere lies on
    pub fn classify_sphere(&self, sphere: &BoundingSphere) -> PlaneIntersectionType {
        let distance = self.dot_coordinate(&sphere.center);
        if distance > sphere.radius {
            PlaneIntersectionType::Front
        } else if distance < -sphere.radius {
            PlaneIntersectionType::Back
        } else {
            PlaneIntersectionType::Intersecting
        }
    }

    /// Point shared by three planes, `None` when two of them are parallel
    pub fn intersection_point(a: &Self, b: &Self, c: &Self) -> Option<Vec3> {
        let b_cross_c = b.normal.cross(&c.normal);
        let denominator = a.normal.dot(&b_cross_c);
        if denominator.abs() < EPSILON {
            return None;
        }

        let sum = b_cross_c * a.d
            + c.normal.cross(&a.normal) * b.d
            + a.normal.cross(&b.normal) * c.d;
        Some(-sum / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classify_box() {
        let ground = Plane::from_point_normal(Vec3::zeros(), Vec3::y());

        let above = AABB::new(Vec3::new(-1.0, 1.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let below = AABB::new(Vec3::new(-1.0, -3.0, -1.0), Vec3::new(1.0, -2.0, 1.0));
        let straddling = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert_eq!(ground.classify_box(&above), PlaneIntersectionType::Front);
        assert_eq!(ground.classify_box(&below), PlaneIntersectionType::Back);
        assert_eq!(ground.classify_box(&straddling), PlaneIntersectionType::Intersecting);
    }

    #[test]
    fn test_classify_sphere() {
        let plane = Plane::new(Vec3::x(), -5.0);

        assert_eq!(plane.classify_sphere(&BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 1.0)), PlaneIntersectionType::Front);
        assert_eq!(plane.classify_sphere(&BoundingSphere::new(Vec3::zeros(), 1.0)), PlaneIntersectionType::Back);
        assert_eq!(plane.classify_sphere(&BoundingSphere::new(Vec3::new(5.5, 0.0, 0.0), 1.0)), PlaneIntersectionType::Intersecting);
    }

    #[test]
    fn test_from_points_winding() {
        let plane = Plane::from_points(Vec3::zeros(), Vec3::x(), Vec3::y());
        assert_relative_eq!(plane.normal, Vec3::z());
        assert_relative_eq!(plane.d, 0.0);
        assert_eq!(plane.classify_point(&Vec3::new(0.0, 0.0, 1.0)), PlaneIntersectionType::Front);
    }

    #[test]
    fn test_three_plane_intersection() {
        let x = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::x());
        let y = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::y());
        let z = Plane::from_point_normal(Vec3::new(0.0, 0.0, -3.0), Vec3::z());

        let point = Plane::intersection_point(&x, &y, &z).unwrap();
        assert_relative_eq!(point, Vec3::new(1.0, 2.0, -3.0), epsilon = 1e-6);

        let parallel = Plane::from_point_normal(Vec3::new(4.0, 0.0, 0.0), Vec3::x());
        assert!(Plane::intersection_point(&x, &parallel, &z).is_none());
    }

    #[test]
    fn test_normalized_scales_distance() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0).normalized();
        assert_relative_eq!(plane.normal, Vec3::y());
        assert_relative_eq!(plane.d, 2.0);
    }
}
