//! Bounding sphere

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::{ContainmentType, Frustum, Plane, PlaneIntersectionType, Ray, AABB};
use crate::error::{Result, SpatialError};
use crate::foundation::math::{Mat4, Vec3};

/// A bounding sphere for containment and overlap tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around the box of the points, grown to reach the farthest one
    pub fn from_points(points: &[Vec3]) -> Result<Self> {
        if points.is_empty() {
            return Err(SpatialError::EmptyInput("BoundingSphere::from_points needs at least one point"));
        }

        let center = AABB::from_points(points)?.center();
        let radius_squared = points
            .iter()
            .map(|p| (p - center).norm_squared())
            .fold(0.0_f32, f32::max);
        Ok(Self::new(center, radius_squared.sqrt()))
    }

    /// Sphere through the corners of a box
    pub fn from_box(aabb: &AABB) -> Self {
        Self::new(aabb.center(), aabb.extents().norm())
    }

    /// Smallest sphere enclosing both spheres
    pub fn merged(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance = offset.norm();

        if distance <= self.radius + other.radius {
            if distance <= self.radius - other.radius {
                return *self;
            }
            if distance <= other.radius - self.radius {
                return *other;
            }
        }

        let near = (self.radius - distance).max(other.radius);
        let far = (self.radius + distance).max(other.radius);
        let shift = offset * ((near - far) / (2.0 * distance));
        Self::new(self.center + offset + shift, (near + far) * 0.5)
    }

    /// Sphere moved by `matrix`; the radius follows the largest axis scale
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&Point3::from(self.center)).coords;
        let scale = (0..3)
            .map(|column| matrix.fixed_view::<3, 1>(0, column).norm())
            .fold(0.0_f32, f32::max);
        Self::new(center, self.radius * scale)
    }

    /// Classify a point against the sphere
    pub fn contains_point(&self, point: &Vec3) -> ContainmentType {
        let distance_squared = (point - self.center).norm_squared();
        let radius_squared = self.radius * self.radius;

        if distance_squared > radius_squared {
            ContainmentType::Disjoint
        } else if distance_squared < radius_squared {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Classify a box against the sphere
    pub fn contains_box(&self, aabb: &AABB) -> ContainmentType {
        if aabb
            .corners()
            .iter()
            .all(|corner| self.contains_point(corner) != ContainmentType::Disjoint)
        {
            return ContainmentType::Contains;
        }

        if aabb.distance_squared(&self.center) <= self.radius * self.radius {
            ContainmentType::Intersects
        } else {
            ContainmentType::Disjoint
        }
    }

    /// Classify another sphere against this one
    pub fn contains_sphere(&self, other: &Self) -> ContainmentType {
        let distance_squared = (other.center - self.center).norm_squared();
        let sum = self.radius + other.radius;
        let difference = self.radius - other.radius;

        if distance_squared > sum * sum {
            ContainmentType::Disjoint
        } else if difference >= 0.0 && distance_squared <= difference * difference {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Classify a frustum against the sphere
    pub fn contains_frustum(&self, frustum: &Frustum) -> ContainmentType {
        if frustum
            .corners()
            .iter()
            .all(|corner| self.contains_point(corner) != ContainmentType::Disjoint)
        {
            ContainmentType::Contains
        } else if frustum.intersects_sphere(self) {
            ContainmentType::Intersects
        } else {
            ContainmentType::Disjoint
        }
    }

    /// Check if this sphere overlaps (or touches) a box
    pub fn intersects_box(&self, aabb: &AABB) -> bool {
        aabb.intersects_sphere(self)
    }

    /// Check if this sphere overlaps (or touches) another
    pub fn intersects_sphere(&self, other: &Self) -> bool {
        let sum = self.radius + other.radius;
        (self.center - other.center).norm_squared() <= sum * sum
    }

    /// Check if this sphere overlaps a frustum
    pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
        frustum.intersects_sphere(self)
    }

    /// Which side of `plane` the sphere lies on
    pub fn intersects_plane(&self, plane: &Plane) -> PlaneIntersectionType {
        plane.classify_sphere(self)
    }

    /// Distance along the ray to the sphere surface (0 when the origin is inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersects_sphere(self)
    }
}
