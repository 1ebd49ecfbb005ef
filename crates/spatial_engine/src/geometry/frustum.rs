//! View frustum derived from a combined view-projection matrix
//!
//! Clip space uses a `[0, 1]` depth range. Plane normals point out of the
//! volume, so a point is inside when every plane reports a non-positive
//! distance.

use approx::abs_diff_eq;

use super::{BoundingSphere, ContainmentType, Plane, PlaneIntersectionType, Ray, AABB};
use crate::foundation::math::{Mat4, Vec3, Vec4, PLANE_EPSILON};

/// Number of bounding planes
pub const PLANE_COUNT: usize = 6;

/// Number of corner points
pub const CORNER_COUNT: usize = 8;

const NEAR: usize = 0;
const FAR: usize = 1;
const LEFT: usize = 2;
const RIGHT: usize = 3;
const TOP: usize = 4;
const BOTTOM: usize = 5;

/// Frustum for visibility culling
///
/// Planes are stored as near, far, left, right, top, bottom. Corners run
/// left-top, right-top, right-bottom, left-bottom on the near plane and then
/// the same four on the far plane. Both are rebuilt whenever the matrix
/// changes and cannot be edited on their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    matrix: Mat4,
    planes: [Plane; PLANE_COUNT],
    corners: [Vec3; CORNER_COUNT],
}

impl Frustum {
    /// Frustum of a view-projection matrix
    pub fn new(matrix: Mat4) -> Self {
        let planes = extract_planes(&matrix);
        let corners = compute_corners(&planes);
        Self { matrix, planes, corners }
    }

    /// The view-projection matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Replace the matrix and rebuild planes and corners
    pub fn set_matrix(&mut self, matrix: Mat4) {
        *self = Self::new(matrix);
    }

    /// Planes in near, far, left, right, top, bottom order
    pub fn planes(&self) -> &[Plane; PLANE_COUNT] {
        &self.planes
    }

    /// Corner points, near plane first
    pub fn corners(&self) -> &[Vec3; CORNER_COUNT] {
        &self.corners
    }

    /// The near plane
    pub fn near(&self) -> &Plane {
        &self.planes[NEAR]
    }

    /// The far plane
    pub fn far(&self) -> &Plane {
        &self.planes[FAR]
    }

    /// The left plane
    pub fn left(&self) -> &Plane {
        &self.planes[LEFT]
    }

    /// The right plane
    pub fn right(&self) -> &Plane {
        &self.planes[RIGHT]
    }

    /// The top plane
    pub fn top(&self) -> &Plane {
        &self.planes[TOP]
    }

    /// The bottom plane
    pub fn bottom(&self) -> &Plane {
        &self.planes[BOTTOM]
    }

    /// Classify a point; within [`PLANE_EPSILON`] of a face counts as touching
    pub fn contains_point(&self, point: &Vec3) -> ContainmentType {
        let mut result = ContainmentType::Contains;
        for plane in &self.planes {
            let distance = plane.dot_coordinate(point);
            if distance > PLANE_EPSILON {
                return ContainmentType::Disjoint;
            }
            if distance.abs() <= PLANE_EPSILON {
                result = ContainmentType::Intersects;
            }
        }
        result
    }

    /// Classify a box against the frustum
    pub fn contains_box(&self, aabb: &AABB) -> ContainmentType {
        let mut result = ContainmentType::Contains;
        for plane in &self.planes {
            match plane.classify_box(aabb) {
                PlaneIntersectionType::Front => return ContainmentType::Disjoint,
                PlaneIntersectionType::Intersecting => result = ContainmentType::Intersects,
                PlaneIntersectionType::Back => {}
            }
        }
        result
    }

    /// Classify a sphere against the frustum
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> ContainmentType {
        let mut result = ContainmentType::Contains;
        for plane in &self.planes {
            match plane.classify_sphere(sphere) {
                PlaneIntersectionType::Front => return ContainmentType::Disjoint,
                PlaneIntersectionType::Intersecting => result = ContainmentType::Intersects,
                PlaneIntersectionType::Back => {}
            }
        }
        result
    }

    /// Classify another frustum by testing its corners against each plane
    pub fn contains_frustum(&self, other: &Frustum) -> ContainmentType {
        if abs_diff_eq!(self.matrix, other.matrix) {
            return ContainmentType::Contains;
        }

        let mut result = ContainmentType::Contains;
        for plane in &self.planes {
            let in_front = other
                .corners
                .iter()
                .filter(|corner| plane.dot_coordinate(corner) > 0.0)
                .count();

            if in_front == CORNER_COUNT {
                return ContainmentType::Disjoint;
            }
            if in_front > 0 {
                result = ContainmentType::Intersects;
            }
        }
        result
    }

    /// Overlap test against a box
    pub fn intersects_box(&self, aabb: &AABB) -> bool {
        self.contains_box(aabb) != ContainmentType::Disjoint
    }

    /// Overlap test against a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.contains_sphere(sphere) != ContainmentType::Disjoint
    }

    /// Overlap test against another frustum
    pub fn intersects_frustum(&self, other: &Frustum) -> bool {
        self.contains_frustum(other) != ContainmentType::Disjoint
    }

    /// Which side of `plane` the frustum corners lie on
    pub fn intersects_plane(&self, plane: &Plane) -> PlaneIntersectionType {
        let first = plane.classify_point(&self.corners[0]);
        if self.corners[1..].iter().all(|corner| plane.classify_point(corner) == first) {
            first
        } else {
            PlaneIntersectionType::Intersecting
        }
    }

    /// Distance along the ray to the frustum volume (0 when the origin is inside)
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersects_frustum(self)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(Mat4::identity())
    }
}

fn plane_from_row(row: Vec4) -> Plane {
    Plane::new(Vec3::new(row.x, row.y, row.z), row.w).normalized()
}

fn extract_planes(matrix: &Mat4) -> [Plane; PLANE_COUNT] {
    let row = |i: usize| -> Vec4 { matrix.row(i).transpose() };
    let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

    [
        plane_from_row(-r2),
        plane_from_row(r2 - r3),
        plane_from_row(-r3 - r0),
        plane_from_row(r0 - r3),
        plane_from_row(r1 - r3),
        plane_from_row(-r3 - r1),
    ]
}

fn compute_corners(planes: &[Plane; PLANE_COUNT]) -> [Vec3; CORNER_COUNT] {
    let corner = |depth: usize, side: usize, vertical: usize| {
        Plane::intersection_point(&planes[depth], &planes[side], &planes[vertical]).unwrap_or_else(Vec3::zeros)
    };

    [
        corner(NEAR, LEFT, TOP),
        corner(NEAR, RIGHT, TOP),
        corner(NEAR, RIGHT, BOTTOM),
        corner(NEAR, LEFT, BOTTOM),
        corner(FAR, LEFT, TOP),
        corner(FAR, RIGHT, TOP),
        corner(FAR, RIGHT, BOTTOM),
        corner(FAR, LEFT, BOTTOM),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    /// 90 degree camera at the origin looking down -Z, depth 1..100
    fn camera() -> Frustum {
        let projection = Mat4::perspective(FRAC_PI_2, 1.0, 1.0, 100.0);
        let view = Mat4::look_at(Vec3::zeros(), -Vec3::z(), Vec3::y());
        Frustum::new(projection * view)
    }

    #[test]
    fn test_planes_face_outward() {
        let frustum = camera();

        assert_relative_eq!(frustum.near().normal, Vec3::z(), epsilon = 1e-5);
        assert_relative_eq!(frustum.near().d, 1.0, epsilon = 1e-4);
        assert_relative_eq!(frustum.far().normal, -Vec3::z(), epsilon = 1e-5);
        assert_relative_eq!(frustum.far().d, -100.0, epsilon = 1e-2);
        assert!(frustum.left().normal.x < 0.0);
        assert!(frustum.right().normal.x > 0.0);
        assert!(frustum.top().normal.y > 0.0);
        assert!(frustum.bottom().normal.y < 0.0);
    }

    #[test]
    fn test_corners() {
        let corners = *camera().corners();

        assert_relative_eq!(corners[0], Vec3::new(-1.0, 1.0, -1.0), epsilon = 1e-3);
        assert_relative_eq!(corners[2], Vec3::new(1.0, -1.0, -1.0), epsilon = 1e-3);
        assert_relative_eq!(corners[4], Vec3::new(-100.0, 100.0, -100.0), epsilon = 0.1);
        assert_relative_eq!(corners[6], Vec3::new(100.0, -100.0, -100.0), epsilon = 0.1);
    }

    #[test]
    fn test_set_matrix_rebuilds_derived_state() {
        let mut frustum = camera();
        let before = *frustum.corners();

        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 50.0), Vec3::new(0.0, 0.0, 49.0), Vec3::y());
        frustum.set_matrix(Mat4::perspective(FRAC_PI_2, 1.0, 1.0, 100.0) * view);

        assert_relative_eq!(frustum.corners()[0], before[0] + Vec3::new(0.0, 0.0, 50.0), epsilon = 1e-3);
        assert_relative_eq!(frustum.near().d, -49.0, epsilon = 1e-3);
    }

    #[test]
    fn test_contains_point() {
        let frustum = camera();

        assert_eq!(frustum.contains_point(&Vec3::new(0.0, 0.0, -10.0)), ContainmentType::Contains);
        assert_eq!(frustum.contains_point(&Vec3::new(0.0, 0.0, 10.0)), ContainmentType::Disjoint);
        assert_eq!(frustum.contains_point(&Vec3::new(0.0, 0.0, -0.5)), ContainmentType::Disjoint);
        assert_eq!(frustum.contains_point(&Vec3::new(0.0, 0.0, -1.0)), ContainmentType::Intersects);
    }

    #[test]
    fn test_contains_box_and_sphere() {
        let frustum = camera();

        let inside = AABB::new(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -10.0));
        let crossing = AABB::new(Vec3::new(-1.0, -1.0, -2.0), Vec3::new(1.0, 1.0, 2.0));
        let behind = AABB::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(frustum.contains_box(&inside), ContainmentType::Contains);
        assert_eq!(frustum.contains_box(&crossing), ContainmentType::Intersects);
        assert_eq!(frustum.contains_box(&behind), ContainmentType::Disjoint);

        assert_eq!(frustum.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -50.0), 1.0)), ContainmentType::Contains);
        assert_eq!(frustum.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -0.5), 1.0)), ContainmentType::Intersects);
        assert_eq!(frustum.contains_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 50.0), 1.0)), ContainmentType::Disjoint);
    }

    #[test]
    fn test_contains_frustum() {
        let frustum = camera();
        assert_eq!(frustum.contains_frustum(&frustum), ContainmentType::Contains);

        let view = Mat4::look_at(Vec3::zeros(), -Vec3::z(), Vec3::y());
        let narrow = Frustum::new(Mat4::perspective(FRAC_PI_2 / 3.0, 1.0, 2.0, 50.0) * view);
        assert_eq!(frustum.contains_frustum(&narrow), ContainmentType::Contains);
        assert_eq!(narrow.contains_frustum(&frustum), ContainmentType::Intersects);

        let backwards = Frustum::new(
            Mat4::perspective(FRAC_PI_2, 1.0, 1.0, 100.0) * Mat4::look_at(Vec3::zeros(), Vec3::z(), Vec3::y()),
        );
        assert_eq!(frustum.contains_frustum(&backwards), ContainmentType::Disjoint);
    }

    #[test]
    fn test_intersects_ray() {
        let frustum = camera();

        let toward = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::z());
        assert_relative_eq!(frustum.intersects_ray(&toward).unwrap(), 11.0, epsilon = 1e-3);

        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::z());
        assert_eq!(frustum.intersects_ray(&away), None);

        let inside = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::x());
        assert_eq!(frustum.intersects_ray(&inside), Some(0.0));
    }

    #[test]
    fn test_intersects_plane() {
        let frustum = camera();

        let cutting = Plane::from_point_normal(Vec3::new(0.0, 0.0, -50.0), Vec3::z());
        let behind = Plane::from_point_normal(Vec3::new(0.0, 0.0, 5.0), Vec3::z());
        assert_eq!(frustum.intersects_plane(&cutting), PlaneIntersectionType::Intersecting);
        assert_eq!(frustum.intersects_plane(&behind), PlaneIntersectionType::Back);
    }
}
