//! Axis-aligned bounding box
//!
//! The workhorse volume of both index families. Inverted boxes (`min > max`)
//! are a valid value: [`AABB::empty`] returns one as the seed for merging.

use serde::{Deserialize, Serialize};

use super::{BoundingSphere, ContainmentType, Frustum, Plane, PlaneIntersectionType, Ray, Triangle};
use crate::error::{Result, SpatialError};
use crate::foundation::math::Vec3;

/// Upper bound on the vertex count produced by [`AABB::clip_triangle`]
pub const MAX_CLIP_VERTICES: usize = 32;

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Inverted box that any merge will overwrite
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(f32::MIN),
        }
    }

    /// Smallest box holding every point
    pub fn from_points(points: &[Vec3]) -> Result<Self> {
        if points.is_empty() {
            return Err(SpatialError::EmptyInput("AABB::from_points needs at least one point"));
        }

        Ok(points.iter().fold(Self::empty(), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// True when `min > max` on any axis
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Full edge lengths
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Sum of the twelve edge lengths; the insertion cost of the dynamic tree
    pub fn perimeter(&self) -> f32 {
        let size = self.size();
        4.0 * (size.x + size.y + size.z)
    }

    /// Total area of the six faces
    pub fn surface_area(&self) -> f32 {
        let size = self.size();
        2.0 * (size.x * size.y + size.y * size.z + size.z * size.x)
    }

    /// Smallest box enclosing both boxes
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Box grown by `margin` on every side
    pub fn fattened(&self, margin: f32) -> Self {
        let margin = Vec3::repeat(margin);
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Box moved by `offset`
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The eight corners: the four on the `max.z` face first, each face
    /// walked top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, min.y, min.z),
        ]
    }

    /// Point of the box nearest to `point`
    pub fn closest_point(&self, point: &Vec3) -> Vec3 {
        point.sup(&self.min).inf(&self.max)
    }

    /// Squared distance from `point` to the box (zero inside)
    pub fn distance_squared(&self, point: &Vec3) -> f32 {
        (self.closest_point(point) - point).norm_squared()
    }

    /// Classify a point: strictly inside, on a face, or outside
    pub fn contains_point(&self, point: &Vec3) -> ContainmentType {
        let (min, max) = (self.min, self.max);
        if point.x < min.x || point.x > max.x
            || point.y < min.y || point.y > max.y
            || point.z < min.z || point.z > max.z
        {
            ContainmentType::Disjoint
        } else if point.x == min.x || point.x == max.x
            || point.y == min.y || point.y == max.y
            || point.z == min.z || point.z == max.z
        {
            ContainmentType::Intersects
        } else {
            ContainmentType::Contains
        }
    }

    /// Classify another box against this one
    pub fn contains_box(&self, other: &Self) -> ContainmentType {
        if !self.intersects_box(other) {
            return ContainmentType::Disjoint;
        }

        if other.min.x >= self.min.x && other.max.x <= self.max.x
            && other.min.y >= self.min.y && other.max.y <= self.max.y
            && other.min.z >= self.min.z && other.max.z <= self.max.z
        {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Classify a sphere against this box
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> ContainmentType {
        let center = sphere.center;
        let radius = sphere.radius;

        // Every face is at least a radius away from the center
        if center.x - self.min.x >= radius && center.y - self.min.y >= radius && center.z - self.min.z >= radius
            && self.max.x - center.x >= radius && self.max.y - center.y >= radius && self.max.z - center.z >= radius
        {
            return ContainmentType::Contains;
        }

        let mut distance_squared = 0.0;
        for axis in 0..3 {
            let below = center[axis] - self.min[axis];
            if below < 0.0 {
                if below < -radius {
                    return ContainmentType::Disjoint;
                }
                distance_squared += below * below;
                continue;
            }

            let above = center[axis] - self.max[axis];
            if above > 0.0 {
                if above > radius {
                    return ContainmentType::Disjoint;
                }
                distance_squared += above * above;
            }
        }

        if distance_squared <= radius * radius {
            ContainmentType::Intersects
        } else {
            ContainmentType::Disjoint
        }
    }

    /// Classify a frustum against this box
    pub fn contains_frustum(&self, frustum: &Frustum) -> ContainmentType {
        let inside = frustum
            .corners()
            .iter()
            .filter(|corner| self.contains_point(corner) != ContainmentType::Disjoint)
            .count();

        if inside == frustum.corners().len() {
            ContainmentType::Contains
        } else if inside > 0 || frustum.intersects_box(self) {
            // No corner inside can still mean the box pokes through a frustum face
            ContainmentType::Intersects
        } else {
            ContainmentType::Disjoint
        }
    }

    /// Classify a triangle against this box
    pub fn contains_triangle(&self, triangle: &Triangle) -> ContainmentType {
        let vertices = [triangle.v1, triangle.v2, triangle.v3];
        if vertices
            .iter()
            .all(|v| self.contains_point(v) != ContainmentType::Disjoint)
        {
            return ContainmentType::Contains;
        }

        let mut clipped = [Vec3::zeros(); MAX_CLIP_VERTICES];
        match self.clip_triangle(triangle, &mut clipped, 0) {
            Ok(count) if count > 0 => ContainmentType::Intersects,
            _ => ContainmentType::Disjoint,
        }
    }

    /// Check if this AABB overlaps (or touches) another AABB
    pub fn intersects_box(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if this AABB overlaps a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distance_squared(&sphere.center) <= sphere.radius * sphere.radius
    }

    /// Check if this AABB overlaps a frustum
    pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
        frustum.intersects_box(self)
    }

    /// Which side of `plane` the box lies on
    pub fn intersects_plane(&self, plane: &Plane) -> PlaneIntersectionType {
        plane.classify_box(self)
    }

    /// Distance along the ray to the entry point (0 when the origin is inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersects_box(self)
    }

    /// Clip a triangle against the six faces of the box
    ///
    /// Runs Sutherland-Hodgman against -X, +X, -Y, +Y, -Z, +Z in that order and
    /// writes the resulting convex polygon into `out` starting at `offset`.
    /// Returns the vertex count, zero when the triangle misses the box. Nothing
    /// is written when `out` is too small.
    pub fn clip_triangle(&self, triangle: &Triangle, out: &mut [Vec3], offset: usize) -> Result<usize> {
        let mut polygon = [Vec3::zeros(); MAX_CLIP_VERTICES];
        let mut scratch = [Vec3::zeros(); MAX_CLIP_VERTICES];
        polygon[0] = triangle.v1;
        polygon[1] = triangle.v2;
        polygon[2] = triangle.v3;
        let mut count = 3;

        for axis in 0..3 {
            for (sign, bound) in [(-1.0, self.min[axis]), (1.0, self.max[axis])] {
                count = clip_polygon(&polygon[..count], &mut scratch, axis, sign, bound);
                std::mem::swap(&mut polygon, &mut scratch);
                if count == 0 {
                    return Ok(0);
                }
            }
        }

        let available = out.len().saturating_sub(offset);
        if count > available {
            return Err(SpatialError::BufferTooSmall { needed: count, available });
        }

        out[offset..offset + count].copy_from_slice(&polygon[..count]);
        Ok(count)
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

/// One Sutherland-Hodgman pass. A vertex is kept when
/// `sign * (v[axis] - bound) <= 0`.
fn clip_polygon(
    input: &[Vec3],
    output: &mut [Vec3; MAX_CLIP_VERTICES],
    axis: usize,
    sign: f32,
    bound: f32,
) -> usize {
    let Some(&last) = input.last() else {
        return 0;
    };

    let mut count = 0;
    let mut push = |v: Vec3| {
        if count < MAX_CLIP_VERTICES {
            output[count] = v;
            count += 1;
        }
    };

    let mut previous = last;
    let mut previous_distance = sign * (previous[axis] - bound);
    for &current in input {
        let distance = sign * (current[axis] - bound);
        let current_inside = distance <= 0.0;
        let previous_inside = previous_distance <= 0.0;

        if current_inside != previous_inside {
            let t = previous_distance / (previous_distance - distance);
            push(previous + (current - previous) * t);
        }
        if current_inside {
            push(current);
        }

        previous = current;
        previous_distance = distance;
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> AABB {
        AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = unit_box();

        assert_eq!(aabb.contains_point(&Vec3::zeros()), ContainmentType::Contains);
        assert_eq!(aabb.contains_point(&Vec3::new(1.0, 0.5, 0.0)), ContainmentType::Intersects);
        assert_eq!(aabb.contains_point(&Vec3::new(-1.0, -1.0, -1.0)), ContainmentType::Intersects);
        assert_eq!(aabb.contains_point(&Vec3::new(2.0, 0.0, 0.0)), ContainmentType::Disjoint);
    }

    #[test]
    fn test_aabb_contains_box() {
        let outer = AABB::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));

        let inner = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0));
        let straddling = AABB::new(Vec3::new(9.0, 9.0, 9.0), Vec3::new(11.0, 11.0, 11.0));
        let outside = AABB::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(21.0, 1.0, 1.0));

        assert_eq!(outer.contains_box(&inner), ContainmentType::Contains);
        assert_eq!(outer.contains_box(&outer), ContainmentType::Contains);
        assert_eq!(outer.contains_box(&straddling), ContainmentType::Intersects);
        assert_eq!(outer.contains_box(&outside), ContainmentType::Disjoint);
    }

    #[test]
    fn test_merged_box_touches_both_inputs() {
        let pairs = [
            (unit_box(), AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 7.0, 8.0))),
            (AABB::empty(), unit_box()),
            (unit_box(), unit_box().translated(&Vec3::new(-3.0, 0.5, 0.0))),
        ];

        for (a, b) in pairs {
            let merged = a.merged(&b);
            assert_ne!(merged.contains_box(&b), ContainmentType::Disjoint);
            if !a.is_empty() {
                assert_ne!(merged.contains_box(&a), ContainmentType::Disjoint);
            }
        }
    }

    #[test]
    fn test_aabb_contains_sphere() {
        let aabb = AABB::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));

        assert_eq!(
            aabb.contains_sphere(&BoundingSphere::new(Vec3::new(5.0, 5.0, 5.0), 2.0)),
            ContainmentType::Contains
        );
        assert_eq!(
            aabb.contains_sphere(&BoundingSphere::new(Vec3::new(11.0, 5.0, 5.0), 2.0)),
            ContainmentType::Intersects
        );
        assert_eq!(
            aabb.contains_sphere(&BoundingSphere::new(Vec3::new(13.0, 5.0, 5.0), 2.0)),
            ContainmentType::Disjoint
        );
        // Near a corner: each axis is within the radius but the diagonal is not
        assert_eq!(
            aabb.contains_sphere(&BoundingSphere::new(Vec3::new(11.5, 11.5, 11.5), 2.0)),
            ContainmentType::Disjoint
        );
    }

    #[test]
    fn test_from_points_rejects_empty_input() {
        assert!(matches!(AABB::from_points(&[]), Err(SpatialError::EmptyInput(_))));

        let aabb = AABB::from_points(&[Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 2.0, 0.0)]).unwrap();
        assert_relative_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_relative_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_perimeter_sums_all_edges() {
        let aabb = AABB::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(aabb.perimeter(), 24.0);
        assert_relative_eq!(aabb.surface_area(), 22.0);
    }

    #[test]
    fn test_clip_triangle_inside_is_unchanged() {
        let aabb = AABB::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
        let triangle = Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        let mut out = [Vec3::zeros(); 8];
        let count = aabb.clip_triangle(&triangle, &mut out, 2).unwrap();

        assert_eq!(count, 3);
        assert_eq!(&out[2..5], &[triangle.v1, triangle.v2, triangle.v3]);
        assert_eq!(out[0], Vec3::zeros());
    }

    #[test]
    fn test_clip_triangle_crossing_a_face() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        // Tip of the triangle sticks out through +X
        let triangle = Triangle::new(Vec3::new(0.0, -0.5, 0.0), Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0));

        let mut out = [Vec3::zeros(); MAX_CLIP_VERTICES];
        let count = aabb.clip_triangle(&triangle, &mut out, 0).unwrap();

        assert_eq!(count, 4);
        for vertex in &out[..count] {
            assert_ne!(aabb.contains_point(vertex), ContainmentType::Disjoint);
        }
        assert!(out[..count].iter().any(|v| (v.x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_clip_triangle_outside_and_small_buffer() {
        let aabb = unit_box();
        let outside = Triangle::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 5.0, 5.0), Vec3::new(5.0, 6.0, 5.0));
        let mut out = [Vec3::zeros(); 4];
        assert_eq!(aabb.clip_triangle(&outside, &mut out, 0).unwrap(), 0);

        let inside = Triangle::new(Vec3::zeros(), Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0));
        let result = aabb.clip_triangle(&inside, &mut out, 2);
        assert!(matches!(result, Err(SpatialError::BufferTooSmall { needed: 3, available: 2 })));
    }

    #[test]
    fn test_contains_triangle() {
        let aabb = unit_box();
        let inside = Triangle::new(Vec3::zeros(), Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0));
        let crossing = Triangle::new(Vec3::zeros(), Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0));
        let outside = Triangle::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 5.0, 5.0), Vec3::new(5.0, 6.0, 5.0));

        assert_eq!(aabb.contains_triangle(&inside), ContainmentType::Contains);
        assert_eq!(aabb.contains_triangle(&crossing), ContainmentType::Intersects);
        assert_eq!(aabb.contains_triangle(&outside), ContainmentType::Disjoint);
    }
}
