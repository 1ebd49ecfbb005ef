//! Octree: eight equal octants per node

use super::PartitionTree;
use crate::error::Result;
use crate::geometry::AABB;

/// Partition tree splitting x, y and z at the center
pub type Octree<T> = PartitionTree<T, 8>;

impl<T: Default> Octree<T> {
    /// Octree over `bounds` expandable down to `max_depth`
    pub fn new(bounds: AABB, max_depth: u32) -> Result<Self> {
        Self::with_subdivision(bounds, max_depth, octants)
    }
}

/// Split a box into its octants
///
/// Octant `i` takes the upper half on x when bit 0 is set, on y for bit 1
/// and on z for bit 2.
pub fn octants(bounds: &AABB) -> [AABB; 8] {
    let center = bounds.center();
    std::array::from_fn(|octant| {
        let mut min = bounds.min;
        let mut max = center;
        for axis in 0..3 {
            if octant & (1 << axis) != 0 {
                min[axis] = center[axis];
                max[axis] = bounds.max[axis];
            }
        }
        AABB::new(min, max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_octants_tile_the_parent() {
        let parent = AABB::new(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(2.0, 8.0, 6.0));
        let children = octants(&parent);

        assert_eq!(children[0], AABB::new(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 5.0)));
        assert_eq!(children[7], AABB::new(Vec3::new(0.0, 4.0, 5.0), Vec3::new(2.0, 8.0, 6.0)));
        assert_eq!(children[1].min.x, 0.0);
        assert_eq!(children[2].min.y, 4.0);
        assert_eq!(children[4].min.z, 5.0);

        let volume: f32 = children.iter().map(|c| c.size().product()).sum();
        assert_relative_eq!(volume, parent.size().product());
    }
}
