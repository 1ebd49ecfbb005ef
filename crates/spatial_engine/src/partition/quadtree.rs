//! Quadtree: four quadrants on the x/z plane

use super::PartitionTree;
use crate::error::Result;
use crate::geometry::AABB;

/// Partition tree splitting x and z at the center, keeping the y extent
pub type Quadtree<T> = PartitionTree<T, 4>;

impl<T: Default> Quadtree<T> {
    /// Quadtree over `bounds` expandable down to `max_depth`
    pub fn new(bounds: AABB, max_depth: u32) -> Result<Self> {
        Self::with_subdivision(bounds, max_depth, quadrants)
    }
}

/// Split a box into four columns
///
/// Quadrant `i` takes the upper half on x when bit 0 is set and on z for
/// bit 1.
pub fn quadrants(bounds: &AABB) -> [AABB; 4] {
    let center = bounds.center();
    std::array::from_fn(|quadrant| {
        let mut min = bounds.min;
        let mut max = bounds.max;
        for (bit, axis) in [(0, 0), (1, 2)] {
            if quadrant & (1 << bit) != 0 {
                min[axis] = center[axis];
            } else {
                max[axis] = center[axis];
            }
        }
        AABB::new(min, max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_quadrants_keep_height() {
        let parent = AABB::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(4.0, 3.0, 4.0));
        let children = quadrants(&parent);

        assert_eq!(children[0], AABB::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(2.0, 3.0, 2.0)));
        assert_eq!(children[1], AABB::new(Vec3::new(2.0, -1.0, 0.0), Vec3::new(4.0, 3.0, 2.0)));
        assert_eq!(children[2], AABB::new(Vec3::new(0.0, -1.0, 2.0), Vec3::new(2.0, 3.0, 4.0)));
        assert_eq!(children[3], AABB::new(Vec3::new(2.0, -1.0, 2.0), Vec3::new(4.0, 3.0, 4.0)));
    }

    #[test]
    fn test_quadtree_expansion() {
        let mut tree: Quadtree<Vec<u32>> = Quadtree::new(AABB::new(Vec3::zeros(), Vec3::repeat(4.0)), 1).unwrap();
        let root = tree.root();

        assert!(tree.expand(root).unwrap());
        let children = tree.children(root).unwrap().unwrap();
        assert!(!tree.expand(children[0]).unwrap());
        assert_eq!(tree.node(children[2]).unwrap().bounds().max.y, 4.0);
    }
}
