//! Hierarchical space partitions
//!
//! One generic engine, [`PartitionTree`], parameterized by its child count
//! and a subdivision rule. [`Octree`] splits every axis; [`Quadtree`] splits
//! the ground plane (x and z) and keeps the full vertical extent.

mod octree;
mod quadtree;
mod tree;

pub use octree::{octants, Octree};
pub use quadtree::{quadrants, Quadtree};
pub use tree::{NodeKey, PartitionNode, PartitionTree, Subdivide, Visit};
