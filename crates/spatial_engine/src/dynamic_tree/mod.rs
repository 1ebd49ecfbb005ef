//! Dynamic bounding-volume tree
//!
//! An incremental binary hierarchy for boxes that move every frame. Leaves
//! keep fattened bounds so small motions are absorbed without touching the
//! structure; insertion picks the sibling with the lowest perimeter cost and
//! every ancestor on the way back up is rebalanced with a single rotation.
//!
//! Queries are broad-phase: they report what the fat bounds overlap, and
//! the caller runs exact tests on the candidates.

mod bounds;
mod tree;

pub use bounds::TreeBounds;
pub use tree::{DynamicTree, ProxyId, RayControl};

use crate::geometry::{Rect, AABB};

/// Dynamic tree over 2D rectangles
pub type DynamicTree2<T> = DynamicTree<Rect, T>;

/// Dynamic tree over 3D boxes
pub type DynamicTree3<T> = DynamicTree<AABB, T>;
