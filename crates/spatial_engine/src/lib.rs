//! # Spatial Engine
//!
//! Geometric primitives, exact intersection tests and spatial indices for
//! large sets of moving, axis-aligned bounded objects.
//!
//! ## Features
//!
//! - **Geometry**: boxes, spheres, frusta, planes, rays, segments and
//!   triangles with every pairwise containment and intersection test
//! - **Dynamic Tree**: incremental bounding-volume hierarchy (2D and 3D) with
//!   fattened leaves, cost-based insertion and rotation balancing
//! - **Partition Trees**: lazily expanded octree and quadtree
//! - **Spatial Collection**: octree index over externally owned objects that
//!   grows its root on demand and re-classifies objects when they move
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_engine::prelude::*;
//!
//! fn main() -> Result<(), SpatialError> {
//!     let mut tree: DynamicTree3<&str> = DynamicTree3::new();
//!     let crate_box = tree.insert(AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)), "crate");
//!
//!     let region = AABB::new(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));
//!     assert_eq!(tree.find_all(&region), vec![&"crate"]);
//!
//!     tree.move_proxy(crate_box, AABB::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0)))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod dynamic_tree;
pub mod error;
pub mod foundation;
pub mod geometry;
pub mod partition;
pub mod scene;

pub use error::{Result, SpatialError};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{CollectionConfig, Config, DynamicTreeConfig, PartitionConfig, SpatialConfig},
        dynamic_tree::{DynamicTree, DynamicTree2, DynamicTree3, ProxyId, RayControl, TreeBounds},
        error::SpatialError,
        foundation::math::{Mat4, Mat4Ext, Vec2, Vec3},
        geometry::{
            BoundingSphere, ContainmentType, Frustum, LineSegment, Plane, PlaneIntersectionType, Ray, Rect,
            Triangle, AABB,
        },
        partition::{NodeKey, Octree, PartitionTree, Quadtree, Visit},
        scene::{SpatialCollection, SpatialData, SpatialObject},
    };
}
