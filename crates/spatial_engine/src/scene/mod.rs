//! Spatial collection
//!
//! Indexes externally owned, independently moving objects in an octree.
//! Each object sits at the deepest node that fully contains its bounds, so
//! an object straddling a split plane stays one level up instead of being
//! duplicated. Moving objects are re-classified on an explicit
//! [`SpatialCollection::notify_moved`] call.

mod collection;
mod object;

pub use collection::SpatialCollection;
pub use object::{CollectionId, ItemKey, SpatialData, SpatialObject};
