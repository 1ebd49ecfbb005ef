//! Capability contract for objects stored in a spatial collection

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use slotmap::new_key_type;

use crate::geometry::AABB;
use crate::partition::NodeKey;

new_key_type! {
    /// Slot of an object inside a [`SpatialCollection`](super::SpatialCollection)
    pub struct ItemKey;
}

/// Identity of one collection instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionId(u64);

impl CollectionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Back-reference a collection stores on each object it indexes
///
/// Callers should only hand it back through [`SpatialObject`]; its contents
/// are meaningful to the owning collection alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialData {
    pub(crate) collection: CollectionId,
    pub(crate) node: NodeKey,
    pub(crate) item: ItemKey,
}

impl SpatialData {
    /// Collection holding the object
    pub fn collection(&self) -> CollectionId {
        self.collection
    }
}

/// An externally owned object with world-space bounds
///
/// The slot behind `spatial_data` is written through `&self`, so
/// implementors usually keep it in a `Cell`. After changing the bounds the
/// owner calls [`SpatialCollection::notify_moved`](super::SpatialCollection::notify_moved).
pub trait SpatialObject {
    /// Current world-space bounds
    fn bounding_box(&self) -> AABB;

    /// Slot written by the collection
    fn spatial_data(&self) -> Option<SpatialData>;

    /// Store or clear the collection's back-reference
    fn set_spatial_data(&self, data: Option<SpatialData>);
}

impl<O: SpatialObject + ?Sized> SpatialObject for Rc<O> {
    fn bounding_box(&self) -> AABB {
        (**self).bounding_box()
    }

    fn spatial_data(&self) -> Option<SpatialData> {
        (**self).spatial_data()
    }

    fn set_spatial_data(&self, data: Option<SpatialData>) {
        (**self).set_spatial_data(data);
    }
}

impl<O: SpatialObject + ?Sized> SpatialObject for Arc<O> {
    fn bounding_box(&self) -> AABB {
        (**self).bounding_box()
    }

    fn spatial_data(&self) -> Option<SpatialData> {
        (**self).spatial_data()
    }

    fn set_spatial_data(&self, data: Option<SpatialData>) {
        (**self).set_spatial_data(data);
    }
}
