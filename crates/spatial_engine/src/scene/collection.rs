//! Octree-backed collection of movable objects

use slotmap::SlotMap;

use super::object::{CollectionId, ItemKey, SpatialData, SpatialObject};
use crate::config::CollectionConfig;
use crate::error::{Result, SpatialError};
use crate::geometry::{BoundingSphere, ContainmentType, Frustum, Ray, AABB};
use crate::partition::{NodeKey, Octree, Visit};

/// Objects indexed by an octree that grows when something leaves its bounds
///
/// The collection owns the objects handed to [`add`](Self::add). Shared
/// handles (`Rc`/`Arc`) let the caller keep moving them afterwards.
#[derive(Debug)]
pub struct SpatialCollection<O: SpatialObject> {
    id: CollectionId,
    tree: Octree<Vec<ItemKey>>,
    items: SlotMap<ItemKey, O>,
    config: CollectionConfig,
}

impl<O: SpatialObject> SpatialCollection<O> {
    /// Empty collection over `bounds`
    pub fn new(bounds: AABB, max_depth: u32) -> Result<Self> {
        Self::with_config(CollectionConfig { bounds, max_depth })
    }

    /// Empty collection from a validated configuration
    pub fn with_config(config: CollectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: CollectionId::next(),
            tree: Octree::new(config.bounds, config.max_depth)?,
            items: SlotMap::with_key(),
            config,
        })
    }

    /// Identity written into every indexed object
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current root bounds
    pub fn bounds(&self) -> &AABB {
        self.tree.bounds()
    }

    /// The underlying octree; node values list the objects stored there
    pub fn tree(&self) -> &Octree<Vec<ItemKey>> {
        &self.tree
    }

    /// Iterate over the indexed objects
    pub fn iter(&self) -> impl Iterator<Item = &O> {
        self.items.values()
    }

    /// Whether `item` is indexed by this collection
    pub fn contains(&self, item: &O) -> bool {
        item.spatial_data()
            .is_some_and(|data| data.collection == self.id && self.items.contains_key(data.item))
    }

    /// Index an object
    ///
    /// Grows the root first when the object lies outside it. A failed add
    /// leaves the collection as it was, e.g. when the object is already
    /// indexed anywhere or the root cannot grow to finite bounds around it.
    pub fn add(&mut self, item: O) -> Result<()> {
        if item.spatial_data().is_some() {
            return Err(SpatialError::AlreadyIndexed);
        }

        let bounds = item.bounding_box();
        let key = self.items.insert(item);

        let placed = if self.tree.bounds().contains_box(&bounds) == ContainmentType::Contains {
            self.place(key)
        } else {
            self.resize(&bounds)
        };

        if let Err(err) = placed {
            if let Some(item) = self.items.remove(key) {
                item.set_spatial_data(None);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Stop indexing an object and hand back the stored handle
    pub fn remove(&mut self, item: &O) -> Result<O> {
        let data = self.membership(item)?;

        self.detach(&data)?;
        let stored = self.items.remove(data.item).ok_or(SpatialError::NotIndexed)?;
        stored.set_spatial_data(None);
        self.prune_from(data.node)?;
        Ok(stored)
    }

    /// Re-classify an object after its bounds changed
    ///
    /// Walks up from the object's node to the first ancestor that still
    /// contains the new bounds. The object is placed again when that is a
    /// different node, growing the root if needed. Returns whether it was
    /// placed again.
    pub fn notify_moved(&mut self, item: &O) -> Result<bool> {
        let data = self.membership(item)?;
        let bounds = item.bounding_box();

        let mut node = data.node;
        let mut contained = self.tree.node(node)?.bounds().contains_box(&bounds) == ContainmentType::Contains;
        while !contained {
            let Some(parent) = self.tree.parent(node)? else {
                break;
            };
            node = parent;
            contained = self.tree.node(node)?.bounds().contains_box(&bounds) == ContainmentType::Contains;
        }

        if node == data.node && contained {
            return Ok(false);
        }

        if contained {
            self.detach(&data)?;
            self.place(data.item)?;
            self.prune_from(data.node)?;
        } else {
            self.resize(&bounds)?;
        }

        Ok(true)
    }

    /// Drop every object, clearing their spatial data
    pub fn clear(&mut self) {
        for (_, item) in self.items.drain() {
            item.set_spatial_data(None);
        }
        self.tree.clear();
    }

    /// Objects whose bounds overlap `query`
    pub fn query_box(&self, query: &AABB) -> Vec<&O> {
        self.collect(|node| query.contains_box(node), |bounds| query.intersects_box(bounds))
    }

    /// Objects whose bounds overlap `sphere`
    pub fn query_sphere(&self, sphere: &BoundingSphere) -> Vec<&O> {
        self.collect(|node| sphere.contains_box(node), |bounds| sphere.intersects_box(bounds))
    }

    /// Objects whose bounds overlap `frustum`
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<&O> {
        self.collect(|node| frustum.contains_box(node), |bounds| frustum.intersects_box(bounds))
    }

    /// Objects whose bounds the ray hits, nearest first
    pub fn query_ray(&self, ray: &Ray) -> Vec<(&O, f32)> {
        let mut hits = Vec::new();
        self.tree.walk(|_, node| {
            if ray.intersects_box(node.bounds()).is_none() {
                return Visit::Skip;
            }

            hits.extend(node.value().iter().filter_map(|&key| {
                let item = self.items.get(key)?;
                ray.intersects_box(&item.bounding_box()).map(|distance| (item, distance))
            }));
            Visit::Continue
        });

        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// Shared query walk
    ///
    /// `classify` tells how the query relates to a node. A disjoint node is
    /// pruned; everything below a contained node is taken without further
    /// tests; objects at an intersecting node are checked with `overlaps`.
    fn collect<C, P>(&self, classify: C, overlaps: P) -> Vec<&O>
    where
        C: Fn(&AABB) -> ContainmentType,
        P: Fn(&AABB) -> bool,
    {
        let mut found = Vec::new();
        // Depth of the contained node whose subtree is being bulk-collected;
        // the walk is pre-order, so the subtree ends at the first node that
        // is not deeper.
        let mut inside_below: Option<u32> = None;

        self.tree.walk(|_, node| {
            if inside_below.is_some_and(|depth| node.depth() <= depth) {
                inside_below = None;
            }
            if inside_below.is_some() {
                found.extend(node.value().iter().filter_map(|&key| self.items.get(key)));
                return Visit::Continue;
            }

            match classify(node.bounds()) {
                ContainmentType::Disjoint => Visit::Skip,
                ContainmentType::Contains => {
                    found.extend(node.value().iter().filter_map(|&key| self.items.get(key)));
                    inside_below = Some(node.depth());
                    Visit::Continue
                }
                ContainmentType::Intersects => {
                    found.extend(
                        node.value()
                            .iter()
                            .filter_map(|&key| self.items.get(key))
                            .filter(|item| overlaps(&item.bounding_box())),
                    );
                    Visit::Continue
                }
            }
        });

        found
    }

    /// Validated back-reference of an object claimed to be in this collection
    fn membership(&self, item: &O) -> Result<SpatialData> {
        let data = item.spatial_data().ok_or(SpatialError::NotIndexed)?;
        if data.collection != self.id {
            return Err(SpatialError::ForeignItem);
        }
        if !self.items.contains_key(data.item) {
            return Err(SpatialError::NotIndexed);
        }
        Ok(data)
    }

    /// Store an object at the deepest node whose bounds contain it
    fn place(&mut self, key: ItemKey) -> Result<()> {
        let item = self.items.get(key).ok_or(SpatialError::NotIndexed)?;
        let bounds = item.bounding_box();

        let mut node = self.tree.root();
        loop {
            let regions = self.tree.subdivide(self.tree.node(node)?.bounds());
            let Some(octant) = regions
                .iter()
                .position(|region| region.contains_box(&bounds) == ContainmentType::Contains)
            else {
                break;
            };

            if !self.tree.expand(node)? {
                break;
            }
            match self.tree.children(node)? {
                Some(children) => node = children[octant],
                None => break,
            }
        }

        self.tree.node_mut(node)?.value_mut().push(key);
        item.set_spatial_data(Some(SpatialData {
            collection: self.id,
            node,
            item: key,
        }));
        Ok(())
    }

    /// Take an object out of its node's list
    fn detach(&mut self, data: &SpatialData) -> Result<()> {
        self.tree.node_mut(data.node)?.value_mut().retain(|&key| key != data.item);
        Ok(())
    }

    /// Collapse empty nodes from `start` towards the root
    fn prune_from(&mut self, start: NodeKey) -> Result<()> {
        let mut cursor = Some(start);
        while let Some(key) = cursor {
            self.tree.collapse(key, |tree, node| is_vacant(tree, node))?;
            if self.tree.node(key)?.has_children() {
                // Still populated below: no ancestor can collapse either
                break;
            }
            cursor = self.tree.parent(key)?;
        }
        Ok(())
    }

    /// Grow the root to cover `bounds` and re-place every object
    ///
    /// The root stays centered; each axis that falls short at least doubles
    /// its half extent.
    fn resize(&mut self, bounds: &AABB) -> Result<()> {
        let old = *self.tree.bounds();
        let center = old.center();
        let mut extents = old.extents();
        for axis in 0..3 {
            let needed = (bounds.max[axis] - center[axis]).max(center[axis] - bounds.min[axis]);
            if needed > extents[axis] {
                extents[axis] = (extents[axis] * 2.0).max(needed);
            }
        }

        let grown = CollectionConfig {
            bounds: AABB::from_center_extents(center, extents),
            ..self.config
        };
        grown.validate()?;
        log::debug!("Growing spatial collection root from {old:?} to {:?}", grown.bounds);

        self.tree = Octree::new(grown.bounds, grown.max_depth)?;
        self.config = grown;

        let keys: Vec<ItemKey> = self.items.keys().collect();
        for key in keys {
            self.place(key)?;
        }
        Ok(())
    }
}

/// A node with no objects whose children hold none either
fn is_vacant(tree: &Octree<Vec<ItemKey>>, key: NodeKey) -> bool {
    let Ok(node) = tree.node(key) else {
        return false;
    };
    node.value().is_empty()
        && node.children().map_or(true, |children| {
            children
                .iter()
                .all(|&child| tree.node(child).is_ok_and(|child| child.value().is_empty()))
        })
}
