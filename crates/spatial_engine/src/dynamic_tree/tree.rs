//! Arena-backed dynamic tree with AVL-style rotations

use std::fmt;

use super::TreeBounds;
use crate::config::DynamicTreeConfig;
use crate::error::{Result, SpatialError};

/// Handle to a leaf of a [`DynamicTree`]
///
/// Ids are arena indices. Once a proxy is removed its slot may be handed to
/// a later insert, so holding on to a removed id is a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(usize);

impl ProxyId {
    /// Arena index of the leaf
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy#{}", self.0)
    }
}

/// What a raycast callback wants the walk to do next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayControl {
    /// Keep the current segment length
    Continue,
    /// Shorten the segment to this fraction of `p1..p2`; zero ends the walk
    Clip(f32),
    /// Abort immediately
    Stop,
}

#[derive(Debug, Clone)]
enum NodeKind<B, T> {
    Leaf { value: T, tight: B },
    Internal { child1: usize, child2: usize },
}

#[derive(Debug, Clone)]
struct Node<B, T> {
    /// Fattened bounds for leaves, merged children for internal nodes
    bounds: B,
    parent: Option<usize>,
    /// 0 for leaves
    height: i32,
    kind: NodeKind<B, T>,
}

impl<B, T> Node<B, T> {
    fn children(&self) -> Option<(usize, usize)> {
        match self.kind {
            NodeKind::Internal { child1, child2 } => Some((child1, child2)),
            NodeKind::Leaf { .. } => None,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

#[derive(Debug, Clone)]
enum Slot<B, T> {
    Used(Node<B, T>),
    Free { next: Option<usize> },
}

/// Incremental bounding-volume hierarchy over moving bounds
///
/// Leaves store the caller's value together with bounds fattened by the
/// configured margin, so small moves leave the structure alone. Internal
/// nodes always have two children and keep the merged bounds of both.
#[derive(Debug, Clone)]
pub struct DynamicTree<B: TreeBounds, T> {
    slots: Vec<Slot<B, T>>,
    free_list: Option<usize>,
    root: Option<usize>,
    node_count: usize,
    config: DynamicTreeConfig,
}

impl<B: TreeBounds, T> Default for DynamicTree<B, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: TreeBounds, T> DynamicTree<B, T> {
    /// Empty tree with the default configuration
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: None,
            root: None,
            node_count: 0,
            config: DynamicTreeConfig::default(),
        }
    }

    /// Empty tree with a validated configuration
    pub fn with_config(config: DynamicTreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Active configuration
    pub fn config(&self) -> &DynamicTreeConfig {
        &self.config
    }

    /// Live nodes, leaves and internal nodes together
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Allocated arena slots
    pub fn node_capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored proxies
    pub fn len(&self) -> usize {
        // A full binary tree with n leaves has 2n - 1 nodes
        self.node_count.div_ceil(2)
    }

    /// True when no proxy is stored
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert `value` with tight `bounds`; the leaf stores them fattened
    pub fn insert(&mut self, bounds: B, value: T) -> ProxyId {
        let leaf = self.allocate(Node {
            bounds: bounds.fattened(self.config.margin),
            parent: None,
            height: 0,
            kind: NodeKind::Leaf { value, tight: bounds },
        });
        self.insert_leaf(leaf);
        ProxyId(leaf)
    }

    /// Remove a proxy and hand back its value
    pub fn remove(&mut self, id: ProxyId) -> Result<T> {
        self.check_leaf(id)?;
        self.remove_leaf(id.0);

        match self.release(id.0) {
            Some(NodeKind::Leaf { value, .. }) => Ok(value),
            _ => Err(SpatialError::InvalidProxy(id)),
        }
    }

    /// Update a proxy's bounds
    ///
    /// Returns `false` when the stored fat bounds still contain `bounds`;
    /// the structure is untouched then. Otherwise the leaf is reinserted with
    /// bounds fattened by the margin and stretched along the displacement
    /// since the last update, scaled by the displacement multiplier.
    pub fn move_proxy(&mut self, id: ProxyId, bounds: B) -> Result<bool> {
        self.check_leaf(id)?;

        let (fat, previous) = {
            let node = self.node_mut(id.0);
            let NodeKind::Leaf { tight, .. } = &mut node.kind else {
                return Err(SpatialError::InvalidProxy(id));
            };
            let previous = std::mem::replace(tight, bounds);
            (node.bounds, previous)
        };

        if fat.contains(&bounds) {
            return Ok(false);
        }

        let displacement = (bounds.center() - previous.center()) * self.config.displacement_multiplier;
        self.remove_leaf(id.0);
        self.node_mut(id.0).bounds = bounds.fattened(self.config.margin).swept(displacement);
        self.insert_leaf(id.0);
        Ok(true)
    }

    /// Value stored under a proxy
    pub fn get(&self, id: ProxyId) -> Option<&T> {
        match self.used(id.0)?.kind {
            NodeKind::Leaf { ref value, .. } => Some(value),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Mutable value stored under a proxy
    pub fn get_mut(&mut self, id: ProxyId) -> Option<&mut T> {
        match self.slots.get_mut(id.0)? {
            Slot::Used(Node {
                kind: NodeKind::Leaf { value, .. },
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Fattened bounds stored for a proxy
    pub fn fat_bounds(&self, id: ProxyId) -> Option<B> {
        self.used(id.0).filter(|node| node.is_leaf()).map(|node| node.bounds)
    }

    /// Visit every proxy whose fat bounds overlap `bounds`
    ///
    /// The callback returns `false` to end the walk. Returns whether the
    /// walk ran to completion.
    pub fn query<'a, F>(&'a self, bounds: &B, mut callback: F) -> bool
    where
        F: FnMut(ProxyId, &'a T) -> bool,
    {
        let mut stack: Vec<usize> = self.root.into_iter().collect();

        while let Some(index) = stack.pop() {
            let node = self.node(index);
            if !node.bounds.overlaps(bounds) {
                continue;
            }

            match &node.kind {
                NodeKind::Leaf { value, .. } => {
                    if !callback(ProxyId(index), value) {
                        return false;
                    }
                }
                NodeKind::Internal { child1, child2 } => {
                    stack.push(*child1);
                    stack.push(*child2);
                }
            }
        }

        true
    }

    /// Values of every proxy whose fat bounds overlap `bounds`
    pub fn find_all(&self, bounds: &B) -> Vec<&T> {
        let mut found = Vec::new();
        self.query(bounds, |_, value| {
            found.push(value);
            true
        });
        found
    }

    /// Cast the segment `p1..p2` through the tree
    ///
    /// Subtrees are pruned by the bounds of the remaining segment and by a
    /// separating-axis test perpendicular to it. The callback receives each
    /// candidate leaf with the current maximum fraction and decides how the
    /// walk continues. Returns whether the walk ran to completion.
    pub fn raycast<'a, F>(&'a self, p1: B::Vector, p2: B::Vector, mut callback: F) -> bool
    where
        F: FnMut(ProxyId, &'a T, f32) -> RayControl,
    {
        let mut max_fraction = 1.0_f32;
        let mut segment = B::segment_bounds(p1, p1 + (p2 - p1) * max_fraction);
        let mut stack: Vec<usize> = self.root.into_iter().collect();

        while let Some(index) = stack.pop() {
            let node = self.node(index);
            if !node.bounds.overlaps(&segment) || node.bounds.segment_separated(p1, p2) {
                continue;
            }

            match &node.kind {
                NodeKind::Leaf { value, .. } => match callback(ProxyId(index), value, max_fraction) {
                    RayControl::Continue => {}
                    RayControl::Stop => return false,
                    RayControl::Clip(fraction) => {
                        if fraction <= 0.0 {
                            return false;
                        }
                        max_fraction = fraction;
                        segment = B::segment_bounds(p1, p1 + (p2 - p1) * max_fraction);
                    }
                },
                NodeKind::Internal { child1, child2 } => {
                    stack.push(*child1);
                    stack.push(*child2);
                }
            }
        }

        true
    }

    /// Every proxy whose fat bounds the segment `p1..p2` passes through
    pub fn raycast_all(&self, p1: B::Vector, p2: B::Vector) -> Vec<ProxyId> {
        let mut hits = Vec::new();
        self.raycast(p1, p2, |id, _, _| {
            hits.push(id);
            RayControl::Continue
        });
        hits
    }

    /// Height of the root, 0 for an empty tree
    pub fn height(&self) -> i32 {
        self.root.map_or(0, |root| self.node(root).height)
    }

    /// Largest height difference between two siblings
    pub fn max_balance(&self) -> i32 {
        self.live_nodes()
            .filter_map(|node| node.children())
            .map(|(child1, child2)| (self.node(child1).height - self.node(child2).height).abs())
            .max()
            .unwrap_or(0)
    }

    /// Sum of all node perimeters over the root perimeter
    pub fn area_ratio(&self) -> f32 {
        let Some(root) = self.root else {
            return 0.0;
        };
        let root_perimeter = self.node(root).bounds.perimeter();
        if root_perimeter <= 0.0 {
            return 0.0;
        }

        let total: f32 = self.live_nodes().map(|node| node.bounds.perimeter()).sum();
        total / root_perimeter
    }

    /// Move the coordinate origin to `new_origin`
    pub fn shift_origin(&mut self, new_origin: B::Vector) {
        let offset = -new_origin;
        for slot in &mut self.slots {
            if let Slot::Used(node) = slot {
                node.bounds = node.bounds.translated(offset);
                if let NodeKind::Leaf { tight, .. } = &mut node.kind {
                    *tight = tight.translated(offset);
                }
            }
        }
    }

    /// Rebuild the hierarchy from the current leaves by greedy pairing
    ///
    /// Quadratic in the leaf count per level; meant for occasional use after
    /// a bulk load, not per frame.
    pub fn rebuild_bottom_up(&mut self) {
        let mut leaves = Vec::with_capacity(self.len());
        for index in 0..self.slots.len() {
            match self.used(index).map(Node::is_leaf) {
                Some(true) => {
                    self.node_mut(index).parent = None;
                    leaves.push(index);
                }
                Some(false) => {
                    self.release(index);
                }
                None => {}
            }
        }

        let leaf_count = leaves.len();
        while leaves.len() > 1 {
            let mut best = (f32::INFINITY, 0, 1);
            for i in 0..leaves.len() {
                let bounds_i = self.node(leaves[i]).bounds;
                for j in (i + 1)..leaves.len() {
                    let cost = bounds_i.merged(&self.node(leaves[j]).bounds).perimeter();
                    if cost < best.0 {
                        best = (cost, i, j);
                    }
                }
            }

            let (_, i, j) = best;
            let (child1, child2) = (leaves[i], leaves[j]);
            let parent = self.allocate(Node {
                bounds: self.node(child1).bounds.merged(&self.node(child2).bounds),
                parent: None,
                height: 1 + self.node(child1).height.max(self.node(child2).height),
                kind: NodeKind::Internal { child1, child2 },
            });
            self.node_mut(child1).parent = Some(parent);
            self.node_mut(child2).parent = Some(parent);

            leaves[i] = parent;
            leaves.swap_remove(j);
        }

        self.root = leaves.first().copied();
        log::debug!("Rebuilt dynamic tree over {leaf_count} leaves, height {}", self.height());
    }

    /// Drop every proxy, keeping the allocated capacity
    pub fn clear(&mut self) {
        let capacity = self.slots.len();
        self.slots.clear();
        self.slots.extend((0..capacity).map(|index| Slot::Free {
            next: (index + 1 < capacity).then_some(index + 1),
        }));
        self.free_list = (capacity > 0).then_some(0);
        self.root = None;
        self.node_count = 0;
    }

    /// Check every structural invariant
    ///
    /// Verifies parent/child linkage, the height recurrence, merged bounds
    /// of internal nodes, fat bounds enclosing the tight ones, and that the
    /// free list plus the live nodes account for the whole arena.
    pub fn validate(&self) -> Result<()> {
        let mut reached = 0;
        if let Some(root) = self.root {
            if self.used(root).and_then(|node| node.parent).is_some() {
                return Err(violation(format!("root {root} has a parent")));
            }

            let mut stack = vec![root];
            while let Some(index) = stack.pop() {
                let node = self
                    .used(index)
                    .ok_or_else(|| violation(format!("node {index} is reachable but free")))?;
                reached += 1;

                match &node.kind {
                    NodeKind::Leaf { tight, .. } => {
                        if node.height != 0 {
                            return Err(violation(format!("leaf {index} has height {}", node.height)));
                        }
                        if !node.bounds.contains(tight) {
                            return Err(violation(format!("leaf {index} fat bounds miss its tight bounds")));
                        }
                    }
                    NodeKind::Internal { child1, child2 } => {
                        let (child1, child2) = (*child1, *child2);
                        for child in [child1, child2] {
                            let parent = self.used(child).and_then(|child| child.parent);
                            if parent != Some(index) {
                                return Err(violation(format!(
                                    "node {child} lists parent {parent:?}, expected {index}"
                                )));
                            }
                        }

                        let (first, second) = (self.node(child1), self.node(child2));
                        let height = 1 + first.height.max(second.height);
                        if node.height != height {
                            return Err(violation(format!(
                                "node {index} has height {}, expected {height}",
                                node.height
                            )));
                        }
                        if node.bounds != first.bounds.merged(&second.bounds) {
                            return Err(violation(format!("node {index} bounds differ from its children")));
                        }

                        stack.push(child1);
                        stack.push(child2);
                    }
                }
            }
        }

        if reached != self.node_count {
            return Err(violation(format!(
                "{reached} nodes reachable from the root, {} counted",
                self.node_count
            )));
        }

        let mut free = 0;
        let mut cursor = self.free_list;
        while let Some(index) = cursor {
            match self.slots.get(index) {
                Some(Slot::Free { next }) => cursor = *next,
                _ => return Err(violation(format!("free list reaches live slot {index}"))),
            }
            free += 1;
            if free > self.slots.len() {
                return Err(violation("free list contains a cycle".to_string()));
            }
        }

        if free + self.node_count != self.slots.len() {
            return Err(violation(format!(
                "{free} free and {} live slots in an arena of {}",
                self.node_count,
                self.slots.len()
            )));
        }

        Ok(())
    }

    fn used(&self, index: usize) -> Option<&Node<B, T>> {
        match self.slots.get(index)? {
            Slot::Used(node) => Some(node),
            Slot::Free { .. } => None,
        }
    }

    fn node(&self, index: usize) -> &Node<B, T> {
        match &self.slots[index] {
            Slot::Used(node) => node,
            Slot::Free { .. } => unreachable!("slot {index} is linked from the tree but free"),
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<B, T> {
        match &mut self.slots[index] {
            Slot::Used(node) => node,
            Slot::Free { .. } => unreachable!("slot {index} is linked from the tree but free"),
        }
    }

    fn live_nodes(&self) -> impl Iterator<Item = &Node<B, T>> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Used(node) => Some(node),
            Slot::Free { .. } => None,
        })
    }

    fn check_leaf(&self, id: ProxyId) -> Result<()> {
        match self.used(id.0) {
            Some(node) if node.is_leaf() => Ok(()),
            _ => {
                log::warn!("Rejected operation on {id}: not a live proxy");
                Err(SpatialError::InvalidProxy(id))
            }
        }
    }

    fn allocate(&mut self, node: Node<B, T>) -> usize {
        if self.free_list.is_none() {
            self.grow();
        }

        let index = self.free_list.unwrap_or(self.slots.len());
        if let Some(Slot::Free { next }) = self.slots.get(index) {
            self.free_list = *next;
            self.slots[index] = Slot::Used(node);
        } else {
            self.free_list = None;
            self.slots.push(Slot::Used(node));
        }
        self.node_count += 1;
        index
    }

    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = (old_capacity * 2).max(self.config.initial_capacity);

        self.slots.extend((old_capacity..new_capacity).map(|index| Slot::Free {
            next: (index + 1 < new_capacity).then_some(index + 1),
        }));
        self.free_list = Some(old_capacity);

        log::debug!("Dynamic tree arena grown from {old_capacity} to {new_capacity} slots");
    }

    /// Return a slot to the free list, yielding what it held
    fn release(&mut self, index: usize) -> Option<NodeKind<B, T>> {
        if !matches!(self.slots.get(index), Some(Slot::Used(_))) {
            return None;
        }

        let slot = std::mem::replace(&mut self.slots[index], Slot::Free { next: self.free_list });
        self.free_list = Some(index);
        self.node_count -= 1;
        match slot {
            Slot::Used(node) => Some(node.kind),
            Slot::Free { .. } => None,
        }
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if let NodeKind::Internal { child1, child2 } = &mut self.node_mut(parent).kind {
            if *child1 == old {
                *child1 = new;
            } else {
                *child2 = new;
            }
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        let Some(root) = self.root else {
            self.root = Some(leaf);
            self.node_mut(leaf).parent = None;
            return;
        };

        // Find the cheapest sibling by descending on perimeter cost
        let leaf_bounds = self.node(leaf).bounds;
        let mut index = root;
        while let Some((child1, child2)) = self.node(index).children() {
            let bounds = self.node(index).bounds;
            let combined_perimeter = bounds.merged(&leaf_bounds).perimeter();

            // Cost of a new parent for this node and the leaf
            let cost = 2.0 * combined_perimeter;
            // Minimum cost of pushing the leaf further down
            let inheritance_cost = 2.0 * (combined_perimeter - bounds.perimeter());

            let descend_cost = |child: usize| {
                let child = self.node(child);
                let merged = leaf_bounds.merged(&child.bounds).perimeter();
                if child.is_leaf() {
                    merged + inheritance_cost
                } else {
                    merged - child.bounds.perimeter() + inheritance_cost
                }
            };
            let cost1 = descend_cost(child1);
            let cost2 = descend_cost(child2);

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.node(sibling).parent;
        let new_parent = self.allocate(Node {
            bounds: leaf_bounds.merged(&self.node(sibling).bounds),
            parent: old_parent,
            height: self.node(sibling).height + 1,
            kind: NodeKind::Internal { child1: sibling, child2: leaf },
        });

        match old_parent {
            Some(old_parent) => self.replace_child(old_parent, sibling, new_parent),
            None => self.root = Some(new_parent),
        }
        self.node_mut(sibling).parent = Some(new_parent);
        self.node_mut(leaf).parent = Some(new_parent);

        self.refit_upwards(Some(new_parent));
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }

        let Some(parent) = self.node(leaf).parent else {
            return;
        };
        let grand_parent = self.node(parent).parent;
        let sibling = match self.node(parent).children() {
            Some((child1, child2)) if child1 == leaf => child2,
            Some((child1, _)) => child1,
            None => return,
        };

        self.release(parent);
        self.node_mut(leaf).parent = None;

        match grand_parent {
            Some(grand_parent) => {
                self.replace_child(grand_parent, parent, sibling);
                self.node_mut(sibling).parent = Some(grand_parent);
                self.refit_upwards(Some(grand_parent));
            }
            None => {
                self.root = Some(sibling);
                self.node_mut(sibling).parent = None;
            }
        }
    }

    /// Rebalance and refresh bounds and heights from `start` to the root
    fn refit_upwards(&mut self, start: Option<usize>) {
        let mut cursor = start;
        while let Some(index) = cursor {
            let index = self.balance(index);

            if let Some((child1, child2)) = self.node(index).children() {
                let (first, second) = (self.node(child1), self.node(child2));
                let height = 1 + first.height.max(second.height);
                let bounds = first.bounds.merged(&second.bounds);

                let node = self.node_mut(index);
                node.height = height;
                node.bounds = bounds;
            }

            cursor = self.node(index).parent;
        }
    }

    /// Rotate the taller child of `a` above it when the heights differ by
    /// more than one. Returns the root of the subtree.
    fn balance(&mut self, a: usize) -> usize {
        let node = self.node(a);
        if node.height < 2 {
            return a;
        }
        let Some((b, c)) = node.children() else {
            return a;
        };

        let balance = self.node(c).height - self.node(b).height;
        if balance > 1 {
            self.rotate_up(a, c, b)
        } else if balance < -1 {
            self.rotate_up(a, b, c)
        } else {
            a
        }
    }

    /// Promote `up` (a child of `a`) above `a`. The taller grandchild stays
    /// under `up`; the shorter one takes `up`'s former place under `a`.
    fn rotate_up(&mut self, a: usize, up: usize, stay: usize) -> usize {
        let Some((f, g)) = self.node(up).children() else {
            return a;
        };
        let (taller, shorter) = if self.node(f).height > self.node(g).height {
            (f, g)
        } else {
            (g, f)
        };

        let a_parent = self.node(a).parent;
        {
            let up_node = self.node_mut(up);
            up_node.kind = NodeKind::Internal { child1: a, child2: taller };
            up_node.parent = a_parent;
        }
        self.node_mut(a).parent = Some(up);

        match a_parent {
            Some(parent) => self.replace_child(parent, a, up),
            None => self.root = Some(up),
        }

        self.replace_child(a, up, shorter);
        self.node_mut(shorter).parent = Some(a);

        let a_bounds = self.node(stay).bounds.merged(&self.node(shorter).bounds);
        let a_height = 1 + self.node(stay).height.max(self.node(shorter).height);
        {
            let a_node = self.node_mut(a);
            a_node.bounds = a_bounds;
            a_node.height = a_height;
        }

        let up_bounds = a_bounds.merged(&self.node(taller).bounds);
        let up_height = 1 + a_height.max(self.node(taller).height);
        let up_node = self.node_mut(up);
        up_node.bounds = up_bounds;
        up_node.height = up_height;

        up
    }
}

fn violation(message: String) -> SpatialError {
    SpatialError::InvariantViolation(message)
}
