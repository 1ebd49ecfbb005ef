//! Generic partition tree engine shared by the octree and the quadtree

use slotmap::{new_key_type, SlotMap};

use crate::config::PartitionConfig;
use crate::error::{Result, SpatialError};
use crate::geometry::AABB;

new_key_type! {
    /// Handle to a node of a [`PartitionTree`]
    pub struct NodeKey;
}

/// Split rule: the bounds of the `K` children of a node
pub type Subdivide<const K: usize> = fn(&AABB) -> [AABB; K];

/// What a traversal visitor wants next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the children of this node
    Continue,
    /// Do not descend below this node
    Skip,
    /// Abort the whole walk
    Stop,
}

/// Single node in the partition hierarchy
#[derive(Debug, Clone)]
pub struct PartitionNode<T, const K: usize> {
    bounds: AABB,
    value: T,
    children: Option<[NodeKey; K]>,
    depth: u32,
    parent: Option<NodeKey>,
}

impl<T, const K: usize> PartitionNode<T, K> {
    /// Region covered by this node
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Payload stored at this node
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable payload
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Children, once expanded
    pub fn children(&self) -> Option<&[NodeKey; K]> {
        self.children.as_ref()
    }

    /// Whether the node has been expanded
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// Depth below the root (root is 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }
}

/// Hierarchical space partition with lazily allocated children
///
/// Every node carries a `T` (the empty value is `T::default()`). Children are
/// created by [`expand`](Self::expand) using the tree's subdivision rule and
/// dropped again by [`collapse`](Self::collapse).
#[derive(Debug, Clone)]
pub struct PartitionTree<T, const K: usize> {
    nodes: SlotMap<NodeKey, PartitionNode<T, K>>,
    root: NodeKey,
    max_depth: u32,
    subdivide: Subdivide<K>,
}

impl<T: Default, const K: usize> PartitionTree<T, K> {
    /// Tree with a single root node covering `bounds`
    pub fn with_subdivision(bounds: AABB, max_depth: u32, subdivide: Subdivide<K>) -> Result<Self> {
        PartitionConfig { max_depth }.validate()?;

        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PartitionNode {
            bounds,
            value: T::default(),
            children: None,
            depth: 0,
            parent: None,
        });

        Ok(Self {
            nodes,
            root,
            max_depth,
            subdivide,
        })
    }

    /// Root node key
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Region covered by the root
    pub fn bounds(&self) -> &AABB {
        &self.nodes[self.root].bounds
    }

    /// Deepest level nodes can be expanded to
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of live nodes, the root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node
    pub fn node(&self, key: NodeKey) -> Result<&PartitionNode<T, K>> {
        self.nodes.get(key).ok_or(SpatialError::UnknownNode)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, key: NodeKey) -> Result<&mut PartitionNode<T, K>> {
        self.nodes.get_mut(key).ok_or(SpatialError::UnknownNode)
    }

    /// Parent of a node
    pub fn parent(&self, key: NodeKey) -> Result<Option<NodeKey>> {
        Ok(self.node(key)?.parent)
    }

    /// Children of a node, if expanded
    pub fn children(&self, key: NodeKey) -> Result<Option<[NodeKey; K]>> {
        Ok(self.node(key)?.children)
    }

    /// Depth of a node
    pub fn depth(&self, key: NodeKey) -> Result<u32> {
        Ok(self.node(key)?.depth)
    }

    /// Bounds the children of `bounds` would get
    pub fn subdivide(&self, bounds: &AABB) -> [AABB; K] {
        (self.subdivide)(bounds)
    }

    /// Create the children of a node
    ///
    /// Does nothing when the node is already expanded or sits at the maximum
    /// depth. Returns whether the node has children afterwards.
    pub fn expand(&mut self, key: NodeKey) -> Result<bool> {
        let node = self.node(key)?;
        if node.children.is_some() {
            return Ok(true);
        }
        if node.depth >= self.max_depth {
            return Ok(false);
        }

        let depth = node.depth + 1;
        let regions = (self.subdivide)(&node.bounds);
        let nodes = &mut self.nodes;
        let children = regions.map(|bounds| {
            nodes.insert(PartitionNode {
                bounds,
                value: T::default(),
                children: None,
                depth,
                parent: Some(key),
            })
        });

        self.nodes[key].children = Some(children);
        log::trace!("Expanded partition node {key:?} to depth {depth}");
        Ok(true)
    }

    /// Drop subtrees bottom-up
    ///
    /// Children are collapsed first. A node then loses its children (and
    /// its value is reset) when none of them has children left and
    /// `predicate` accepts it. Returns how many nodes were collapsed.
    pub fn collapse<F>(&mut self, key: NodeKey, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&Self, NodeKey) -> bool,
    {
        self.node(key)?;
        Ok(self.collapse_node(key, &mut predicate))
    }

    fn collapse_node<F>(&mut self, key: NodeKey, predicate: &mut F) -> usize
    where
        F: FnMut(&Self, NodeKey) -> bool,
    {
        let Some(children) = self.nodes[key].children else {
            return 0;
        };

        let mut collapsed: usize = children.iter().map(|&child| self.collapse_node(child, predicate)).sum();

        let childless = children.iter().all(|&child| self.nodes[child].children.is_none());
        if childless && predicate(self, key) {
            for child in children {
                self.nodes.remove(child);
            }
            let node = &mut self.nodes[key];
            node.children = None;
            node.value = T::default();
            collapsed += 1;
        }

        collapsed
    }

    /// Depth-first walk from `start`
    ///
    /// Returns `false` when the visitor stopped the walk.
    pub fn traverse<F>(&self, start: NodeKey, visitor: F) -> Result<bool>
    where
        F: FnMut(NodeKey, &PartitionNode<T, K>) -> Visit,
    {
        let mut stack = Vec::new();
        self.traverse_with_stack(start, &mut stack, visitor)
    }

    /// Depth-first walk reusing a caller-owned stack
    ///
    /// The stack is cleared before use, so one buffer can serve many walks
    /// without reallocating.
    pub fn traverse_with_stack<F>(&self, start: NodeKey, stack: &mut Vec<NodeKey>, visitor: F) -> Result<bool>
    where
        F: FnMut(NodeKey, &PartitionNode<T, K>) -> Visit,
    {
        self.node(start)?;
        Ok(self.walk_from(start, stack, visitor))
    }

    /// Depth-first walk over the whole tree, parents before children
    ///
    /// Returns `false` when the visitor stopped the walk.
    pub fn walk<F>(&self, visitor: F) -> bool
    where
        F: FnMut(NodeKey, &PartitionNode<T, K>) -> Visit,
    {
        let mut stack = Vec::new();
        self.walk_from(self.root, &mut stack, visitor)
    }

    fn walk_from<F>(&self, start: NodeKey, stack: &mut Vec<NodeKey>, mut visitor: F) -> bool
    where
        F: FnMut(NodeKey, &PartitionNode<T, K>) -> Visit,
    {
        stack.clear();
        stack.push(start);

        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            match visitor(key, node) {
                Visit::Stop => return false,
                Visit::Skip => {}
                Visit::Continue => {
                    if let Some(children) = &node.children {
                        stack.extend(children.iter().rev());
                    }
                }
            }
        }

        true
    }

    /// Expand every node under `start` accepted by `predicate`
    ///
    /// A rejected node is not expanded and its subtree is not visited.
    /// Returns the number of nodes that gained children.
    pub fn expand_all<F>(&mut self, start: NodeKey, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&PartitionNode<T, K>) -> bool,
    {
        self.node(start)?;
        let mut expanded = 0;
        let mut stack = vec![start];

        while let Some(key) = stack.pop() {
            if !predicate(&self.nodes[key]) {
                continue;
            }

            let had_children = self.nodes[key].children.is_some();
            if self.expand(key)? && !had_children {
                expanded += 1;
            }
            if let Some(children) = self.nodes[key].children {
                stack.extend(children);
            }
        }

        Ok(expanded)
    }

    /// Drop every node except the root and reset the root value
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|key, _| key == root);

        let node = &mut self.nodes[root];
        node.children = None;
        node.value = T::default();
    }

    /// Iterate over every live node in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &PartitionNode<T, K>)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::partition::{octants, Octree, Quadtree};

    fn cube() -> AABB {
        AABB::new(Vec3::zeros(), Vec3::repeat(8.0))
    }

    #[test]
    fn test_expand_respects_max_depth() {
        let mut tree: Octree<u32> = Octree::new(cube(), 2).unwrap();
        let root = tree.root();

        assert!(tree.expand(root).unwrap());
        assert_eq!(tree.node_count(), 9);

        let child = tree.children(root).unwrap().unwrap()[0];
        assert!(tree.expand(child).unwrap());
        let grandchild = tree.children(child).unwrap().unwrap()[7];
        assert_eq!(tree.depth(grandchild).unwrap(), 2);

        assert!(!tree.expand(grandchild).unwrap());
        assert_eq!(tree.children(grandchild).unwrap(), None);
        assert_eq!(tree.node_count(), 17);

        // Expanding twice is a no-op
        assert!(tree.expand(root).unwrap());
        assert_eq!(tree.node_count(), 17);
    }

    #[test]
    fn test_expand_all_and_depth_bound() {
        let mut tree: Octree<()> = Octree::new(cube(), 3).unwrap();
        let root = tree.root();

        let expanded = tree.expand_all(root, |_| true).unwrap();
        assert_eq!(expanded, 1 + 8 + 64);
        assert_eq!(tree.node_count(), 1 + 8 + 64 + 512);
        assert!(tree.iter().all(|(_, node)| node.depth() <= 3));
    }

    #[test]
    fn test_expand_all_region() {
        let mut tree: Octree<()> = Octree::new(cube(), 3).unwrap();
        let root = tree.root();
        let corner = AABB::new(Vec3::zeros(), Vec3::repeat(0.5));

        // Only the nodes touching the corner region get refined
        let expanded = tree
            .expand_all(root, |node| node.bounds().intersects_box(&corner))
            .unwrap();
        assert_eq!(expanded, 3);
    }

    #[test]
    fn test_collapse_counts_and_resets() {
        let mut tree: Octree<u32> = Octree::new(cube(), 3).unwrap();
        let root = tree.root();
        tree.expand_all(root, |node| node.depth() < 2).unwrap();
        assert_eq!(tree.node_count(), 73);

        let child = tree.children(root).unwrap().unwrap()[0];
        *tree.node_mut(child).unwrap().value_mut() = 5;

        // Keep nodes carrying a value; the root keeps its children because one
        // of them is still expanded
        let collapsed = tree.collapse(root, |tree, key| *tree.node(key).unwrap().value() == 0).unwrap();
        assert_eq!(collapsed, 7);
        assert_eq!(tree.node_count(), 17);
        assert!(tree.node(root).unwrap().has_children());
        assert!(tree.node(child).unwrap().has_children());

        let collapsed = tree.collapse(root, |_, _| true).unwrap();
        assert_eq!(collapsed, 2);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.node(child).is_err());
    }

    #[test]
    fn test_traverse_skip_and_stop() {
        let mut tree: Quadtree<()> = Quadtree::new(AABB::new(Vec3::zeros(), Vec3::repeat(4.0)), 2).unwrap();
        let root = tree.root();
        tree.expand_all(root, |_| true).unwrap();
        assert_eq!(tree.node_count(), 1 + 4 + 16);

        let mut visited = 0;
        assert!(tree.traverse(root, |_, _| { visited += 1; Visit::Continue }).unwrap());
        assert_eq!(visited, 21);

        let mut visited = 0;
        let completed = tree
            .traverse(root, |_, node| {
                visited += 1;
                if node.depth() == 1 { Visit::Skip } else { Visit::Continue }
            })
            .unwrap();
        assert!(completed);
        assert_eq!(visited, 5);

        let mut stack = Vec::new();
        let mut visited = 0;
        let completed = tree
            .traverse_with_stack(root, &mut stack, |_, _| {
                visited += 1;
                if visited == 3 { Visit::Stop } else { Visit::Continue }
            })
            .unwrap();
        assert!(!completed);
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_clear_and_stale_keys() {
        let mut tree: Octree<u32> = Octree::new(cube(), 2).unwrap();
        let root = tree.root();
        tree.expand(root).unwrap();
        let child = tree.children(root).unwrap().unwrap()[3];
        *tree.node_mut(root).unwrap().value_mut() = 7;

        tree.clear();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(*tree.node(root).unwrap().value(), 0);
        assert!(matches!(tree.expand(child), Err(SpatialError::UnknownNode)));
        assert!(matches!(tree.traverse(child, |_, _| Visit::Continue), Err(SpatialError::UnknownNode)));
    }

    #[test]
    fn test_custom_subdivision() {
        assert!(PartitionTree::<(), 8>::with_subdivision(cube(), 0, octants).is_err());

        let tree = PartitionTree::<(), 8>::with_subdivision(cube(), 4, octants).unwrap();
        assert_eq!(tree.max_depth(), 4);
        assert_eq!(*tree.bounds(), cube());
    }
}
