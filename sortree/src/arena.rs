use std::cmp::Ordering;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::errors::{TreeError, TreeResult};
use crate::event::{TreeEvent, TreePath};
use crate::ordering::ChildOrdering;

pub type NodeId = Index;

/// Tree node in the arena; children are kept sorted by `ordering`.
#[derive(Debug)]
pub struct TreeNode<T> {
    data: T,
    /// Lookup back-reference to the parent, None for roots and detached nodes
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    allows_children: bool,
    ordering: ChildOrdering<T>,
}

impl<T> TreeNode<T> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn allows_children(&self) -> bool {
        self.allows_children
    }

    pub fn ordering(&self) -> &ChildOrdering<T> {
        &self.ordering
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based tree whose nodes keep their children in sorted order.
///
/// Nodes are created detached and linked with [`SortedTree::add`], which
/// places the child at its sort-correct position. When a payload changes
/// out-of-band the owner of the tree delivers a [`TreeEvent`] (or calls
/// [`SortedTree::update`]) and the affected children are moved back into order.
#[derive(Debug)]
pub struct SortedTree<T> {
    arena: Arena<TreeNode<T>>,
    root: Option<NodeId>,
}

impl<T> Default for SortedTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SortedTree<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Creates a detached node that allows children and sorts them naturally.
    pub fn create_node(&mut self, data: T) -> NodeId {
        self.create_node_with(data, true, ChildOrdering::Natural)
    }

    /// Creates a detached node that never has children.
    pub fn create_leaf(&mut self, data: T) -> NodeId {
        self.create_node_with(data, false, ChildOrdering::Natural)
    }

    #[instrument(level = "trace", skip(self, data))]
    pub fn create_node_with(
        &mut self,
        data: T,
        allows_children: bool,
        ordering: ChildOrdering<T>,
    ) -> NodeId {
        self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
            allows_children,
            ordering,
        })
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, idx: NodeId) -> bool {
        self.arena.contains(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode<T>> {
        self.arena.get(idx)
    }

    pub fn data(&self, idx: NodeId) -> Option<&T> {
        self.arena.get(idx).map(|n| &n.data)
    }

    /// Mutable payload access. Changing the sort key through this reference
    /// requires a notification ([`SortedTree::notify_changed`]) afterwards.
    pub fn data_mut(&mut self, idx: NodeId) -> Option<&mut T> {
        self.arena.get_mut(idx).map(|n| &mut n.data)
    }

    pub fn parent(&self, idx: NodeId) -> Option<NodeId> {
        self.arena.get(idx).and_then(|n| n.parent)
    }

    pub fn children(&self, idx: NodeId) -> &[NodeId] {
        self.arena.get(idx).map_or(&[], |n| n.children.as_slice())
    }

    pub fn child_count(&self, idx: NodeId) -> usize {
        self.children(idx).len()
    }

    pub fn child_at(&self, idx: NodeId, position: usize) -> Option<NodeId> {
        self.children(idx).get(position).copied()
    }

    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    pub fn is_leaf(&self, idx: NodeId) -> bool {
        self.children(idx).is_empty()
    }

    pub fn allows_children(&self, idx: NodeId) -> bool {
        self.arena.get(idx).is_some_and(|n| n.allows_children)
    }

    pub fn ordering(&self, idx: NodeId) -> Option<&ChildOrdering<T>> {
        self.arena.get(idx).map(|n| &n.ordering)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_root(&mut self, idx: NodeId) -> TreeResult<()> {
        let node = self.arena.get(idx).ok_or_else(|| TreeError::missing_node(idx))?;
        if node.parent.is_some() {
            return Err(TreeError::InvalidArgument(format!(
                "node {:?} has a parent and cannot be the root",
                idx
            )));
        }
        self.root = Some(idx);
        Ok(())
    }

    /// True if `ancestor` is `idx` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, idx: NodeId) -> bool {
        let mut current = Some(idx);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    #[instrument(level = "trace", skip(self))]
    pub fn path_to_root(&self, idx: NodeId) -> TreeResult<TreePath> {
        if !self.contains(idx) {
            return Err(TreeError::missing_node(idx));
        }
        let mut nodes = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current {
            nodes.push(node);
            current = self.parent(node);
        }
        nodes.reverse();
        Ok(TreePath::new(nodes))
    }

    /// Detaches `child` from `parent`, returning its former position.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        let position = self.index_of(parent, child).ok_or_else(|| {
            TreeError::InvalidArgument(format!("{:?} is not a child of {:?}", child, parent))
        })?;
        self.detach(child);
        Ok(position)
    }

    pub fn remove_from_parent(&mut self, child: NodeId) -> TreeResult<()> {
        if !self.contains(child) {
            return Err(TreeError::missing_node(child));
        }
        self.detach(child);
        Ok(())
    }

    /// Detaches `idx` and deletes it together with all of its descendants.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, idx: NodeId) -> TreeResult<T> {
        if !self.contains(idx) {
            return Err(TreeError::missing_node(idx));
        }
        self.detach(idx);
        let mut stack = self.children(idx).to_vec();
        while let Some(node) = stack.pop() {
            if let Some(removed) = self.arena.remove(node) {
                stack.extend(removed.children);
            }
        }
        if self.root == Some(idx) {
            self.root = None;
        }
        let removed = self
            .arena
            .remove(idx)
            .ok_or_else(|| TreeError::missing_node(idx))?;
        debug!("removed subtree at {:?}", idx);
        Ok(removed.data)
    }

    /// Disallowing children detaches all current children.
    #[instrument(level = "debug", skip(self))]
    pub fn set_allows_children(&mut self, idx: NodeId, allows: bool) -> TreeResult<()> {
        let node = self
            .arena
            .get_mut(idx)
            .ok_or_else(|| TreeError::missing_node(idx))?;
        node.allows_children = allows;
        if !allows {
            for child in self.children(idx).to_vec() {
                self.detach(child);
            }
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.arena.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|&c| c != child);
        }
        trace!("detached {:?} from {:?}", child, parent);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: usize) {
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.insert(position, child);
        }
        if let Some(child_node) = self.arena.get_mut(child) {
            child_node.parent = Some(parent);
        }
        if self.root == Some(child) {
            self.root = None;
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_, T> {
        TreeIterator::new(self, self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, idx: NodeId) -> usize {
        if self.contains(idx) {
            1 + self
                .children(idx)
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Leaf nodes below the root, in sorted pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl<T: PartialOrd> SortedTree<T> {
    /// Adds `child` to `parent` at its sort-correct position and returns that position.
    ///
    /// A child already under `parent` is relocated rather than duplicated; a
    /// child under another parent is moved. Ties go before the first equal
    /// sibling. Nothing is mutated when an error is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        self.ensure_insertable(parent, child)?;
        let position = self.insert_position(parent, child)?;
        self.detach(child);
        self.attach(parent, child, position);
        debug!("added {:?} to {:?} at {}", child, parent, position);
        Ok(position)
    }

    /// Replaces the ordering of `idx` and re-sorts its children with it.
    #[instrument(level = "debug", skip(self))]
    pub fn set_ordering(&mut self, idx: NodeId, ordering: ChildOrdering<T>) -> TreeResult<()> {
        let node = self
            .arena
            .get_mut(idx)
            .ok_or_else(|| TreeError::missing_node(idx))?;
        node.ordering = ordering;
        let children = node.children.clone();
        self.sort_children(idx, children)
    }

    /// Re-sorts the changed children of `idx` if the event targets it.
    #[instrument(level = "debug", skip(self))]
    pub fn on_children_changed(&mut self, idx: NodeId, event: &TreeEvent) -> TreeResult<()> {
        let TreeEvent::NodesChanged { children, .. } = event else {
            return Ok(());
        };
        if event.target() != Some(idx) {
            return Ok(());
        }
        let mut changed: Vec<NodeId> = Vec::with_capacity(children.len());
        for &child in children {
            if self.parent(child) == Some(idx) && !changed.contains(&child) {
                changed.push(child);
            }
        }
        self.sort_children(idx, changed)
    }

    /// Re-sorts all children of `idx` if the event targets it.
    #[instrument(level = "debug", skip(self))]
    pub fn on_structure_changed(&mut self, idx: NodeId, event: &TreeEvent) -> TreeResult<()> {
        if !matches!(event, TreeEvent::StructureChanged { .. }) || event.target() != Some(idx) {
            return Ok(());
        }
        let children = self.children(idx).to_vec();
        self.sort_children(idx, children)
    }

    /// Delivers `event` to its target and then to each ancestor up to the root.
    #[instrument(level = "debug", skip(self))]
    pub fn dispatch(&mut self, event: &TreeEvent) -> TreeResult<()> {
        let Some(target) = event.target() else {
            return Ok(());
        };
        if !self.contains(target) {
            return Err(TreeError::missing_node(target));
        }
        let mut current = Some(target);
        while let Some(node) = current {
            match event {
                TreeEvent::NodesChanged { .. } => self.on_children_changed(node, event)?,
                TreeEvent::StructureChanged { .. } => self.on_structure_changed(node, event)?,
            }
            current = self.parent(node);
        }
        Ok(())
    }

    /// Tells the parent of `idx` that its payload may have a new sort key.
    pub fn notify_changed(&mut self, idx: NodeId) -> TreeResult<()> {
        if !self.contains(idx) {
            return Err(TreeError::missing_node(idx));
        }
        match self.parent(idx) {
            Some(parent) => {
                let path = self.path_to_root(parent)?;
                self.dispatch(&TreeEvent::nodes_changed(path, vec![idx]))
            }
            None => Ok(()),
        }
    }

    pub fn notify_structure_changed(&mut self, idx: NodeId) -> TreeResult<()> {
        let path = self.path_to_root(idx)?;
        self.dispatch(&TreeEvent::structure_changed(path))
    }

    /// Mutates the payload of `idx` and moves it back into sorted position.
    #[instrument(level = "debug", skip(self, f))]
    pub fn update<F>(&mut self, idx: NodeId, f: F) -> TreeResult<()>
    where
        F: FnOnce(&mut T),
    {
        let data = self.data_mut(idx).ok_or_else(|| TreeError::missing_node(idx))?;
        f(data);
        self.notify_changed(idx)
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let parent_node = self
            .arena
            .get(parent)
            .ok_or_else(|| TreeError::missing_node(parent))?;
        if !parent_node.allows_children {
            return Err(TreeError::ChildrenNotAllowed(parent));
        }
        if !self.contains(child) {
            return Err(TreeError::missing_node(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::InvalidArgument(format!(
                "{:?} is an ancestor of {:?}",
                child, parent
            )));
        }
        Ok(())
    }

    /// Lower-bound binary search over the siblings of `child`, ignoring `child` itself.
    fn insert_position(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        let parent_node = self
            .arena
            .get(parent)
            .ok_or_else(|| TreeError::missing_node(parent))?;
        let value = self.data(child).ok_or_else(|| TreeError::missing_node(child))?;
        let siblings: Vec<NodeId> = parent_node
            .children
            .iter()
            .copied()
            .filter(|&c| c != child)
            .collect();

        let (mut low, mut high) = (0, siblings.len());
        while low < high {
            let mid = low + (high - low) / 2;
            let probe = self
                .data(siblings[mid])
                .ok_or_else(|| TreeError::missing_node(siblings[mid]))?;
            match parent_node.ordering.compare(probe, value)? {
                Ordering::Less => low = mid + 1,
                Ordering::Equal | Ordering::Greater => high = mid,
            }
        }
        Ok(low)
    }

    /// Removes every node in `batch` from `idx`, then re-adds them one by one.
    ///
    /// Not transactional: if a re-add fails, the rest of the batch stays detached.
    fn sort_children(&mut self, idx: NodeId, batch: Vec<NodeId>) -> TreeResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!("re-sorting {} children of {:?}", batch.len(), idx);
        for &child in &batch {
            self.remove(idx, child)?;
        }
        for &child in &batch {
            self.add(idx, child)?;
        }
        Ok(())
    }
}

pub struct TreeIterator<'a, T> {
    tree: &'a SortedTree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> TreeIterator<'a, T> {
    fn new(tree: &'a SortedTree<T>, start: Option<NodeId>) -> Self {
        Self {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, T> {
    tree: &'a SortedTree<T>,
    stack: Vec<(NodeId, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    fn new(tree: &'a SortedTree<T>) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current) {
                if !visited {
                    self.stack.push((current, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing;

    fn values(tree: &SortedTree<i32>, idx: NodeId) -> Vec<i32> {
        tree.children(idx)
            .iter()
            .filter_map(|&c| tree.data(c).copied())
            .collect()
    }

    #[test]
    fn test_add_keeps_children_sorted() {
        testing::init_test_setup();
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        for v in [5, 3, 9, 1, 7] {
            let child = tree.create_node(v);
            tree.add(root, child).unwrap();
        }
        assert_eq!(values(&tree, root), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_add_moves_child_between_parents() {
        let mut tree = SortedTree::new();
        let a = tree.create_node(0);
        let b = tree.create_node(0);
        let child = tree.create_node(4);
        tree.add(a, child).unwrap();
        tree.add(b, child).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[child]);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn test_add_rejects_ancestor() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        let child = tree.create_node(1);
        tree.add(root, child).unwrap();
        assert!(matches!(tree.add(child, root), Err(TreeError::InvalidArgument(_))));
        assert!(matches!(tree.add(root, root), Err(TreeError::InvalidArgument(_))));
        assert_eq!(tree.children(root), &[child]);
    }

    #[test]
    fn test_incomparable_add_leaves_tree_unchanged() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0.0_f64);
        let one = tree.create_node(1.0);
        tree.add(root, one).unwrap();
        let nan = tree.create_node(f64::NAN);
        assert_eq!(tree.add(root, nan), Err(TreeError::Incomparable));
        assert_eq!(tree.children(root), &[one]);
        assert_eq!(tree.parent(nan), None);
    }

    #[test]
    fn test_reversed_natural_add_rejects_nan() {
        let mut tree = SortedTree::new();
        let root = tree.create_node_with(0.0_f64, true, ChildOrdering::Natural.reversed());
        let one = tree.create_node(1.0);
        let two = tree.create_node(2.0);
        tree.add(root, one).unwrap();
        tree.add(root, two).unwrap();
        assert_eq!(tree.children(root), &[two, one]);

        let nan = tree.create_node(f64::NAN);
        assert_eq!(tree.add(root, nan), Err(TreeError::Incomparable));
        assert_eq!(tree.child_count(root), 2);
    }

    #[test]
    fn test_leaf_parent_reported_before_missing_child() {
        let mut tree = SortedTree::new();
        let leaf = tree.create_leaf(0);
        let stale = tree.create_node(1);
        tree.remove_subtree(stale).unwrap();
        assert_eq!(tree.add(leaf, stale), Err(TreeError::ChildrenNotAllowed(leaf)));
    }

    #[test]
    fn test_remove_non_child_is_invalid_argument() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        let child = tree.create_node(1);
        let stranger = tree.create_node(2);
        tree.add(root, child).unwrap();

        assert!(matches!(tree.remove(root, stranger), Err(TreeError::InvalidArgument(_))));
        assert_eq!(tree.children(root), &[child]);
        assert_eq!(tree.remove(root, child), Ok(0));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn test_remove_from_parent_detaches_child() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        let a = tree.create_node(1);
        let b = tree.create_node(2);
        tree.add(root, a).unwrap();
        tree.add(root, b).unwrap();

        tree.remove_from_parent(a).unwrap();
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.parent(a), None);
        assert!(tree.contains(a));
        // detached nodes are a no-op
        tree.remove_from_parent(a).unwrap();

        tree.remove_subtree(a).unwrap();
        assert!(matches!(tree.remove_from_parent(a), Err(TreeError::InvalidArgument(_))));
    }

    #[test]
    fn test_set_allows_children_false_detaches_children() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        let child = tree.create_node(1);
        tree.add(root, child).unwrap();
        tree.set_allows_children(root, false).unwrap();
        assert!(tree.is_leaf(root));
        assert_eq!(tree.parent(child), None);
        assert!(tree.contains(child));
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        tree.set_root(root).unwrap();
        let child = tree.create_node(1);
        let grandchild = tree.create_node(2);
        tree.add(root, child).unwrap();
        tree.add(child, grandchild).unwrap();

        assert_eq!(tree.remove_subtree(child), Ok(1));
        assert!(!tree.contains(grandchild));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_path_to_root() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        let child = tree.create_node(1);
        let grandchild = tree.create_node(2);
        tree.add(root, child).unwrap();
        tree.add(child, grandchild).unwrap();
        let path = tree.path_to_root(grandchild).unwrap();
        assert_eq!(path.nodes(), &[root, child, grandchild]);
    }

    #[test]
    fn test_iterators_visit_in_sorted_order() {
        let mut tree = SortedTree::new();
        let root = tree.create_node(0);
        tree.set_root(root).unwrap();
        let b = tree.create_node(2);
        let a = tree.create_node(1);
        let a1 = tree.create_node(10);
        tree.add(root, b).unwrap();
        tree.add(root, a).unwrap();
        tree.add(a, a1).unwrap();

        let pre: Vec<i32> = tree.iter().map(|(_, n)| *n.data()).collect();
        assert_eq!(pre, vec![0, 1, 10, 2]);
        let post: Vec<i32> = tree.iter_postorder().map(|(_, n)| *n.data()).collect();
        assert_eq!(post, vec![10, 1, 2, 0]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_nodes(), vec![a1, b]);
    }
}
