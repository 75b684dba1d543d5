use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::arena::{NodeId, SortedTree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl<T: Display> TreeNodeConvert for SortedTree<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        match self.root() {
            Some(root) => subtree_to_tree_string(self, root),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

/// Renders the subtree below `idx`, children in their sorted order.
pub fn subtree_to_tree_string<T: Display>(tree: &SortedTree<T>, idx: NodeId) -> Tree<String> {
    let label = tree
        .data(idx)
        .map(|data| data.to_string())
        .unwrap_or_default();
    let leaves: Vec<_> = tree
        .children(idx)
        .iter()
        .map(|&child| subtree_to_tree_string(tree, child))
        .collect();
    Tree::new(label).with_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_renders_placeholder() {
        let tree: SortedTree<String> = SortedTree::new();
        assert_eq!(tree.to_tree_string().to_string().trim(), "Empty tree");
    }

    #[test]
    fn test_render_sorted_children() {
        let mut tree = SortedTree::new();
        let root = tree.create_node("root".to_string());
        tree.set_root(root).unwrap();
        for label in ["b", "a"] {
            let child = tree.create_node(label.to_string());
            tree.add(root, child).unwrap();
        }
        let rendered = tree.to_tree_string().to_string();
        let a = rendered.find("a\n").unwrap();
        let b = rendered.find("b\n").unwrap();
        assert!(rendered.starts_with("root"));
        assert!(a < b);
    }
}
