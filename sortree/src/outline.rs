//! Indented text outlines as sorted trees.
//!
//! Each non-blank line is a node; its depth is the leading indentation
//! divided by the indent width (a tab counts as one level). Lines starting
//! with `#` are comments.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::arena::{NodeId, SortedTree};
use crate::errors::TreeError;
use crate::ordering::ChildOrdering;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OutlineError {
    #[error("line {line}: {reason}")]
    Indentation { line: usize, reason: String },

    #[error("indent width must be at least 1")]
    ZeroIndent,

    #[error("{0}")]
    Tree(#[from] TreeError),
}

/// Builds a tree under a synthetic root labelled `root_label`; every node sorts with `ordering`.
#[instrument(level = "debug", skip(input, ordering))]
pub fn parse_outline(
    input: &str,
    indent: usize,
    root_label: &str,
    ordering: &ChildOrdering<String>,
) -> Result<SortedTree<String>, OutlineError> {
    if indent == 0 {
        return Err(OutlineError::ZeroIndent);
    }
    let mut tree = SortedTree::new();
    let root = tree.create_node_with(root_label.to_string(), true, ordering.clone());
    tree.set_root(root)?;

    // stack[level] is the most recent node at that level
    let mut stack: Vec<NodeId> = vec![root];
    for (number, raw) in input.lines().enumerate() {
        let line = number + 1;
        let label = raw.trim();
        if label.is_empty() || label.starts_with('#') {
            continue;
        }
        let level = indent_level(raw, indent).ok_or_else(|| OutlineError::Indentation {
            line,
            reason: format!("indentation is not a multiple of {}", indent),
        })?;
        if level >= stack.len() {
            return Err(OutlineError::Indentation {
                line,
                reason: format!("jumps to level {} below level {}", level, stack.len() - 1),
            });
        }
        stack.truncate(level + 1);
        let parent = stack[level];
        let node = tree.create_node_with(label.to_string(), true, ordering.clone());
        tree.add(parent, node)?;
        stack.push(node);
    }
    debug!("parsed outline with {} nodes", tree.len());
    Ok(tree)
}

fn indent_level(raw: &str, indent: usize) -> Option<usize> {
    let mut spaces = 0;
    let mut tabs = 0;
    for c in raw.chars() {
        match c {
            ' ' => spaces += 1,
            '\t' => tabs += 1,
            _ => break,
        }
    }
    (spaces % indent == 0).then_some(tabs + spaces / indent)
}

/// Resolves a `/`-separated label path below the root, e.g. `fruit/apple`.
pub fn find_by_labels(tree: &SortedTree<String>, path: &str) -> Option<NodeId> {
    let mut current = tree.root()?;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = tree
            .children(current)
            .iter()
            .copied()
            .find(|&child| tree.data(child).is_some_and(|label| label == segment))?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(tree: &SortedTree<String>, idx: NodeId) -> Vec<&str> {
        tree.children(idx)
            .iter()
            .filter_map(|&c| tree.data(c).map(String::as_str))
            .collect()
    }

    #[test]
    fn test_parse_nested_outline_sorted() {
        let input = "fruit\n  pear\n  apple\nanimal\n  dog\n  cat\n";
        let tree = parse_outline(input, 2, "root", &ChildOrdering::Natural).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(labels(&tree, root), vec!["animal", "fruit"]);
        let fruit = find_by_labels(&tree, "fruit").unwrap();
        assert_eq!(labels(&tree, fruit), vec!["apple", "pear"]);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let input = "# heading\n\nb\n\ta\n";
        let tree = parse_outline(input, 4, "root", &ChildOrdering::Natural).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(find_by_labels(&tree, "b/a").is_some());
    }

    #[test]
    fn test_parse_rejects_level_jump() {
        let err = parse_outline("a\n    b\n", 2, "root", &ChildOrdering::Natural).unwrap_err();
        assert!(matches!(err, OutlineError::Indentation { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_odd_indent() {
        let err = parse_outline("a\n   b\n", 2, "root", &ChildOrdering::Natural).unwrap_err();
        assert!(matches!(err, OutlineError::Indentation { line: 2, .. }));
    }

    #[test]
    fn test_find_by_labels_missing() {
        let tree = parse_outline("a\n", 2, "root", &ChildOrdering::Natural).unwrap();
        assert_eq!(find_by_labels(&tree, "b"), None);
        assert_eq!(find_by_labels(&tree, ""), tree.root());
    }
}
