//! Change notifications delivered to sorted nodes.

use generational_arena::Index;

/// Chain of node ids from a root down to the node an event targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreePath(Vec<Index>);

impl TreePath {
    pub fn new(nodes: Vec<Index>) -> Self {
        Self(nodes)
    }

    pub fn last(&self) -> Option<Index> {
        self.0.last().copied()
    }

    pub fn nodes(&self) -> &[Index] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// Listed children of the target changed in place and may need to move.
    NodesChanged { path: TreePath, children: Vec<Index> },
    /// The subtree below the target was rebuilt.
    StructureChanged { path: TreePath },
}

impl TreeEvent {
    pub fn nodes_changed(path: TreePath, children: Vec<Index>) -> Self {
        TreeEvent::NodesChanged { path, children }
    }

    pub fn structure_changed(path: TreePath) -> Self {
        TreeEvent::StructureChanged { path }
    }

    pub fn path(&self) -> &TreePath {
        match self {
            TreeEvent::NodesChanged { path, .. } => path,
            TreeEvent::StructureChanged { path } => path,
        }
    }

    /// Node the event is scoped to.
    pub fn target(&self) -> Option<Index> {
        self.path().last()
    }
}
