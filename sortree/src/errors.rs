use generational_arena::Index;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A node reference that does not resolve, or a child that would create a cycle.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("node does not allow children: {0:?}")]
    ChildrenNotAllowed(Index),

    #[error("payloads cannot be compared by natural ordering")]
    Incomparable,
}

impl TreeError {
    pub fn missing_node(idx: Index) -> Self {
        TreeError::InvalidArgument(format!("node {:?} is not part of the tree", idx))
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
