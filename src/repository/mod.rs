//! Node storage behind the tree builder and ancestor resolver
//!
//! The core never tracks parents itself. A repository derives a node's
//! parent from child linkage: the parent of `n` is the node whose left or
//! right child is `n`. Implementations must keep that answer consistent
//! with `bind_left` / `bind_right` at all times, which is why binding a
//! child detaches it from any previous parent.

mod memory;
mod sqlite;

pub use memory::{MemoryRepository, NodeSnapshot};
pub use sqlite::{SqliteRepository, SCHEMA_VERSION};

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Storage contract consumed by [`crate::Tree`]
pub trait NodeRepository {
    /// Opaque tree identity
    type TreeKey: Clone + Eq + Debug;

    /// Opaque node identity
    type NodeKey: Clone + Eq + Hash + Debug;

    /// Create an empty tree with a fresh identity
    fn new_tree(&mut self) -> Result<Self::TreeKey, RepositoryError>;

    /// Fetch the node holding `value` in `tree`, creating a childless one if absent
    fn ensure_node(
        &mut self,
        tree: &Self::TreeKey,
        value: i64,
    ) -> Result<Self::NodeKey, RepositoryError>;

    /// Make `left` the left child of `node`, replacing any prior link
    fn bind_left(
        &mut self,
        node: &Self::NodeKey,
        left: &Self::NodeKey,
    ) -> Result<(), RepositoryError>;

    /// Make `right` the right child of `node`, replacing any prior link
    fn bind_right(
        &mut self,
        node: &Self::NodeKey,
        right: &Self::NodeKey,
    ) -> Result<(), RepositoryError>;

    /// Node holding `value` in `tree`
    fn get_id_by_value(
        &self,
        tree: &Self::TreeKey,
        value: i64,
    ) -> Result<Self::NodeKey, RepositoryError>;

    /// Value stored at `node`
    fn get_value_by_id(&self, node: &Self::NodeKey) -> Result<i64, RepositoryError>;

    /// Parent of `node`, or `None` for a root
    fn get_parent_by_id(
        &self,
        node: &Self::NodeKey,
    ) -> Result<Option<Self::NodeKey>, RepositoryError>;

    /// Start a unit of work; no-op unless the backend is transactional
    fn begin(&mut self) -> Result<(), RepositoryError> {
        Ok(())
    }

    /// Make the current unit of work durable
    fn commit(&mut self) -> Result<(), RepositoryError> {
        Ok(())
    }

    /// Discard the current unit of work
    fn rollback(&mut self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Errors raised by repositories
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No node holds the value in the tree
    #[error("value {value} not found in tree {tree}")]
    ValueNotFound {
        /// Tree searched (debug rendering of its key)
        tree: String,
        /// Value looked up
        value: i64,
    },

    /// Node identity does not exist
    #[error("node {0} not found")]
    NodeNotFound(String),

    /// Tree identity does not exist
    #[error("tree {0} not found")]
    TreeNotFound(String),

    /// Required configuration entry is absent from the store
    #[error("configuration item `{0}` is missing")]
    MissingConfig(&'static str),

    /// Underlying SQLite failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RepositoryError {
    /// Helper for value lookups that found nothing
    pub fn value_not_found(tree: &impl Debug, value: i64) -> Self {
        RepositoryError::ValueNotFound {
            tree: format!("{tree:?}"),
            value,
        }
    }

    /// Whether the error means a requested tree, node or value is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::ValueNotFound { .. }
                | RepositoryError::NodeNotFound(_)
                | RepositoryError::TreeNotFound(_)
        )
    }
}
