//! Tree builder and ancestor resolver
//!
//! A [`Tree`] is only a handle: its nodes live in a [`NodeRepository`].
//! Compiling notation creates a fresh tree and applies each triplet in
//! textual order:
//!   1. ensure the value node
//!   2. ensure the left node and link it as left child
//!   3. ensure the right node and link it as right child
//!
//! Links are additive. A clause without a left or right part leaves the
//! existing link on that side untouched.
//!
//! Nothing is rolled back on failure; nodes created before the failing
//! clause stay in the repository unless the caller wraps the compile in
//! a repository transaction.

mod ancestors;

pub use ancestors::{common_ancestor, is_ancestor, AncestorChain};

use std::fmt::Debug;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::notation::{self, NotationError, Triplet};
use crate::repository::{NodeRepository, RepositoryError};

/// Errors raised while building or querying a tree
#[derive(Error, Debug)]
pub enum TreeError {
    /// Notation text rejected
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// Repository lookup or storage failure
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Ancestor chains of the two values never meet
    #[error("no common ancestor for {first} and {second}")]
    NoCommonAncestor {
        /// First queried value
        first: i64,
        /// Second queried value
        second: i64,
    },

    /// Link would make a node its own ancestor
    #[error("linking {child} under {parent} would create a cycle")]
    Cycle {
        /// Intended parent value
        parent: i64,
        /// Intended child value
        child: i64,
    },

    /// Stored links loop back on themselves
    #[error("ancestor chain revisits node {value}")]
    CorruptLinks {
        /// Value at the repeated node
        value: i64,
    },
}

/// Handle to a tree stored in a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<K> {
    id: K,
}

impl<K: Clone + Eq + Debug> Tree<K> {
    /// Handle for an existing tree
    pub fn new(id: K) -> Self {
        Self { id }
    }

    /// Repository identity of this tree
    pub fn id(&self) -> &K {
        &self.id
    }

    /// Consume the handle, returning the identity
    pub fn into_id(self) -> K {
        self.id
    }

    /// Create a new tree in `repo` and populate it from notation `text`
    #[instrument(level = "debug", skip(repo, text), fields(len = text.len()))]
    pub fn compile<R>(repo: &mut R, text: &str) -> Result<Self, TreeError>
    where
        R: NodeRepository<TreeKey = K>,
    {
        let tree = Self::new(repo.new_tree()?);
        let applied = tree.extend(repo, text)?;
        info!(tree = ?tree.id, triplets = applied, "compiled tree");
        Ok(tree)
    }

    /// Apply notation `text` to this tree, returning the number of clauses applied
    pub fn extend<R>(&self, repo: &mut R, text: &str) -> Result<usize, TreeError>
    where
        R: NodeRepository<TreeKey = K>,
    {
        let mut applied = 0;
        notation::parse(text, |triplet| {
            self.add_node(&mut *repo, triplet)?;
            applied += 1;
            Ok::<_, TreeError>(())
        })?;
        Ok(applied)
    }

    /// Apply a single triplet
    pub fn add_node<R>(&self, repo: &mut R, triplet: Triplet) -> Result<(), TreeError>
    where
        R: NodeRepository<TreeKey = K>,
    {
        debug!(tree = ?self.id, %triplet, "applying triplet");
        let node = repo.ensure_node(&self.id, triplet.value)?;

        if let Some(left) = triplet.left {
            let child = repo.ensure_node(&self.id, left)?;
            Self::guard_cycle(repo, &node, &child, triplet.value, left)?;
            repo.bind_left(&node, &child)?;
        }
        if let Some(right) = triplet.right {
            let child = repo.ensure_node(&self.id, right)?;
            Self::guard_cycle(repo, &node, &child, triplet.value, right)?;
            repo.bind_right(&node, &child)?;
        }
        Ok(())
    }

    /// Value of the lowest common ancestor of `first` and `second`
    #[instrument(level = "debug", skip(self, repo), fields(tree = ?self.id))]
    pub fn find_common_ancestor<R>(&self, repo: &R, first: i64, second: i64) -> Result<i64, TreeError>
    where
        R: NodeRepository<TreeKey = K>,
    {
        common_ancestor(repo, &self.id, first, second)
    }

    /// Values from `value` up to the root
    pub fn ancestors<R>(&self, repo: &R, value: i64) -> Result<Vec<i64>, TreeError>
    where
        R: NodeRepository<TreeKey = K>,
    {
        let start = repo.get_id_by_value(&self.id, value)?;
        AncestorChain::new(repo, start)
            .map(|node| -> Result<i64, TreeError> { Ok(repo.get_value_by_id(&node?)?) })
            .collect()
    }

    fn guard_cycle<R: NodeRepository>(
        repo: &R,
        parent: &R::NodeKey,
        child: &R::NodeKey,
        parent_value: i64,
        child_value: i64,
    ) -> Result<(), TreeError> {
        if is_ancestor(repo, child, parent.clone())? {
            return Err(TreeError::Cycle {
                parent: parent_value,
                child: child_value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[test]
    fn test_compile_links_children() {
        let mut repo = MemoryRepository::new();
        let tree = Tree::compile(&mut repo, "[5<10>15]").unwrap();
        assert_eq!(repo.node_count(*tree.id()).unwrap(), 3);
        assert_eq!(tree.ancestors(&repo, 5).unwrap(), vec![5, 10]);
        assert_eq!(tree.ancestors(&repo, 15).unwrap(), vec![15, 10]);
    }

    #[test]
    fn test_empty_clause_keeps_links() {
        let mut repo = MemoryRepository::new();
        let tree = Tree::compile(&mut repo, "[5<10>15][<10>]").unwrap();
        assert_eq!(tree.ancestors(&repo, 5).unwrap(), vec![5, 10]);
        assert_eq!(tree.ancestors(&repo, 15).unwrap(), vec![15, 10]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut repo = MemoryRepository::new();
        let err = Tree::compile(&mut repo, "[5<10>15][10<15]").unwrap_err();
        assert!(matches!(err, TreeError::Cycle { parent: 15, child: 10 }));
    }

    #[test]
    fn test_parse_error_keeps_earlier_nodes() {
        let mut repo = MemoryRepository::new();
        let err = Tree::compile(&mut repo, "[5<10>15][x]").unwrap_err();
        assert!(matches!(err, TreeError::Notation(_)));
        assert_eq!(repo.node_count(0).unwrap(), 3);
    }

    #[test]
    fn test_extend_reports_applied_clauses() {
        let mut repo = MemoryRepository::new();
        let tree = Tree::compile(&mut repo, "").unwrap();
        assert_eq!(tree.extend(&mut repo, "[1<2][2>3]").unwrap(), 2);
    }
}
