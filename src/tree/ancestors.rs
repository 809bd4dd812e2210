//! Ancestor chains and lowest common ancestor
//!
//! A chain starts at a node and follows `get_parent_by_id` to the root.
//! LCA = first node on the chain of `second` that is also on the chain
//! of `first`. Cost is O(depth(first) + depth(second)) parent lookups.

use std::collections::HashSet;

use tracing::debug;

use super::TreeError;
use crate::repository::NodeRepository;

/// Iterator over a node and its ancestors, root last
///
/// Yields an error and stops if a node repeats, which only happens when
/// the stored links contain a cycle.
#[derive(Debug)]
pub struct AncestorChain<'r, R: NodeRepository> {
    repo: &'r R,
    next: Option<R::NodeKey>,
    seen: HashSet<R::NodeKey>,
}

impl<'r, R: NodeRepository> AncestorChain<'r, R> {
    /// Chain starting at `start` (inclusive)
    pub fn new(repo: &'r R, start: R::NodeKey) -> Self {
        Self {
            repo,
            next: Some(start),
            seen: HashSet::new(),
        }
    }
}

impl<R: NodeRepository> Iterator for AncestorChain<'_, R> {
    type Item = Result<R::NodeKey, TreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.seen.insert(current.clone()) {
            let failure = match self.repo.get_value_by_id(&current) {
                Ok(value) => TreeError::CorruptLinks { value },
                Err(err) => err.into(),
            };
            return Some(Err(failure));
        }
        match self.repo.get_parent_by_id(&current) {
            Ok(parent) => {
                self.next = parent;
                Some(Ok(current))
            }
            Err(err) => Some(Err(err.into())),
        }
    }
}

/// Whether `candidate` is `node` itself or one of its ancestors
pub fn is_ancestor<R: NodeRepository>(
    repo: &R,
    candidate: &R::NodeKey,
    node: R::NodeKey,
) -> Result<bool, TreeError> {
    for ancestor in AncestorChain::new(repo, node) {
        if ancestor? == *candidate {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Value of the lowest common ancestor of `first` and `second` in `tree`
pub fn common_ancestor<R: NodeRepository>(
    repo: &R,
    tree: &R::TreeKey,
    first: i64,
    second: i64,
) -> Result<i64, TreeError> {
    let start = repo.get_id_by_value(tree, first)?;
    let ancestors = AncestorChain::new(repo, start).collect::<Result<HashSet<_>, _>>()?;
    debug!(value = first, depth = ancestors.len(), "collected ancestor chain");

    let start = repo.get_id_by_value(tree, second)?;
    for node in AncestorChain::new(repo, start) {
        let node = node?;
        if ancestors.contains(&node) {
            return Ok(repo.get_value_by_id(&node)?);
        }
    }

    Err(TreeError::NoCommonAncestor { first, second })
}
