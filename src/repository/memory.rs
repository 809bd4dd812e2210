//! In-memory node repository
//!
//! Nodes live in a single arena addressed by index. Each slot stores its
//! children and a parent back-pointer; binding keeps the back-pointer in
//! step with the child links, so a node always has at most one parent.

use std::collections::HashMap;
use std::fmt;

use super::{NodeRepository, RepositoryError};

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: i64,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Node as seen by value, for dumps and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct NodeSnapshot {
    /// Stored value
    pub value: i64,
    /// Parent value
    pub parent: Option<i64>,
    /// Left child value
    pub left: Option<i64>,
    /// Right child value
    pub right: Option<i64>,
}

/// Forest of trees held in process memory
#[derive(Debug, Default)]
pub struct MemoryRepository {
    slots: Vec<Slot>,

    /// Per tree: value → node, plus creation order for dumps
    trees: Vec<(HashMap<i64, NodeId>, Vec<NodeId>)>,
}

impl MemoryRepository {
    /// Create an empty forest
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trees created so far
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Number of nodes in `tree`
    pub fn node_count(&self, tree: usize) -> Result<usize, RepositoryError> {
        Ok(self.tree(tree)?.1.len())
    }

    /// Nodes of `tree` in creation order
    pub fn snapshot(&self, tree: usize) -> Result<Vec<NodeSnapshot>, RepositoryError> {
        let value_of = |id: Option<NodeId>| id.map(|id| self.slots[id.0].value);
        Ok(self
            .tree(tree)?
            .1
            .iter()
            .map(|id| {
                let slot = &self.slots[id.0];
                NodeSnapshot {
                    value: slot.value,
                    parent: value_of(slot.parent),
                    left: value_of(slot.left),
                    right: value_of(slot.right),
                }
            })
            .collect())
    }

    fn tree(&self, tree: usize) -> Result<&(HashMap<i64, NodeId>, Vec<NodeId>), RepositoryError> {
        self.trees
            .get(tree)
            .ok_or_else(|| RepositoryError::TreeNotFound(tree.to_string()))
    }

    fn slot(&self, node: NodeId) -> Result<&Slot, RepositoryError> {
        self.slots
            .get(node.0)
            .ok_or_else(|| RepositoryError::NodeNotFound(node.to_string()))
    }

    fn bind(&mut self, node: NodeId, child: NodeId, side: Side) -> Result<(), RepositoryError> {
        self.slot(node)?;
        self.slot(child)?;

        let previous = match side {
            Side::Left => self.slots[node.0].left,
            Side::Right => self.slots[node.0].right,
        };
        if let Some(old) = previous.filter(|&old| old != child) {
            self.slots[old.0].parent = None;
        }

        if let Some(old_parent) = self.slots[child.0].parent {
            let slot = &mut self.slots[old_parent.0];
            if slot.left == Some(child) {
                slot.left = None;
            }
            if slot.right == Some(child) {
                slot.right = None;
            }
        }

        let slot = &mut self.slots[node.0];
        match side {
            Side::Left => slot.left = Some(child),
            Side::Right => slot.right = Some(child),
        }
        self.slots[child.0].parent = Some(node);
        Ok(())
    }
}

impl NodeRepository for MemoryRepository {
    type TreeKey = usize;
    type NodeKey = NodeId;

    fn new_tree(&mut self) -> Result<usize, RepositoryError> {
        self.trees.push((HashMap::new(), Vec::new()));
        Ok(self.trees.len() - 1)
    }

    fn ensure_node(&mut self, tree: &usize, value: i64) -> Result<NodeId, RepositoryError> {
        let next = NodeId(self.slots.len());
        let (by_value, order) = self
            .trees
            .get_mut(*tree)
            .ok_or_else(|| RepositoryError::TreeNotFound(tree.to_string()))?;

        if let Some(&existing) = by_value.get(&value) {
            return Ok(existing);
        }
        by_value.insert(value, next);
        order.push(next);
        self.slots.push(Slot {
            value,
            parent: None,
            left: None,
            right: None,
        });
        Ok(next)
    }

    fn bind_left(&mut self, node: &NodeId, left: &NodeId) -> Result<(), RepositoryError> {
        self.bind(*node, *left, Side::Left)
    }

    fn bind_right(&mut self, node: &NodeId, right: &NodeId) -> Result<(), RepositoryError> {
        self.bind(*node, *right, Side::Right)
    }

    fn get_id_by_value(&self, tree: &usize, value: i64) -> Result<NodeId, RepositoryError> {
        self.tree(*tree)?
            .0
            .get(&value)
            .copied()
            .ok_or_else(|| RepositoryError::value_not_found(tree, value))
    }

    fn get_value_by_id(&self, node: &NodeId) -> Result<i64, RepositoryError> {
        Ok(self.slot(*node)?.value)
    }

    fn get_parent_by_id(&self, node: &NodeId) -> Result<Option<NodeId>, RepositoryError> {
        Ok(self.slot(*node)?.parent)
    }
}

impl fmt::Display for MemoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tree in 0..self.trees.len() {
            writeln!(f, "---Tree {tree}---")?;
            for node in self.snapshot(tree).map_err(|_| fmt::Error)? {
                write!(f, "node value {}", node.value)?;
                if let Some(parent) = node.parent {
                    write!(f, " parent {parent}")?;
                }
                if let Some(left) = node.left {
                    write!(f, " left {left}")?;
                }
                if let Some(right) = node.right {
                    write!(f, " right {right}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tree_links() {
        let mut repo = MemoryRepository::new();
        let tree = repo.new_tree().unwrap();
        let root = repo.ensure_node(&tree, 20).unwrap();
        let left = repo.ensure_node(&tree, 10).unwrap();
        let right = repo.ensure_node(&tree, 30).unwrap();
        repo.bind_left(&root, &left).unwrap();
        repo.bind_right(&root, &right).unwrap();

        assert_eq!(repo.get_parent_by_id(&left).unwrap(), Some(root));
        assert_eq!(repo.get_parent_by_id(&right).unwrap(), Some(root));
        assert_eq!(repo.get_parent_by_id(&root).unwrap(), None);
    }

    #[test]
    fn test_ensure_node_is_idempotent_per_tree() {
        let mut repo = MemoryRepository::new();
        let first = repo.new_tree().unwrap();
        let second = repo.new_tree().unwrap();
        let a = repo.ensure_node(&first, 7).unwrap();
        assert_eq!(repo.ensure_node(&first, 7).unwrap(), a);
        assert_ne!(repo.ensure_node(&second, 7).unwrap(), a);
        assert_eq!(repo.node_count(first).unwrap(), 1);
        assert_eq!(repo.tree_count(), 2);
    }

    #[test]
    fn test_rebinding_detaches_previous_links() {
        let mut repo = MemoryRepository::new();
        let tree = repo.new_tree().unwrap();
        let a = repo.ensure_node(&tree, 10).unwrap();
        let b = repo.ensure_node(&tree, 20).unwrap();
        let x = repo.ensure_node(&tree, 5).unwrap();
        let y = repo.ensure_node(&tree, 3).unwrap();

        repo.bind_left(&a, &x).unwrap();
        // x moves under b: a no longer points at it
        repo.bind_left(&b, &x).unwrap();
        assert_eq!(repo.get_parent_by_id(&x).unwrap(), Some(b));
        assert_eq!(repo.snapshot(tree).unwrap()[0].left, None);

        // y replaces x under b: x becomes a root
        repo.bind_left(&b, &y).unwrap();
        assert_eq!(repo.get_parent_by_id(&x).unwrap(), None);
        assert_eq!(repo.get_parent_by_id(&y).unwrap(), Some(b));
    }

    #[test]
    fn test_lookups_fail_when_absent() {
        let mut repo = MemoryRepository::new();
        let tree = repo.new_tree().unwrap();
        assert!(matches!(
            repo.get_id_by_value(&tree, 1),
            Err(RepositoryError::ValueNotFound { value: 1, .. })
        ));
        assert!(matches!(
            repo.get_value_by_id(&NodeId(42)),
            Err(RepositoryError::NodeNotFound(_))
        ));
        assert!(matches!(
            repo.ensure_node(&9, 1),
            Err(RepositoryError::TreeNotFound(_))
        ));
    }

    #[test]
    fn test_display_dump() {
        let mut repo = MemoryRepository::new();
        let tree = repo.new_tree().unwrap();
        let root = repo.ensure_node(&tree, 15).unwrap();
        let left = repo.ensure_node(&tree, 10).unwrap();
        repo.bind_left(&root, &left).unwrap();

        assert_eq!(
            repo.to_string(),
            "---Tree 0---\nnode value 15 left 10\nnode value 10 parent 15\n"
        );
    }
}
