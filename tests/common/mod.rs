#![allow(dead_code)]

use ancestry::{MemoryRepository, NodeRepository, SqliteRepository, Tree, Triplet};

/// `{15,10,20}`: value 15 with left 10 and right 20
pub fn small_clauses() -> Vec<Triplet> {
    vec![Triplet::new(Some(10), 15, Some(20))]
}

/// Small tree plus a right-leaning chain 11 → 12 → 13 → 14 under 10
pub fn chain_clauses() -> Vec<Triplet> {
    vec![
        Triplet::new(Some(10), 15, Some(20)),
        Triplet::new(Some(5), 10, Some(11)),
        Triplet::new(None, 11, Some(12)),
        Triplet::new(None, 12, Some(13)),
        Triplet::new(None, 13, Some(14)),
    ]
}

/// Notation text for a clause list
pub fn render(clauses: &[Triplet]) -> String {
    clauses.iter().map(Triplet::to_string).collect()
}

/// Build a fresh tree by applying `clauses` directly
pub fn build<R: NodeRepository>(repo: &mut R, clauses: &[Triplet]) -> Tree<R::TreeKey> {
    let tree = Tree::new(repo.new_tree().expect("create tree"));
    for clause in clauses {
        tree.add_node(repo, *clause).expect("apply clause");
    }
    tree
}

pub fn memory() -> MemoryRepository {
    MemoryRepository::new()
}

pub fn sqlite() -> SqliteRepository {
    SqliteRepository::in_memory().expect("open in-memory sqlite")
}
