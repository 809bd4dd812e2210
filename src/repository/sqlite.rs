//! SQLite-backed node repository
//!
//! Schema:
//!   config(item, content)                 -- holds the schema `version`
//!   tree(id)
//!   node(id, value, node_tree, left_child, right_child)
//!
//! A database written by another crate version is dropped and recreated
//! on open. Parents are not stored: they are found by scanning for the row
//! whose `left_child` or `right_child` references the node.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{NodeRepository, RepositoryError};

/// Version string stored in `config`; a mismatch resets the schema
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

const CREATE_SCHEMA: &str = "
    DROP TABLE IF EXISTS node;
    DROP TABLE IF EXISTS tree;
    DROP TABLE IF EXISTS config;
    CREATE TABLE config (
        item TEXT PRIMARY KEY,
        content TEXT
    );
    CREATE TABLE tree (
        id INTEGER PRIMARY KEY
    );
    CREATE TABLE node (
        id INTEGER PRIMARY KEY,
        value INTEGER NOT NULL,
        node_tree INTEGER NOT NULL,
        left_child INTEGER,
        right_child INTEGER,
        FOREIGN KEY(node_tree) REFERENCES tree(id),
        UNIQUE(node_tree, value)
    );
    CREATE INDEX node_left ON node(left_child);
    CREATE INDEX node_right ON node(right_child);
";

/// Node repository persisted in a SQLite database
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening tree database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, migrating the schema if needed
    pub fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// Schema version recorded in the database
    pub fn version(&self) -> Result<String, RepositoryError> {
        self.stored_version()?
            .ok_or(RepositoryError::MissingConfig("version"))
    }

    fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let stored = self.stored_version()?;
        if stored.as_deref() == Some(SCHEMA_VERSION) {
            return Ok(());
        }
        info!(
            stored = stored.as_deref().unwrap_or("none"),
            current = SCHEMA_VERSION,
            "resetting tree database schema"
        );
        self.conn.execute_batch(CREATE_SCHEMA)?;
        self.conn.execute(
            "INSERT INTO config (item, content) VALUES (?1, ?2)
             ON CONFLICT(item) DO UPDATE SET content = excluded.content",
            params!["version", SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn stored_version(&self) -> Result<Option<String>, RepositoryError> {
        let has_config: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'config'",
            [],
            |row| row.get(0),
        )?;
        if has_config == 0 {
            return Ok(None);
        }
        Ok(self
            .conn
            .query_row(
                "SELECT content FROM config WHERE item = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn require_node(&self, node: i64) -> Result<(), RepositoryError> {
        self.conn
            .query_row("SELECT id FROM node WHERE id = ?1", [node], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NodeNotFound(node.to_string()))
    }

    fn bind(&mut self, node: i64, child: i64, column: &'static str) -> Result<(), RepositoryError> {
        self.require_node(node)?;
        self.require_node(child)?;

        // A node has one parent: drop whatever linked the child before
        self.conn.execute(
            "UPDATE node SET left_child = NULL WHERE left_child = ?1",
            [child],
        )?;
        self.conn.execute(
            "UPDATE node SET right_child = NULL WHERE right_child = ?1",
            [child],
        )?;
        self.conn.execute(
            &format!("UPDATE node SET {column} = ?2 WHERE id = ?1"),
            params![node, child],
        )?;
        Ok(())
    }
}

impl NodeRepository for SqliteRepository {
    type TreeKey = i64;
    type NodeKey = i64;

    fn new_tree(&mut self) -> Result<i64, RepositoryError> {
        self.conn.execute("INSERT INTO tree DEFAULT VALUES", [])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn ensure_node(&mut self, tree: &i64, value: i64) -> Result<i64, RepositoryError> {
        match self.get_id_by_value(tree, value) {
            Ok(existing) => return Ok(existing),
            Err(RepositoryError::ValueNotFound { .. }) => {}
            Err(other) => return Err(other),
        }

        let tree_exists = self
            .conn
            .query_row("SELECT id FROM tree WHERE id = ?1", [tree], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .is_some();
        if !tree_exists {
            return Err(RepositoryError::TreeNotFound(tree.to_string()));
        }

        self.conn.execute(
            "INSERT INTO node (value, node_tree) VALUES (?1, ?2)",
            params![value, tree],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn bind_left(&mut self, node: &i64, left: &i64) -> Result<(), RepositoryError> {
        self.bind(*node, *left, "left_child")
    }

    fn bind_right(&mut self, node: &i64, right: &i64) -> Result<(), RepositoryError> {
        self.bind(*node, *right, "right_child")
    }

    fn get_id_by_value(&self, tree: &i64, value: i64) -> Result<i64, RepositoryError> {
        self.conn
            .query_row(
                "SELECT id FROM node WHERE node_tree = ?1 AND value = ?2",
                params![tree, value],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::value_not_found(tree, value))
    }

    fn get_value_by_id(&self, node: &i64) -> Result<i64, RepositoryError> {
        self.conn
            .query_row("SELECT value FROM node WHERE id = ?1", [node], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| RepositoryError::NodeNotFound(node.to_string()))
    }

    fn get_parent_by_id(&self, node: &i64) -> Result<Option<i64>, RepositoryError> {
        self.require_node(*node)?;
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM node WHERE left_child = ?1 OR right_child = ?1 LIMIT 1",
                [node],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn begin(&mut self) -> Result<(), RepositoryError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RepositoryError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), RepositoryError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tree_links() {
        let mut repo = SqliteRepository::in_memory().unwrap();
        let tree = repo.new_tree().unwrap();
        let root = repo.ensure_node(&tree, 20).unwrap();
        let left = repo.ensure_node(&tree, 10).unwrap();
        let right = repo.ensure_node(&tree, 30).unwrap();
        repo.bind_left(&root, &left).unwrap();
        repo.bind_right(&root, &right).unwrap();

        assert_eq!(repo.get_parent_by_id(&left).unwrap(), Some(root));
        assert_eq!(repo.get_parent_by_id(&right).unwrap(), Some(root));
        assert_eq!(repo.get_parent_by_id(&root).unwrap(), None);
        assert_eq!(repo.get_value_by_id(&right).unwrap(), 30);
    }

    #[test]
    fn test_version_is_recorded() {
        let repo = SqliteRepository::in_memory().unwrap();
        assert_eq!(repo.version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_missing_version_is_a_config_error() {
        let repo = SqliteRepository::in_memory().unwrap();
        repo.conn
            .execute("DELETE FROM config WHERE item = 'version'", [])
            .unwrap();

        let err = repo.version().unwrap_err();
        assert!(matches!(err, RepositoryError::MissingConfig("version")));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_stale_schema_is_reset() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE config (item TEXT PRIMARY KEY, content TEXT);
             INSERT INTO config VALUES ('version', '0.0.0-old');
             CREATE TABLE tree (id INTEGER PRIMARY KEY);
             INSERT INTO tree DEFAULT VALUES;",
        )
        .unwrap();

        let mut repo = SqliteRepository::from_connection(conn).unwrap();
        assert_eq!(repo.version().unwrap(), SCHEMA_VERSION);
        // Old rows are gone, so ids start over
        assert_eq!(repo.new_tree().unwrap(), 1);
    }

    #[test]
    fn test_ensure_node_is_idempotent() {
        let mut repo = SqliteRepository::in_memory().unwrap();
        let tree = repo.new_tree().unwrap();
        let other = repo.new_tree().unwrap();
        let node = repo.ensure_node(&tree, 5).unwrap();
        assert_eq!(repo.ensure_node(&tree, 5).unwrap(), node);
        assert_ne!(repo.ensure_node(&other, 5).unwrap(), node);
        assert!(matches!(
            repo.ensure_node(&99, 5),
            Err(RepositoryError::TreeNotFound(_))
        ));
    }

    #[test]
    fn test_rebinding_detaches_previous_parent() {
        let mut repo = SqliteRepository::in_memory().unwrap();
        let tree = repo.new_tree().unwrap();
        let a = repo.ensure_node(&tree, 10).unwrap();
        let b = repo.ensure_node(&tree, 20).unwrap();
        let x = repo.ensure_node(&tree, 5).unwrap();

        repo.bind_left(&a, &x).unwrap();
        repo.bind_left(&b, &x).unwrap();
        assert_eq!(repo.get_parent_by_id(&x).unwrap(), Some(b));
    }

    #[test]
    fn test_rollback_discards_nodes() {
        let mut repo = SqliteRepository::in_memory().unwrap();
        let tree = repo.new_tree().unwrap();
        repo.begin().unwrap();
        repo.ensure_node(&tree, 1).unwrap();
        repo.rollback().unwrap();
        assert!(matches!(
            repo.get_id_by_value(&tree, 1),
            Err(RepositoryError::ValueNotFound { .. })
        ));
    }
}
