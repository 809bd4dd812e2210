//! # Binary search tree notation compiler and ancestor resolver
//!
//! Compact text such as `[5<10>15][5>7]` describes fragments of a binary
//! search tree. This library compiles that text into a persisted tree and
//! answers "lowest common ancestor of two values" queries against it.
//!
//! ## Pipeline
//!
//! 1. **Tokenizer**: raw text → `[`, `]`, `<`, `>`, integers
//! 2. **Notation parser**: finite state machine → `{left?, value, right?}` triplets,
//!    rejecting any clause that breaks search-tree ordering
//! 3. **Tree builder**: triplets → node links in a [`NodeRepository`]
//! 4. **Ancestor resolver**: two values → their lowest common ancestor,
//!    by intersecting parent chains
//!
//! ## Usage Example
//!
//! ```
//! use ancestry::{MemoryRepository, Tree};
//!
//! let mut repo = MemoryRepository::new();
//! let tree = Tree::compile(&mut repo, "[10<15>20][5<10>11]")?;
//! assert_eq!(tree.find_common_ancestor(&repo, 5, 20)?, 15);
//! assert_eq!(tree.find_common_ancestor(&repo, 5, 11)?, 10);
//! # Ok::<(), ancestry::TreeError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;     // Service configuration
pub mod notation;   // Tokenizer and notation parser
pub mod repository; // Node storage contract and backends
pub mod route;      // URI mini-parser and request controller
pub mod server;     // HTTP dispatcher
pub mod tree;       // Tree builder and ancestor resolver

// Re-exports for convenience
pub use config::ServiceConfig;
pub use notation::{parse, parse_all, NotationError, Triplet};
pub use repository::{MemoryRepository, NodeRepository, RepositoryError, SqliteRepository};
pub use route::{AncestorQuery, IdCodec, RouteError, TreeController};
pub use tree::{Tree, TreeError};
