//! Request routing helpers shared by the HTTP server and the CLI

mod controller;
mod uri;

pub use controller::{IdCodec, TreeController};
pub use uri::{AncestorQuery, Field, MiniParser, UriError};

use thiserror::Error;

use crate::repository::RepositoryError;
use crate::tree::TreeError;

/// Errors surfaced to clients
#[derive(Error, Debug)]
pub enum RouteError {
    /// Path does not have the expected shape
    #[error("malformed path: {0}")]
    Uri(#[from] UriError),

    /// Tree id is foreign or unparseable
    #[error("unknown tree id `{0}`")]
    UnknownTree(String),

    /// Compile or query failure
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Repository failure outside a tree operation
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Shared state is unusable (poisoned lock or worker pool gone)
    #[error("service unavailable: {0}")]
    Unavailable(String),
}
