//! Request handlers independent of the HTTP layer
//!
//! Tree ids leave the process as `{prefix}-{key}` so clients talking to
//! several instances can tell which instance owns a tree.

use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use super::uri::AncestorQuery;
use super::RouteError;
use crate::repository::{NodeRepository, SqliteRepository};
use crate::tree::Tree;

/// Converts repository tree keys to and from their public form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCodec {
    prefix: String,
}

impl IdCodec {
    /// Codec for `prefix`; characters unsafe in a path segment become `_`
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix
            .into()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self { prefix }
    }

    /// Instance prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Public form of `key`
    pub fn encode<K: Display>(&self, key: &K) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}-{}", self.prefix, key)
        }
    }

    /// Repository key behind a public id
    pub fn decode<K: FromStr>(&self, id: &str) -> Result<K, RouteError> {
        let raw = if self.prefix.is_empty() {
            Some(id)
        } else {
            id.strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_prefix('-'))
        };
        raw.and_then(|raw| raw.parse().ok())
            .ok_or_else(|| RouteError::UnknownTree(id.to_string()))
    }
}

/// Tree operations exposed to clients
#[derive(Debug)]
pub struct TreeController<R> {
    repo: R,
    ids: IdCodec,
}

impl<R> TreeController<R>
where
    R: NodeRepository,
    R::TreeKey: Display + FromStr,
{
    /// Controller over `repo`, publishing ids through `ids`
    pub fn new(repo: R, ids: IdCodec) -> Self {
        Self { repo, ids }
    }

    /// Backing repository
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Id codec in use
    pub fn ids(&self) -> &IdCodec {
        &self.ids
    }

    /// Compile `body` into a new tree and return its public id
    ///
    /// The compile runs inside a repository transaction, so a rejected
    /// body leaves nothing behind on transactional backends.
    pub fn post_tree(&mut self, body: &str) -> Result<String, RouteError> {
        self.repo.begin()?;
        match Tree::compile(&mut self.repo, body) {
            Ok(tree) => {
                self.repo.commit()?;
                Ok(self.ids.encode(tree.id()))
            }
            Err(err) => {
                if let Err(rollback) = self.repo.rollback() {
                    warn!(error = %rollback, "rollback after failed compile did not succeed");
                }
                Err(err.into())
            }
        }
    }

    /// Answer a `/tree/{id}/common-ancestor/{v1}/{v2}` path
    pub fn common_ancestor(&self, uri: &str) -> Result<String, RouteError> {
        let query = AncestorQuery::from_uri(uri)?;
        let tree = Tree::new(self.ids.decode::<R::TreeKey>(&query.tree)?);
        let value = tree.find_common_ancestor(&self.repo, query.first, query.second)?;
        Ok(value.to_string())
    }
}

impl TreeController<SqliteRepository> {
    /// Schema version of the backing database
    pub fn version(&self) -> Result<String, RouteError> {
        Ok(self.repo.version()?)
    }
}
