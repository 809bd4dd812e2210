//! Service configuration

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Fallback instance prefix when the host name is unknown
pub const DEFAULT_INSTANCE: &str = "local";

/// Where the OS publishes the host name, in lookup order
const HOSTNAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

/// Parameters for running the tree service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Interface to listen on
    pub bind_address: String,

    /// TCP port
    pub port: u16,

    /// SQLite database file
    pub database: PathBuf,

    /// Prefix put in front of published tree ids
    pub instance_prefix: String,

    /// HTTP worker threads (`None` = one per core)
    pub workers: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            database: PathBuf::from("trees.db"),
            instance_prefix: Self::host_prefix(),
            workers: None,
        }
    }
}

impl ServiceConfig {
    /// Instance prefix from `HOSTNAME`, else the OS host name, else [`DEFAULT_INSTANCE`]
    pub fn host_prefix() -> String {
        let files = HOSTNAME_FILES.map(Path::new);
        resolve_host(env::var("HOSTNAME").ok(), &files)
    }

    /// Use a different database file
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    /// Use an explicit instance prefix
    pub fn with_instance_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.instance_prefix = prefix.into();
        self
    }

    /// `(address, port)` pair for binding
    pub fn socket_address(&self) -> (&str, u16) {
        (&self.bind_address, self.port)
    }
}

fn resolve_host(from_env: Option<String>, files: &[&Path]) -> String {
    let non_empty = |host: String| {
        let host = host.trim().to_string();
        (!host.is_empty()).then_some(host)
    };
    from_env
        .and_then(non_empty)
        .or_else(|| {
            files
                .iter()
                .find_map(|path| fs::read_to_string(path).ok().and_then(non_empty))
        })
        .unwrap_or_else(|| DEFAULT_INSTANCE.to_string())
}
