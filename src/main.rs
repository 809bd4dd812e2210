use std::path::{Path, PathBuf};

use ancestry::{server, ServiceConfig, SqliteRepository, Tree};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ancestry",
    version,
    about = "Compile binary search tree notation and answer common-ancestor queries"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Storage {
    /// SQLite database holding the trees.
    #[arg(long, env = "ANCESTRY_DATABASE", default_value = "trees.db")]
    database: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service.
    Serve {
        #[command(flatten)]
        storage: Storage,
        /// Interface to listen on.
        #[arg(long, env = "ANCESTRY_BIND", default_value = "0.0.0.0")]
        bind: String,
        /// TCP port.
        #[arg(long, env = "ANCESTRY_PORT", default_value_t = 8080)]
        port: u16,
        /// Prefix for published tree ids (default: host name).
        #[arg(long, env = "ANCESTRY_INSTANCE")]
        instance: Option<String>,
        /// HTTP worker threads (default: one per core).
        #[arg(long, env = "ANCESTRY_WORKERS")]
        workers: Option<usize>,
    },
    /// Compile notation into a new tree and print its id.
    Compile {
        #[command(flatten)]
        storage: Storage,
        /// Notation text, e.g. `[5<10>15][5>7]`.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,
        /// Read the notation from a file instead.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the lowest common ancestor of two values in a stored tree.
    Ancestor {
        #[command(flatten)]
        storage: Storage,
        /// Tree id as printed by `compile`.
        tree: i64,
        /// First value.
        first: i64,
        /// Second value.
        second: i64,
    },
    /// Parse notation without storing it and print the clauses.
    Check {
        /// Notation text.
        text: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            storage,
            bind,
            port,
            instance,
            workers,
        } => {
            let config = ServiceConfig {
                bind_address: bind,
                port,
                database: storage.database,
                instance_prefix: instance.unwrap_or_else(ServiceConfig::host_prefix),
                workers,
            };
            run_serve(config)?
        }
        Commands::Compile {
            storage,
            text,
            file,
        } => run_compile(storage.database, text, file)?,
        Commands::Ancestor {
            storage,
            tree,
            first,
            second,
        } => run_ancestor(storage.database, tree, first, second)?,
        Commands::Check { text } => run_check(&text)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_serve(config: ServiceConfig) -> Result<()> {
    let state = server::shared_state(&config).with_context(|| {
        format!("failed to open tree database {}", config.database.display())
    })?;
    actix_web::rt::System::new()
        .block_on(server::run(config, state))
        .context("HTTP service stopped with an error")
}

fn run_compile(database: PathBuf, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read notation from {}", path.display()))?,
        (None, None) => anyhow::bail!("no notation given"),
    };

    let mut repo = open(&database)?;
    let tree = Tree::compile(&mut repo, text.trim_end())
        .with_context(|| format!("failed to compile `{}`", text.trim_end()))?;
    println!("{}", tree.id());
    Ok(())
}

fn run_ancestor(database: PathBuf, tree: i64, first: i64, second: i64) -> Result<()> {
    let repo = open(&database)?;
    let value = Tree::new(tree)
        .find_common_ancestor(&repo, first, second)
        .with_context(|| format!("query failed for {first} and {second} in tree {tree}"))?;
    println!("{value}");
    Ok(())
}

fn run_check(text: &str) -> Result<()> {
    let triplets = ancestry::parse_all(text).context("notation rejected")?;
    if triplets.is_empty() {
        println!("No clauses.");
    }
    for (idx, triplet) in triplets.iter().enumerate() {
        println!(
            "clause {}\tleft={}\tvalue={}\tright={}",
            idx + 1,
            triplet.left.map_or_else(|| "-".to_string(), |v| v.to_string()),
            triplet.value,
            triplet.right.map_or_else(|| "-".to_string(), |v| v.to_string()),
        );
    }
    Ok(())
}

fn open(database: &Path) -> Result<SqliteRepository> {
    SqliteRepository::open(database)
        .with_context(|| format!("failed to open tree database {}", database.display()))
}
