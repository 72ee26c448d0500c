use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mds",
    about = "Metadata Store: JSON key/value metadata over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Create the storage schema and exit
    Migrate(MigrateArgs),
    /// Check whether keys are acceptable metadata keys
    CheckKey(CheckKeyArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct StoreArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// SQLite database file (overrides the config file)
    #[arg(long, conflicts_with = "in_memory")]
    pub db: Option<PathBuf>,
    /// Use a volatile in-memory store
    #[arg(long)]
    pub in_memory: bool,
}

/// `migrate` only makes sense for a durable store, so it has no `--in-memory`.
#[derive(Args, Clone, Debug)]
pub struct MigrateArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// SQLite database file (overrides the config file)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl From<MigrateArgs> for StoreArgs {
    fn from(args: MigrateArgs) -> Self {
        Self {
            config: args.config,
            db: args.db,
            in_memory: false,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args, Clone, Debug)]
pub struct CheckKeyArgs {
    #[arg(required = true)]
    pub keys: Vec<String>,
}
