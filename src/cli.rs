use clap::{Args, Parser, Subcommand};

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "mediamirror",
    version,
    about = "Mirror a remote media catalog into a local SQLite library"
)]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add new items, stopping once a listing page has nothing new
    Sync(SyncArgs),

    /// List the whole remote catalog and add anything missing
    Resync(SyncArgs),

    /// Show library counts and the last sync run
    Status(StoreArgs),

    /// Print every stored item, newest first
    List(ListArgs),

    /// Write a stored thumbnail to a file
    Thumbnail(ThumbnailArgs),

    /// Delete the local library database
    ResetState(ResetStateArgs),
}

/// Location of the local library, shared by every command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding the library database
    #[arg(long, env = "MEDIAMIRROR_DATA_DIR", default_value = "~/.mediamirror")]
    pub data_dir: String,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Bearer token for the remote catalog.
    /// WARNING: passing via --token is visible in process listings.
    /// Prefer the MEDIAMIRROR_TOKEN environment variable instead.
    #[arg(long, env = "MEDIAMIRROR_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Base URL of the remote catalog API
    #[arg(long, env = "MEDIAMIRROR_API_URL")]
    pub api_url: String,

    /// Maximum simultaneous detail fetches
    #[arg(long, default_value_t = crate::sync::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Items written to the library per transaction
    #[arg(long, default_value_t = crate::sync::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Items requested per listing page
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub request_timeout: u64,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Identifier of the stored item
    pub id: String,

    /// File to write the thumbnail to
    #[arg(short, long)]
    pub output: String,
}

#[derive(Args, Debug)]
pub struct ResetStateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}
