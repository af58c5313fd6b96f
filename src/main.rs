//! mediamirror: keeps a local SQLite library in step with a remote media
//! catalog.
//!
//! A sync lists the catalog page by page, picks out items that are ready and
//! not yet stored, fetches their thumbnails with a bounded number of parallel
//! requests, and commits them in fixed-size batches. Any failure aborts the
//! run; re-running resumes after the last committed batch.

#![warn(clippy::all)]

mod catalog;
mod cli;
mod config;
mod shutdown;
mod store;
mod sync;
mod types;

#[cfg(test)]
mod test_support;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog::HttpCatalog;
use cli::Command;
use store::{LocalStore, SqliteStore};
use sync::SyncMode;

/// Run `sync` or `resync`.
async fn run_sync_command(args: cli::SyncArgs, mode: SyncMode) -> anyhow::Result<()> {
    let config = config::Config::from_sync_args(args, mode)?;
    tracing::debug!(?config, "Resolved configuration");

    tokio::fs::create_dir_all(&config.data_dir).await?;
    let store = SqliteStore::open(&config.db_path()).await?;
    let catalog = HttpCatalog::new(&config.api_url, config.page_size, config.request_timeout)?;
    tracing::info!(
        mode = %config.mode,
        concurrency = config.concurrency,
        batch_size = config.batch_size,
        library = %store.path().display(),
        "Starting mediamirror"
    );

    let shutdown_token = shutdown::install_signal_handler()?;
    let report = sync::run_sync(&catalog, &store, &config.sync_config(), shutdown_token).await?;

    println!("{} new items", report.items_added);
    if report.interrupted {
        println!("Interrupted before completion. Run the same command again to continue.");
    }
    Ok(())
}

/// Open the library for a read-only command, or `None` if no sync has
/// created it yet.
async fn open_existing(db_path: &Path) -> anyhow::Result<Option<SqliteStore>> {
    if !db_path.exists() {
        println!("No library database found at {}", db_path.display());
        println!("Run a sync first to create the database.");
        return Ok(None);
    }
    Ok(Some(SqliteStore::open(db_path).await?))
}

/// Run the status command.
async fn run_status(args: cli::StoreArgs) -> anyhow::Result<()> {
    let db_path = config::db_path(&config::data_dir(&args));
    let Some(store) = open_existing(&db_path).await? else {
        return Ok(());
    };
    let summary = store.get_summary().await?;

    println!("Library: {}", db_path.display());
    println!();
    println!("Items:");
    println!("  Total:      {}", summary.total);
    println!("  Photos:     {}", summary.photos);
    println!("  Videos:     {}", summary.videos);
    println!("  Other:      {}", summary.other);
    println!("  Thumbnails: {} bytes", summary.thumbnail_bytes);

    if let Some(run) = &summary.last_run {
        println!();
        println!(
            "Last {} sync started:   {}",
            run.mode,
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        match &run.completed_at {
            Some(completed) => println!(
                "Last {} sync completed: {}",
                run.mode,
                completed.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("Last {} sync did not complete", run.mode),
        }
        println!("  Added: {}", run.items_added);
        if run.interrupted {
            println!("  Interrupted by shutdown");
        }
        if let Some(error) = &run.error {
            println!("  Failed: {}", error);
        }
    }

    Ok(())
}

/// Run the list command.
async fn run_list(args: cli::ListArgs) -> anyhow::Result<()> {
    let db_path = config::db_path(&config::data_dir(&args.store));
    let Some(store) = open_existing(&db_path).await? else {
        return Ok(());
    };
    let media = store.load_all_media().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&media)?);
        return Ok(());
    }

    for item in &media {
        println!(
            "{}  {}  {:<5}  {:>10}  {}{}",
            item.captured_at.format("%Y-%m-%d %H:%M:%S"),
            item.id,
            item.kind.as_str(),
            item.size_bytes,
            item.resolution,
            item.camera_model
                .as_deref()
                .map(|m| format!("  {m}"))
                .unwrap_or_default(),
        );
    }
    println!("{} items", media.len());
    Ok(())
}

/// Run the thumbnail command.
async fn run_thumbnail(args: cli::ThumbnailArgs) -> anyhow::Result<()> {
    let db_path = config::db_path(&config::data_dir(&args.store));
    let Some(store) = open_existing(&db_path).await? else {
        return Ok(());
    };

    let Some(bytes) = store.load_thumbnail(&args.id).await? else {
        anyhow::bail!("No stored item with id {}", args.id);
    };
    tokio::fs::write(&args.output, &bytes).await?;
    println!("Wrote {} bytes to {}", bytes.len(), args.output);
    Ok(())
}

/// Run the reset-state command.
async fn run_reset_state(args: cli::ResetStateArgs) -> anyhow::Result<()> {
    let db_path = config::db_path(&config::data_dir(&args.store));

    if !db_path.exists() {
        println!("No library database found at {}", db_path.display());
        return Ok(());
    }

    if !args.yes {
        println!("This will delete the library database at:");
        println!("  {}", db_path.display());
        println!();
        print!("Are you sure? [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    std::fs::remove_file(&db_path)?;
    println!("Library database deleted.");

    let wal_path = db_path.with_extension("db-wal");
    let shm_path = db_path.with_extension("db-shm");
    let _ = std::fs::remove_file(&wal_path);
    let _ = std::fs::remove_file(&shm_path);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    match cli.command {
        Command::Sync(args) => run_sync_command(args, SyncMode::Incremental).await,
        Command::Resync(args) => run_sync_command(args, SyncMode::Full).await,
        Command::Status(args) => run_status(args).await,
        Command::List(args) => run_list(args).await,
        Command::Thumbnail(args) => run_thumbnail(args).await,
        Command::ResetState(args) => run_reset_state(args).await,
    }
}
