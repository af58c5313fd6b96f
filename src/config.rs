use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::AccessToken;
use crate::cli::{StoreArgs, SyncArgs};
use crate::sync::{SyncConfig, SyncMode};

/// File name of the library database inside the data directory.
const DB_FILE_NAME: &str = "library.db";

/// Validated configuration for a `sync` or `resync` run.
pub struct Config {
    pub data_dir: PathBuf,
    pub api_url: String,
    pub token: AccessToken,
    pub request_timeout: Duration,
    pub concurrency: usize,
    pub batch_size: usize,
    pub page_size: u32,
    pub mode: SyncMode,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("mode", &self.mode)
            .field("concurrency", &self.concurrency)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Data directory named by the command line, with `~` expanded.
pub fn data_dir(args: &StoreArgs) -> PathBuf {
    expand_tilde(&args.data_dir)
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

impl Config {
    pub fn from_sync_args(args: SyncArgs, mode: SyncMode) -> anyhow::Result<Self> {
        if args.token.trim().is_empty() {
            anyhow::bail!("--token must not be empty");
        }
        if args.api_url.trim().is_empty() {
            anyhow::bail!("--api-url must not be empty");
        }
        if args.concurrency == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }
        if args.batch_size == 0 {
            anyhow::bail!("--batch-size must be at least 1");
        }
        if args.page_size == 0 {
            anyhow::bail!("--page-size must be at least 1");
        }
        if args.request_timeout == 0 {
            anyhow::bail!("--request-timeout must be at least 1 second");
        }

        Ok(Self {
            data_dir: data_dir(&args.store),
            api_url: args.api_url,
            token: AccessToken::new(args.token),
            request_timeout: Duration::from_secs(args.request_timeout),
            concurrency: args.concurrency,
            batch_size: args.batch_size,
            page_size: args.page_size,
            mode,
            no_progress_bar: args.no_progress_bar,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        db_path(&self.data_dir)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            mode: self.mode,
            token: self.token.clone(),
            concurrency: self.concurrency,
            batch_size: self.batch_size,
            no_progress_bar: self.no_progress_bar,
        }
    }
}
