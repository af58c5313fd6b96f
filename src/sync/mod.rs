//! Sync engine: mirrors new remote media into the local store.
//!
//! One run goes `Idle → LoadingSeenSet → Listing → (Resolving → Committing)*
//! → Done`, or to `Aborted` on the first fatal error. Batches are processed
//! one at a time; within a batch, detail fetches run in parallel under a
//! shared permit cap. Nothing is retried inside a run. Re-running the same
//! command is the recovery path, and it is safe because every committed
//! batch is excluded by the next run's seen set.

pub mod committer;
pub mod error;
pub mod filter;
pub mod listing;
pub mod resolver;
pub mod seen;

pub use committer::DEFAULT_BATCH_SIZE;
pub use error::SyncError;
pub use resolver::DEFAULT_CONCURRENCY;

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::{AccessToken, MediaSummary, RemoteCatalog};
use crate::store::{LocalStore, SyncRunStats};
use committer::{BatchCommitter, BatchQueue};
use listing::ListingDriver;
use resolver::BoundedResolver;
use seen::SeenSet;

/// How far a run lists the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop listing after the first page with nothing eligible on it.
    /// Relies on the remote listing newest-first with stable paging.
    Incremental,
    /// List every page regardless of what is already stored.
    Full,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "incremental" => Some(Self::Incremental),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Whether the listing should request the page after `page`.
    pub fn should_continue(&self, page: &[MediaSummary], seen: &SeenSet) -> bool {
        match self {
            Self::Full => true,
            Self::Incremental => page.iter().any(|item| filter::is_eligible(item, seen)),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subset of application config consumed by the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub token: AccessToken,
    pub concurrency: usize,
    pub batch_size: usize,
    pub no_progress_bar: bool,
}

/// Outcome of a successful (possibly interrupted) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub pages_fetched: u64,
    pub items_listed: u64,
    pub items_eligible: u64,
    /// Newly synchronized items.
    pub items_added: u64,
    pub batches_committed: u64,
    /// A shutdown signal stopped the run between batches.
    pub interrupted: bool,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            pages_fetched: 0,
            items_listed: 0,
            items_eligible: 0,
            items_added: 0,
            batches_committed: 0,
            interrupted: false,
        }
    }

    fn run_stats(&self, error: Option<&SyncError>) -> SyncRunStats {
        SyncRunStats {
            pages_fetched: self.pages_fetched,
            items_listed: self.items_listed,
            items_added: self.items_added,
            interrupted: self.interrupted,
            error: error.map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    Idle,
    LoadingSeenSet,
    Listing,
    Resolving,
    Committing,
    Done,
    Aborted,
}

fn enter(phase: &mut SyncPhase, next: SyncPhase) {
    debug!(from = ?*phase, to = ?next, "Sync phase");
    *phase = next;
}

/// Progress bar counting committed items. Hidden when stdout is not a TTY
/// or the user asked for no progress bar.
fn create_progress_bar(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}

/// Run one sync in `config.mode`.
///
/// The run is recorded in the store's run history on a best-effort basis;
/// bookkeeping failures are logged and never change the outcome.
pub async fn run_sync(
    catalog: &dyn RemoteCatalog,
    store: &dyn LocalStore,
    config: &SyncConfig,
    shutdown_token: CancellationToken,
) -> Result<SyncReport, SyncError> {
    let started = Instant::now();
    let mut report = SyncReport::new(config.mode);
    let pb = create_progress_bar(config.no_progress_bar);

    let run_id = match store.start_sync_run(config.mode).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Could not record sync run start");
            None
        }
    };

    let mut phase = SyncPhase::Idle;
    let result = drive(
        catalog,
        store,
        config,
        &shutdown_token,
        &mut report,
        &mut phase,
        &pb,
    )
    .await;
    pb.finish_and_clear();

    match &result {
        Ok(()) => enter(&mut phase, SyncPhase::Done),
        Err(e) => {
            enter(&mut phase, SyncPhase::Aborted);
            error!(kind = e.kind(), "Sync aborted: {}", e);
        }
    }

    if let Some(run_id) = run_id {
        let stats = report.run_stats(result.as_ref().err());
        if let Err(e) = store.complete_sync_run(run_id, &stats).await {
            warn!(run_id, error = %e, "Could not record sync run completion");
        }
    }

    result?;

    info!("── Summary ({} sync) ──", report.mode);
    info!(
        "  {} new, {} eligible, {} listed across {} pages",
        report.items_added, report.items_eligible, report.items_listed, report.pages_fetched
    );
    info!("  {} batches committed", report.batches_committed);
    if report.interrupted {
        info!("  interrupted by shutdown; re-run to continue");
    }
    info!("  elapsed: {}", format_duration(started.elapsed()));

    Ok(report)
}

async fn drive(
    catalog: &dyn RemoteCatalog,
    store: &dyn LocalStore,
    config: &SyncConfig,
    shutdown_token: &CancellationToken,
    report: &mut SyncReport,
    phase: &mut SyncPhase,
    pb: &ProgressBar,
) -> Result<(), SyncError> {
    enter(phase, SyncPhase::LoadingSeenSet);
    let seen = seen::load_seen_set(store).await?;
    info!(mode = %config.mode, known = seen.len(), "Starting sync");

    let mode = config.mode;
    let mut listing = ListingDriver::new(catalog, &config.token, |page: &[MediaSummary]| {
        mode.should_continue(page, &seen)
    });
    let resolver = BoundedResolver::new(catalog, &config.token, config.concurrency);
    let mut committer = BatchCommitter::new(store);
    let mut queue = BatchQueue::new(config.batch_size);

    'listing: loop {
        if shutdown_token.is_cancelled() {
            report.interrupted = true;
            break;
        }

        enter(phase, SyncPhase::Listing);
        let page_number = listing.pages_fetched() + 1;
        let page = listing
            .next_page()
            .await
            .map_err(|source| SyncError::Listing {
                page: page_number,
                source,
            })?;
        let Some(page) = page else {
            break;
        };
        report.pages_fetched = listing.pages_fetched();
        report.items_listed += page.len() as u64;

        for item in filter::eligible(page, &seen) {
            if queue.push(item) {
                report.items_eligible += 1;
            }
        }

        loop {
            if shutdown_token.is_cancelled() {
                report.interrupted = true;
                break 'listing;
            }
            let Some(batch) = queue.next_full_batch() else {
                break;
            };
            process_batch(&resolver, &mut committer, batch, phase, pb).await?;
            report.items_added = committer.rows_committed();
            report.batches_committed = committer.batches_committed();
        }
    }

    if report.interrupted {
        pb.suspend(|| {
            info!(
                batches = committer.batches_committed(),
                items = committer.rows_committed(),
                pending = report.items_eligible.saturating_sub(committer.rows_committed()),
                "Shutdown requested, stopping before the next batch"
            )
        });
        return Ok(());
    }

    if let Some(batch) = queue.take_remainder() {
        process_batch(&resolver, &mut committer, batch, phase, pb).await?;
        report.items_added = committer.rows_committed();
        report.batches_committed = committer.batches_committed();
    }

    Ok(())
}

async fn process_batch(
    resolver: &BoundedResolver<'_>,
    committer: &mut BatchCommitter<'_>,
    batch: Vec<MediaSummary>,
    phase: &mut SyncPhase,
    pb: &ProgressBar,
) -> Result<(), SyncError> {
    let number = committer.next_batch_number();
    pb.inc_length(batch.len() as u64);
    pb.set_message(format!("batch {number}"));

    enter(phase, SyncPhase::Resolving);
    let rows = resolver.resolve(number, batch).await?;

    enter(phase, SyncPhase::Committing);
    let committed = committer.commit(rows).await?;
    pb.inc(committed as u64);
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
