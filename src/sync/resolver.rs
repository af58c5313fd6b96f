//! Bounded resolver: fetches thumbnail payloads for a batch with a fixed cap
//! on simultaneous remote requests.
//!
//! Each fetch holds one semaphore permit for exactly its own duration; the
//! permit is an RAII guard, so it is returned on success, failure, and panic
//! alike. Resolving a batch joins every fetch before returning, and results
//! are reassembled by input position rather than completion order.

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::error::SyncError;
use crate::catalog::{AccessToken, CatalogError, MediaSummary, RemoteCatalog};
use crate::store::MediaRow;

/// Permit count used when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 11;

enum FetchFailure {
    Detail { id: String, source: CatalogError },
    PermitsClosed,
}

pub struct BoundedResolver<'a> {
    catalog: &'a dyn RemoteCatalog,
    token: &'a AccessToken,
    permits: Semaphore,
    limit: usize,
}

impl<'a> BoundedResolver<'a> {
    pub fn new(catalog: &'a dyn RemoteCatalog, token: &'a AccessToken, concurrency: usize) -> Self {
        let limit = concurrency.max(1);
        Self {
            catalog,
            token,
            permits: Semaphore::new(limit),
            limit,
        }
    }

    /// Resolve every item of batch number `batch`, preserving input order.
    ///
    /// All fetches run to completion even if one fails; the batch then fails
    /// as a whole with the first failure in input order.
    pub async fn resolve(
        &self,
        batch: u64,
        items: Vec<MediaSummary>,
    ) -> Result<Vec<MediaRow>, SyncError> {
        let count = items.len();
        debug!(batch, items = count, limit = self.limit, "Resolving batch");

        let fetches = items.into_iter().map(|summary| self.fetch_one(summary));
        let results = join_all(fetches).await;

        let mut rows = Vec::with_capacity(count);
        let mut first_failure: Option<FetchFailure> = None;
        let mut failures = 0usize;
        for result in results {
            match result {
                Ok(row) => rows.push(row),
                Err(failure) => {
                    failures += 1;
                    first_failure.get_or_insert(failure);
                }
            }
        }

        match first_failure {
            None => Ok(rows),
            Some(failure) => {
                warn!(batch, failures, items = count, "Discarding batch after fetch failure");
                Err(match failure {
                    FetchFailure::Detail { id, source } => SyncError::Resolution { batch, id, source },
                    FetchFailure::PermitsClosed => SyncError::PermitsClosed { batch },
                })
            }
        }
    }

    async fn fetch_one(&self, summary: MediaSummary) -> Result<MediaRow, FetchFailure> {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Err(FetchFailure::PermitsClosed),
        };

        match self.catalog.fetch_detail(self.token, &summary.id).await {
            Ok(thumbnail) => Ok(MediaRow::new(summary, thumbnail)),
            Err(source) => {
                debug!(id = %summary.id, error = %source, "Detail fetch failed");
                Err(FetchFailure::Detail {
                    id: summary.id,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ready, token, FakeCatalog};

    fn items(n: usize) -> Vec<MediaSummary> {
        (0..n).map(|i| ready(&format!("ID{i:03}"))).collect()
    }

    #[tokio::test]
    async fn test_output_order_matches_input_despite_completion_order() {
        // Earlier items finish last.
        let catalog = FakeCatalog::new(Vec::new())
            .delay("ID000", 40)
            .delay("ID001", 20)
            .delay("ID002", 1);
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 3);

        let rows = resolver.resolve(1, items(3)).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["ID000", "ID001", "ID002"]);
        assert_eq!(rows[1].thumbnail(), b"thumb:ID001");
    }

    #[tokio::test]
    async fn test_never_exceeds_permit_cap() {
        let catalog = FakeCatalog::new(Vec::new()).default_delay(3);
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 4);

        let rows = resolver.resolve(1, items(25)).await.unwrap();
        assert_eq!(rows.len(), 25);
        assert_eq!(catalog.fetch_calls(), 25);
        assert!(catalog.max_in_flight() <= 4);
        assert!(catalog.max_in_flight() >= 2, "fetches should overlap");
    }

    #[tokio::test]
    async fn test_failure_fails_whole_batch_after_all_fetches_finish() {
        let catalog = FakeCatalog::new(Vec::new())
            .fail_detail("ID002")
            .fail_detail("ID005");
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 2);

        let err = resolver.resolve(7, items(8)).await.unwrap_err();
        match err {
            SyncError::Resolution { batch, id, .. } => {
                assert_eq!(batch, 7);
                assert_eq!(id, "ID002");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Every fetch was issued and joined; none were dropped mid-flight.
        assert_eq!(catalog.fetch_calls(), 8);
    }

    #[tokio::test]
    async fn test_permit_released_after_failure() {
        // With a single permit, a leaked permit would hang the second fetch.
        let catalog = FakeCatalog::new(Vec::new()).fail_detail("ID000");
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 1);

        assert!(resolver.resolve(1, items(3)).await.is_err());
        assert_eq!(catalog.fetch_calls(), 3);
        assert_eq!(resolver.permits.available_permits(), 1);

        // The resolver stays usable for the next batch.
        let ok = FakeCatalog::new(Vec::new());
        let resolver = BoundedResolver::new(&ok, &token, 1);
        assert_eq!(resolver.resolve(2, items(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped_to_one() {
        let catalog = FakeCatalog::new(Vec::new());
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 0);
        assert_eq!(resolver.resolve(1, items(2)).await.unwrap().len(), 2);
        assert_eq!(catalog.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_closed_permits_fail_batch_without_fetching() {
        let catalog = FakeCatalog::new(Vec::new());
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, 2);
        resolver.permits.close();

        let err = resolver.resolve(4, items(3)).await.unwrap_err();
        assert!(matches!(err, SyncError::PermitsClosed { batch: 4 }));
        assert_eq!(err.kind(), "permits_closed");
        assert_eq!(catalog.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let catalog = FakeCatalog::new(Vec::new());
        let token = token();
        let resolver = BoundedResolver::new(&catalog, &token, DEFAULT_CONCURRENCY);
        assert!(resolver.resolve(1, Vec::new()).await.unwrap().is_empty());
        assert_eq!(catalog.fetch_calls(), 0);
    }
}
