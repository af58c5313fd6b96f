use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StoreError;

/// Fatal sync failures. Every kind aborts the run; batches committed before
/// the failure stay committed, and re-running the same command resumes.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store could not be read before any remote call was made.
    #[error("Failed to load synchronized identifiers from the local store: {0}")]
    SeenSetLoad(#[source] StoreError),

    #[error("Listing page {page} failed: {source}")]
    Listing { page: u64, source: CatalogError },

    /// One item's detail fetch failed, so its whole batch was discarded.
    #[error("Fetching details for {id} failed in batch {batch}: {source}")]
    Resolution {
        batch: u64,
        id: String,
        source: CatalogError,
    },

    /// The resolver's permit pool was closed while a batch was in flight.
    #[error("Fetch permits closed while resolving batch {batch}")]
    PermitsClosed { batch: u64 },

    #[error("Committing batch {batch} ({rows} items) failed: {source}")]
    Commit {
        batch: u64,
        rows: usize,
        source: StoreError,
    },
}

impl SyncError {
    /// Short machine-friendly name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SeenSetLoad(_) => "seen_set_load",
            Self::Listing { .. } => "listing",
            Self::Resolution { .. } => "resolution",
            Self::PermitsClosed { .. } => "permits_closed",
            Self::Commit { .. } => "commit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let e = SyncError::Listing {
            page: 3,
            source: CatalogError::InvalidUrl("x".into()),
        };
        assert_eq!(e.kind(), "listing");
        assert!(e.to_string().starts_with("Listing page 3 failed"));

        let e = SyncError::SeenSetLoad(StoreError::Poisoned);
        assert_eq!(e.kind(), "seen_set_load");
    }

    #[test]
    fn test_source_chain_is_preserved() {
        use std::error::Error as _;
        let e = SyncError::Commit {
            batch: 2,
            rows: 100,
            source: StoreError::Query("disk I/O error".into()),
        };
        assert_eq!(e.kind(), "commit");
        assert!(e.source().unwrap().to_string().contains("disk I/O error"));
    }
}
