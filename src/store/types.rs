//! Types persisted by the local media store.

use chrono::{DateTime, Utc};

use crate::catalog::{MediaKind, MediaSummary};
use crate::sync::SyncMode;

/// A synchronized media item: its summary plus the thumbnail payload.
///
/// Rows are immutable once built; a later sync that re-fetches the same
/// identifier writes a new row that replaces the stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRow {
    summary: MediaSummary,
    thumbnail: Vec<u8>,
}

impl MediaRow {
    pub fn new(summary: MediaSummary, thumbnail: Vec<u8>) -> Self {
        Self { summary, thumbnail }
    }

    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn summary(&self) -> &MediaSummary {
        &self.summary
    }

    pub fn thumbnail(&self) -> &[u8] {
        &self.thumbnail
    }
}

/// Statistics recorded when a sync run finishes.
#[derive(Debug, Clone, Default)]
pub struct SyncRunStats {
    pub pages_fetched: u64,
    pub items_listed: u64,
    pub items_added: u64,
    /// Stopped early by a shutdown signal.
    pub interrupted: bool,
    /// Set when the run aborted.
    pub error: Option<String>,
}

/// Most recent sync run, as shown by `status`.
#[derive(Debug, Clone)]
pub struct LastRun {
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_added: u64,
    pub interrupted: bool,
    pub error: Option<String>,
}

/// Counts over the whole store.
#[derive(Debug, Clone, Default)]
pub struct StoreSummary {
    pub total: u64,
    pub photos: u64,
    pub videos: u64,
    pub other: u64,
    pub thumbnail_bytes: u64,
    pub last_run: Option<LastRun>,
}

impl StoreSummary {
    pub(crate) fn add_kind(&mut self, kind: MediaKind, count: u64) {
        self.total += count;
        match kind {
            MediaKind::Photo => self.photos += count,
            MediaKind::Video => self.videos += count,
            MediaKind::Other => self.other += count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Readiness;

    #[test]
    fn test_media_row_accessors() {
        let summary = MediaSummary {
            id: "ID1".to_string(),
            captured_at: Utc::now(),
            camera_model: None,
            size_bytes: 10,
            status: Readiness::Ready,
            resolution: "10x10".to_string(),
            duration_secs: None,
            kind: MediaKind::Photo,
            width: 10,
            height: 10,
        };
        let row = MediaRow::new(summary.clone(), vec![1, 2, 3]);
        assert_eq!(row.id(), "ID1");
        assert_eq!(row.summary(), &summary);
        assert_eq!(row.thumbnail(), &[1, 2, 3]);
    }

    #[test]
    fn test_summary_add_kind() {
        let mut s = StoreSummary::default();
        s.add_kind(MediaKind::Photo, 3);
        s.add_kind(MediaKind::Video, 2);
        s.add_kind(MediaKind::Other, 1);
        assert_eq!((s.total, s.photos, s.videos, s.other), (6, 3, 2, 1));
    }
}
