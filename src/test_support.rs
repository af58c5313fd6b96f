//! Fixtures shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;

use crate::catalog::{
    AccessToken, CatalogError, MediaKind, MediaPage, MediaSummary, Readiness, RemoteCatalog,
};

pub(crate) fn summary(id: &str, status: Readiness) -> MediaSummary {
    MediaSummary {
        id: id.to_string(),
        captured_at: Utc::now(),
        camera_model: Some("Test Camera".to_string()),
        size_bytes: 1024,
        status,
        resolution: "4032x3024".to_string(),
        duration_secs: None,
        kind: MediaKind::Photo,
        width: 4032,
        height: 3024,
    }
}

pub(crate) fn ready(id: &str) -> MediaSummary {
    summary(id, Readiness::Ready)
}

pub(crate) fn video(id: &str, duration_secs: f64) -> MediaSummary {
    MediaSummary {
        kind: MediaKind::Video,
        duration_secs: Some(duration_secs),
        resolution: "1920x1080".to_string(),
        width: 1920,
        height: 1080,
        ..summary(id, Readiness::Ready)
    }
}

pub(crate) fn token() -> AccessToken {
    AccessToken::new("test-token")
}

/// In-memory catalog serving fixed pages. The cursor is the next page index.
///
/// Records listing calls and tracks how many detail fetches are in flight.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pages: Vec<Vec<MediaSummary>>,
    failing_page: Option<usize>,
    failing_ids: HashSet<String>,
    delays_ms: HashMap<String, u64>,
    default_delay_ms: u64,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn new(pages: Vec<Vec<MediaSummary>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub(crate) fn fail_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    pub(crate) fn fail_detail(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub(crate) fn delay(mut self, id: &str, ms: u64) -> Self {
        self.delays_ms.insert(id.to_string(), ms);
        self
    }

    pub(crate) fn default_delay(mut self, ms: u64) -> Self {
        self.default_delay_ms = ms;
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteCatalog for FakeCatalog {
    async fn list_page(
        &self,
        _token: &AccessToken,
        cursor: Option<&str>,
    ) -> Result<MediaPage, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        if self.failing_page == Some(index) {
            return Err(CatalogError::HttpStatus {
                status: 500,
                url: format!("fake://media?cursor={index}"),
            });
        }
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
        Ok(MediaPage { items, next_cursor })
    }

    async fn fetch_detail(&self, _token: &AccessToken, id: &str) -> Result<Vec<u8>, CatalogError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays_ms
            .get(id)
            .copied()
            .unwrap_or(self.default_delay_ms);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing_ids.contains(id) {
            return Err(CatalogError::HttpStatus {
                status: 502,
                url: format!("fake://media/{id}/thumbnail"),
            });
        }
        Ok(format!("thumb:{id}").into_bytes())
    }
}
