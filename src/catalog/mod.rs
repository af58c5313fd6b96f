//! Remote catalog client: pages through the user's cloud media library and
//! fetches per-item thumbnail payloads.
//!
//! The sync engine only sees the [`RemoteCatalog`] trait; [`HttpCatalog`] is
//! the production implementation over `reqwest`.

mod client;
pub mod error;
pub mod types;

pub use client::HttpCatalog;
pub use error::CatalogError;
pub use types::{MediaKind, MediaPage, MediaSummary, Readiness};

/// Bearer credential for the remote catalog.
///
/// Obtaining and refreshing it happens outside this crate; the value is
/// passed explicitly into every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Remote side of a sync run.
#[async_trait::async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetch one listing page. `cursor` is `None` for the first page.
    async fn list_page(
        &self,
        token: &AccessToken,
        cursor: Option<&str>,
    ) -> Result<MediaPage, CatalogError>;

    /// Fetch the thumbnail/detail payload for one item.
    async fn fetch_detail(&self, token: &AccessToken, id: &str) -> Result<Vec<u8>, CatalogError>;
}
