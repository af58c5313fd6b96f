use std::time::Duration;

use reqwest::{Client, Response, Url};
use tracing::debug;

use super::error::CatalogError;
use super::types::MediaPage;
use super::{AccessToken, RemoteCatalog};

/// `reqwest`-backed catalog client.
///
/// Endpoints, relative to `api_url`:
/// - `GET media?pageSize=N[&cursor=C]` → JSON [`MediaPage`]
/// - `GET media/{id}/thumbnail` → raw thumbnail bytes
pub struct HttpCatalog {
    client: Client,
    api_url: Url,
    page_size: u32,
}

impl std::fmt::Debug for HttpCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalog")
            .field("api_url", &self.api_url.as_str())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl HttpCatalog {
    /// Build a client for `api_url`. `timeout` bounds each individual request;
    /// there is no other timeout on remote calls.
    pub fn new(api_url: &str, page_size: u32, timeout: Duration) -> Result<Self, CatalogError> {
        let parsed =
            Url::parse(api_url).map_err(|_| CatalogError::InvalidUrl(api_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidUrl(api_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mediamirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CatalogError::Http {
                url: api_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            api_url: parsed,
            page_size,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn list_url(&self, cursor: Option<&str>) -> Url {
        let mut url = self.endpoint(&["media"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        url
    }

    fn thumbnail_url(&self, id: &str) -> Url {
        self.endpoint(&["media", id, "thumbnail"])
    }

    async fn get(&self, token: &AccessToken, url: Url) -> Result<Response, CatalogError> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|source| CatalogError::Http {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
                url: url_str,
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn list_page(
        &self,
        token: &AccessToken,
        cursor: Option<&str>,
    ) -> Result<MediaPage, CatalogError> {
        let url = self.list_url(cursor);
        let url_str = url.to_string();
        debug!(url = %url_str, "Listing catalog page");

        let page: MediaPage = self
            .get(token, url)
            .await?
            .json()
            .await
            .map_err(|source| CatalogError::Http {
                url: url_str,
                source,
            })?;

        debug!(
            items = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "Catalog page received"
        );
        Ok(page)
    }

    async fn fetch_detail(&self, token: &AccessToken, id: &str) -> Result<Vec<u8>, CatalogError> {
        let url = self.thumbnail_url(id);
        let url_str = url.to_string();
        let bytes = self
            .get(token, url)
            .await?
            .bytes()
            .await
            .map_err(|source| CatalogError::Http {
                url: url_str,
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(api_url: &str) -> HttpCatalog {
        HttpCatalog::new(api_url, 50, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_list_url_first_page() {
        let c = catalog("https://api.example.com/v1");
        assert_eq!(
            c.list_url(None).as_str(),
            "https://api.example.com/v1/media?pageSize=50"
        );
    }

    #[test]
    fn test_list_url_with_cursor_and_trailing_slash() {
        let c = catalog("https://api.example.com/v1/");
        assert_eq!(
            c.list_url(Some("abc=")).as_str(),
            "https://api.example.com/v1/media?pageSize=50&cursor=abc%3D"
        );
    }

    #[test]
    fn test_thumbnail_url_escapes_id() {
        let c = catalog("https://api.example.com/v1");
        assert_eq!(
            c.thumbnail_url("a/b").as_str(),
            "https://api.example.com/v1/media/a%2Fb/thumbnail"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            HttpCatalog::new("mailto:someone@example.com", 10, Duration::from_secs(1)),
            Err(CatalogError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpCatalog::new("not a url", 10, Duration::from_secs(1)),
            Err(CatalogError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_debug_omits_client_internals() {
        let c = catalog("https://api.example.com/v1");
        let printed = format!("{:?}", c);
        assert!(printed.contains("api.example.com"));
        assert!(printed.contains("page_size: 50"));
    }
}
