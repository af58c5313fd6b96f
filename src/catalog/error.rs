use thiserror::Error;

/// Failures talking to the remote catalog.
///
/// None of these are retried inside a sync run; the orchestrator wraps them
/// into the matching `SyncError` kind and aborts.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Invalid catalog URL '{0}'")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let e = CatalogError::HttpStatus {
            status: 503,
            url: "https://api.example.com/media".into(),
        };
        assert_eq!(
            e.to_string(),
            "HTTP error 503 from https://api.example.com/media"
        );
    }

    #[test]
    fn test_invalid_url_display() {
        let e = CatalogError::InvalidUrl("not a url".into());
        assert!(e.to_string().contains("not a url"));
    }
}
