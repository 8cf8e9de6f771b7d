//! Source byte resolution.
//!
//! A document location is either a local filesystem path or an `http(s)`
//! URL. Fetching yields the raw bytes handed to the document layer; any
//! failure to obtain them (network error, non-2xx response, filesystem
//! read error) maps to [`FolioError::SourceUnavailable`].

use crate::config::HttpConfig;
use crate::error::{FolioError, Result};
use std::time::Duration;

/// Whether a location should be fetched over HTTP rather than read from disk.
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Fetch the raw bytes for a location.
pub async fn fetch_bytes(location: &str, http: &HttpConfig) -> Result<Vec<u8>> {
    if is_url(location) {
        fetch_url(location, http).await
    } else {
        tokio::fs::read(location).await.map_err(|e| {
            FolioError::source_unavailable_with(format!("Failed to read '{}'", location), e)
        })
    }
}

async fn fetch_url(url: &str, http: &HttpConfig) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .build()
        .map_err(|e| {
            FolioError::source_unavailable_with("Failed to create HTTP client", e)
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        FolioError::source_unavailable_with(format!("Request to '{}' failed", url), e)
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FolioError::source_unavailable(format!(
            "Request to '{}' returned HTTP {}",
            url, status
        )));
    }

    let bytes = response.bytes().await.map_err(|e| {
        FolioError::source_unavailable_with(format!("Failed to read body from '{}'", url), e)
    })?;

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("http://example.com/a.pdf"));
        assert!(is_url("https://example.com/a.pdf"));
        assert!(!is_url("/tmp/a.pdf"));
        assert!(!is_url("relative/a.pdf"));
        assert!(!is_url("ftp://example.com/a.pdf"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_source_unavailable() {
        let result = fetch_bytes("/nonexistent/folio/file.pdf", &HttpConfig::default()).await;
        match result {
            Err(FolioError::SourceUnavailable { message, .. }) => {
                assert!(message.contains("/nonexistent/folio/file.pdf"));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.bin");
        std::fs::write(&path, b"hello").unwrap();

        let bytes = fetch_bytes(path.to_str().unwrap(), &HttpConfig::default())
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_url_is_source_unavailable() {
        // Reserved TEST-NET-1 address, nothing listens there.
        let http = HttpConfig { timeout_secs: 1 };
        let result = fetch_bytes("http://192.0.2.1/doc.pdf", &http).await;
        assert!(matches!(
            result,
            Err(FolioError::SourceUnavailable { .. })
        ));
    }
}
