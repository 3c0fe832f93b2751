//! HTTP GET capability
//!
//! The catalog cache and the package downloader only ever need a plain GET
//! that yields a status code and a body. [`HttpClient`] is that boundary;
//! [`ReqwestClient`] is the production implementation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{CatalogError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A completed HTTP exchange. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body, or a [`CatalogError::Status`] for non-2xx responses.
    pub fn into_success(self, url: &str) -> Result<Vec<u8>> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(CatalogError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Fetch a URL.
///
/// Implementations return `Err` only when no response was obtained at all;
/// timeouts are reported the same way as any other transport failure.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// `reqwest`-backed client with a fixed timeout.
///
/// `file://` URLs are served from the local filesystem with status 200, or
/// 404 when the file does not exist.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("extension-market/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get_file(&self, url: &str, path: PathBuf) -> Result<HttpResponse> {
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(HttpResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(HttpResponse::with_status(404, Vec::new()))
            }
            Err(e) => Err(CatalogError::request(url, e)),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        if let Some(path) = file_url_path(url)? {
            tracing::debug!(%url, "Reading local source");
            return self.get_file(url, path).await;
        }

        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::request(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::request(url, e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Local path for a `file://` URL, or `None` for any other scheme.
///
/// Percent-escapes are decoded. A `file://` URL naming a remote host is an
/// error rather than a path.
pub fn file_url_path(url: &str) -> Result<Option<PathBuf>> {
    let Ok(parsed) = Url::parse(url) else {
        return Ok(None);
    };
    if parsed.scheme() != "file" {
        return Ok(None);
    }
    parsed
        .to_file_path()
        .map(Some)
        .map_err(|()| CatalogError::request(url, "not a local file path"))
}
