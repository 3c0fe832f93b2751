//! Package file download
//!
//! Files are fetched one at a time in manifest order. The first failure
//! aborts the whole package, so nothing is written unless every file
//! arrived.

use market_catalog::HttpClient;
use market_meta::{MarketplaceExtension, PackageContent};

use crate::{Error, Result};

/// One fetched package file.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub content: PackageContent,
    pub bytes: Vec<u8>,
}

/// Fetch every file of `extension`.
pub async fn download_package(
    http: &dyn HttpClient,
    extension: &MarketplaceExtension,
) -> Result<Vec<DownloadedFile>> {
    let mut files = Vec::with_capacity(extension.package_contents.len());
    for content in &extension.package_contents {
        let bytes = download_file(http, &content.download_source).await?;
        tracing::debug!(
            extension = %extension.unique_id,
            file = %content.relative_path,
            bytes = bytes.len(),
            "Downloaded package file"
        );
        files.push(DownloadedFile {
            content: content.clone(),
            bytes,
        });
    }
    Ok(files)
}

async fn download_file(http: &dyn HttpClient, url: &str) -> Result<Vec<u8>> {
    let download_error = |reason: String| Error::Download {
        url: url.to_string(),
        reason,
    };

    let response = http
        .get(url)
        .await
        .map_err(|e| download_error(e.to_string()))?;
    if !response.is_success() {
        return Err(download_error(format!("HTTP {}", response.status)));
    }
    if looks_like_markup(&response.body) {
        return Err(download_error(
            "received an HTML page instead of file content".to_string(),
        ));
    }
    Ok(response.body)
}

/// True when the body opens with `<` after optional BOM and whitespace,
/// which is how error and login pages served with a 200 status look.
pub fn looks_like_markup(body: &[u8]) -> bool {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'<')
}
