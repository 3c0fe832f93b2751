//! Catalog access for the extension marketplace client
//!
//! [`CatalogCache`] fetches the remote [`CatalogManifest`](market_meta::CatalogManifest)
//! through an injected [`HttpClient`], keeps it for a configured TTL, and
//! falls back to the last good copy when a refetch fails.

pub mod cache;
pub mod error;
pub mod filter;
pub mod http;
pub mod validate;

pub use cache::{CacheStatus, CatalogCache};
pub use error::{CatalogError, Result};
pub use filter::SearchFilter;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use validate::parse_catalog;
