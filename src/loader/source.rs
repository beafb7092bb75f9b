//! Data sources behind the fallback chain.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::models::{ContentQuery, Source};
use crate::utils::http::{fetch_json, parse_json_body, with_deadline};
use crate::utils::{endpoint, is_http_url};

/// One tier of the fallback chain.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Which tier this source reports as.
    fn tier(&self) -> Source;

    /// Fetch the raw JSON document for a query.
    async fn fetch(&self, query: &ContentQuery) -> Result<Value>;
}

/// The backend content API.
#[derive(Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Kind route with filters encoded as query parameters.
    pub fn request_url(&self, query: &ContentQuery) -> Result<Url> {
        let mut url = endpoint(&self.base_url, query.kind.remote_path())?;
        if !query.filters.is_empty() {
            url.query_pairs_mut().extend_pairs(query.filters.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for RemoteSource {
    fn tier(&self) -> Source {
        Source::Remote
    }

    async fn fetch(&self, query: &ContentQuery) -> Result<Value> {
        let url = self.request_url(query)?;
        log::debug!("GET {url}");
        fetch_json(&self.client, url, query.timeout).await
    }
}

/// Where static fallback assets live.
#[derive(Clone, Debug)]
pub enum StaticRoot {
    /// Served over HTTP next to the application
    Http(String),
    /// Bundled on the local filesystem
    Dir(PathBuf),
}

impl StaticRoot {
    /// `http(s)://` bases are served; anything else is a directory.
    pub fn parse(base: &str) -> Self {
        if is_http_url(base) {
            StaticRoot::Http(base.to_string())
        } else {
            StaticRoot::Dir(PathBuf::from(base))
        }
    }
}

/// Flat per-kind fallback datasets. Filters are never applied here.
#[derive(Clone)]
pub struct StaticAssetSource {
    client: reqwest::Client,
    root: StaticRoot,
}

impl StaticAssetSource {
    pub fn new(client: reqwest::Client, root: StaticRoot) -> Self {
        Self { client, root }
    }

    async fn read_file(path: PathBuf) -> Result<Value> {
        let bytes = tokio::fs::read(&path).await?;
        parse_json_body(&path.display().to_string(), &bytes)
    }
}

#[async_trait]
impl ContentSource for StaticAssetSource {
    fn tier(&self) -> Source {
        Source::StaticAsset
    }

    async fn fetch(&self, query: &ContentQuery) -> Result<Value> {
        let asset = query.kind.static_path();
        match &self.root {
            StaticRoot::Http(base) => {
                let url = endpoint(base, asset)?;
                log::debug!("GET {url} (static)");
                fetch_json(&self.client, url, query.timeout).await
            }
            StaticRoot::Dir(dir) => {
                let path = dir.join(asset.trim_start_matches('/'));
                log::debug!("Reading static asset {}", path.display());
                let label = path.display().to_string();
                with_deadline(&label, query.timeout, Self::read_file(path)).await
            }
        }
    }
}
