//! How a node reads the web
//!
//! `http` and `https` URLs must answer `200 OK`. `file` URLs are resolved
//! under a configured root directory and may not escape it. Either way the
//! body is only accepted if its media type matches [`SUPPORTED_CONTENT_TYPES`].

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

use common::fetch::{FetchError, Fetcher, Resource};

/// Media types a node is willing to hash
pub const SUPPORTED_CONTENT_TYPES: &str = "html|image|css";

#[derive(Debug, thiserror::Error)]
pub enum FetcherSetupError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid content type pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    file_root: PathBuf,
    content_types: Regex,
}

impl HttpFetcher {
    pub fn new(file_root: PathBuf) -> Result<Self, FetcherSetupError> {
        Ok(Self {
            client: Client::builder().build()?,
            file_root,
            content_types: Regex::new(SUPPORTED_CONTENT_TYPES)?,
        })
    }

    async fn fetch_http(&self, url: Url) -> Result<(String, Vec<u8>), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::NonOkStatus(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok((content_type, body.to_vec()))
    }

    async fn fetch_file(&self, url: &Url) -> Result<(String, Vec<u8>), FetchError> {
        // decodes the percent-encoded path before confinement is checked
        let local = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let path = self.resolve(&local)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NonOkStatus(404))
            }
            Err(e) => return Err(FetchError::Io(e.to_string())),
        };
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        Ok((content_type, data))
    }

    /// Maps the decoded path of a `file://` URL to a path under `file_root`.
    fn resolve(&self, local: &Path) -> Result<PathBuf, FetchError> {
        let mut resolved = self.file_root.clone();
        for component in local.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                _ => return Err(FetchError::PathTraversal(local.display().to_string())),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let (content_type, data) = match parsed.scheme() {
            "http" | "https" => self.fetch_http(parsed).await?,
            "file" => self.fetch_file(&parsed).await?,
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        };

        if !self.content_types.is_match(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        tracing::debug!(url, content_type = %content_type, bytes = data.len(), "fetched");
        Ok(Resource {
            url: url.to_string(),
            content_type,
            data,
        })
    }
}
