use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::fetch::{FetchError, Fetcher, Resource};

/// Serves canned resources and failures keyed by exact URL.
///
/// Unknown URLs answer as a 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, Result<Resource, FetchError>>,
    delay: Option<Duration>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(
        mut self,
        url: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let url = url.into();
        let resource = Resource {
            url: url.clone(),
            content_type: content_type.into(),
            data: data.into(),
        };
        self.resources.insert(url, Ok(resource));
        self
    }

    pub fn with_html(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.with_resource(url, "text/html; charset=utf-8", body)
    }

    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.resources.insert(url.into(), Err(error));
        self
    }

    /// Delays every fetch, e.g. to outlast a protocol timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.resources
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::NonOkStatus(404)))
    }
}
