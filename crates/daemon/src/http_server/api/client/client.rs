use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use url::Url;

use common::client::{Hashes, PrivateHashSession, PublicHashSession};

use super::error::ApiError;
use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&mut self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Runs a public session against this client's remote and returns
    /// every hash whose signature checks out.
    pub async fn hash_public(&mut self, session: &PublicHashSession) -> Result<Hashes, ApiError> {
        let response = self.call(session.request().clone()).await?;
        Ok(session.verify(&response)?)
    }

    /// Runs a private session against this client's remote and returns
    /// every hash decrypted with the session's ephemeral keys.
    pub async fn hash_private(
        &mut self,
        session: &PrivateHashSession,
    ) -> Result<Hashes, ApiError> {
        let response = self.call(session.request().clone()).await?;
        Ok(session.open(&response)?)
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
