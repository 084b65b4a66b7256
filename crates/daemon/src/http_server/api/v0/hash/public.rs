use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder, Url};

use common::request::{HashPublicRequest, HashPublicResponse};

use super::HashError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<HashPublicRequest>,
) -> Result<Json<HashPublicResponse>, HashError> {
    tracing::debug!(url = %req.url, roster = req.roster.len(), "leading public hash run");
    let response = state.orchestrator().hash_public(req).await?;
    tracing::info!(
        responses = response.responses.len(),
        missing = response.missing.len(),
        "public hashes collected"
    );
    Ok(Json(response))
}

impl ApiRequest for HashPublicRequest {
    type Response = HashPublicResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/hash/public")?;
        Ok(client.post(full_url).json(&self))
    }
}
