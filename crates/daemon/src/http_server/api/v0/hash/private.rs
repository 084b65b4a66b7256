use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder, Url};

use common::request::{HashPrivateRequest, HashPrivateResponse};

use super::HashError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<HashPrivateRequest>,
) -> Result<Json<HashPrivateResponse>, HashError> {
    tracing::debug!(url = %req.url, roster = req.roster.len(), "leading private hash run");
    let response = state.orchestrator().hash_private(req).await?;
    tracing::info!(
        responses = response.responses.len(),
        missing = response.missing.len(),
        "sealed hashes collected"
    );
    Ok(Json(response))
}

impl ApiRequest for HashPrivateRequest {
    type Response = HashPrivateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/hash/private")?;
        Ok(client.post(full_url).json(&self))
    }
}
