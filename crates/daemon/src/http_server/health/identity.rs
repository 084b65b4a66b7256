use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use crate::ServiceState;

/// The roster entry other servers and clients need to reach this node
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    (StatusCode::OK, Json(state.identity())).into_response()
}
