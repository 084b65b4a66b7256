use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http::StatusCode;

use common::protocol::ProtocolError;

pub mod private;
pub mod public;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/public", post(public::handler))
        .route("/private", post(private::handler))
        .with_state(state)
}

/// A protocol run this node led that did not produce an answer
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HashError(#[from] pub ProtocolError);

impl HashError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ProtocolError::Configuration(_) | ProtocolError::TreeConstruction(_) => {
                StatusCode::BAD_REQUEST
            }
            ProtocolError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProtocolError::Insufficient { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HashError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("hash request failed: {}", self.0);
        } else {
            tracing::info!("hash request rejected: {}", self.0);
        }
        let msg = serde_json::json!({"msg": self.0.to_string()});
        (status, Json(msg)).into_response()
    }
}
