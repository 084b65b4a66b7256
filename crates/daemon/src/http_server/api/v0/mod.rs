use axum::Router;

pub mod hash;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/hash", hash::router(state.clone()))
        .with_state(state)
}
