// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::GatewayError;
use axum::extract::{Request, State};
use axum::response::Response;

/// Catch-all handler: every request is routed through the gateway mux.
pub async fn gateway_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, GatewayError> {
    state.gateway.forward(req).await
}
