// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::gateway_handler;
use super::middleware::request_id_layers;
use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

pub fn create_router(config: &AppConfig, gateway: Gateway) -> Result<Router> {
    let body_limit = config.server.max_body_bytes;
    let state = AppState {
        gateway: Arc::new(gateway),
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    // Routing happens in the gateway mux, so everything goes to the fallback.
    let app = Router::new()
        .fallback(gateway_handler)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
