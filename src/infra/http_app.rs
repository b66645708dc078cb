use axum::{
    routing::{any_service, get},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::twitter::{TwitterRouter, TwitterSvc};

/// `/healthz` plus streamable MCP at `/mcp`.
pub fn build_app(
    factory: impl Fn() -> (TwitterSvc, TwitterRouter) + Clone + Send + Sync + 'static,
) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(factory, session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}
