//! API routes

mod health;
mod marketplace;
pub mod metrics;
mod portal;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri, header},
    middleware,
    response::{Html, IntoResponse, Response},
};
use drydock_auth::{bearer_auth_middleware, portal_auth_middleware};
use rust_embed::Embed;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Embedded static files from the frontend build
#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/../../static"]
struct Assets;

/// Handler for serving embedded static files
async fn serve_embedded_file(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // Try to get the exact file
    if let Some(content) = <Assets as Embed>::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        (
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.into_owned(),
        )
            .into_response()
    } else if let Some(content) = <Assets as Embed>::get("index.html") {
        // SPA fallback: serve index.html for any unmatched route
        Html(content.data.into_owned()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let tokens = state.tokens.clone();

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // File-storage portal API
        .merge(portal::routes())
        // Mechanic marketplace API, bearer-token gated
        .merge(marketplace::routes().layer(middleware::from_fn_with_state(
            tokens.clone(),
            bearer_auth_middleware,
        )))
        .with_state(state)
        // Allow large uploads (100 MB max)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    // Serve embedded static files (SPA) - must be last to not interfere with
    // API routes. The portal middleware wraps the whole tree: it gates the
    // portal API and the dashboard pages, and lets the marketplace prefix
    // through to its own middleware.
    router
        .fallback(serve_embedded_file)
        .layer(middleware::from_fn_with_state(tokens, portal_auth_middleware))
}
