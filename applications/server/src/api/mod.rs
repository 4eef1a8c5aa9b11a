/// API route modules
pub mod downloads;
pub mod health;
pub mod launchers;
pub mod scan;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

/// Build the application router
///
/// `/api` carries the trigger and read endpoints; `/download` serves the
/// mirror tree read-only.
pub fn router(app_state: AppState, mirror_root: &Path) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/scan", post(scan::trigger_scan))
        .route("/launchers", get(launchers::list_launchers))
        .route("/launchers/:name/latest", get(launchers::latest_version))
        .route("/launchers/:name/versions", get(launchers::list_versions));

    Router::new()
        .nest("/api", api_routes)
        .merge(downloads::router(mirror_root))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(app_state)
}
