/// Read-only file serving of the mirror tree
use crate::state::AppState;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// `/download/*` over the mirror root, with staging and other dot entries hidden
pub fn router(mirror_root: &Path) -> Router<AppState> {
    Router::new()
        .nest_service("/download", ServeDir::new(mirror_root))
        .layer(middleware::from_fn(hide_dot_entries))
}

async fn hide_dot_entries(request: Request, next: Next) -> Response {
    if is_hidden(request.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Whether any path segment names a dot entry, including a percent-encoded dot
fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.')
            || segment
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e"))
    })
}
