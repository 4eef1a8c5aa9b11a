/// Manual scan trigger
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{extract::State, Json};
use mirror_sync::ScanSummary;
use std::sync::Arc;

/// POST /api/scan
/// Run one scan pass and return its summary. Rejected with 409 while a
/// pass is already running.
///
/// The pass runs on its own task, so a client that disconnects does not
/// abort it.
pub async fn trigger_scan(State(app_state): State<AppState>) -> Result<Json<ScanSummary>> {
    tracing::info!("Manual scan requested");
    let orchestrator = Arc::clone(&app_state.orchestrator);
    let summary = tokio::spawn(async move { orchestrator.scan().await })
        .await
        .map_err(|e| ServerError::Internal(format!("Scan task failed: {e}")))??;
    Ok(Json(summary))
}
