/// Launcher state API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use mirror_core::VersionEntry;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LauncherSummary {
    pub name: String,
    pub source_url: String,
    pub repo_url: Option<String>,
    pub version: Option<String>,
    pub last_scan_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct LatestVersionResponse {
    pub launcher: String,
    /// Empty when nothing has been mirrored yet
    pub version: String,
}

/// GET /api/launchers
/// Runtime view of every configured launcher, sorted by name
pub async fn list_launchers(State(app_state): State<AppState>) -> Json<Vec<LauncherSummary>> {
    let launchers = app_state
        .orchestrator
        .registry()
        .snapshot()
        .into_iter()
        .map(|state| {
            let source_url = app_state
                .orchestrator
                .launchers()
                .iter()
                .find(|l| l.name == state.name)
                .map(|l| l.source_url.clone())
                .unwrap_or_default();
            LauncherSummary {
                name: state.name,
                source_url,
                repo_url: state.repo_url,
                version: state.version,
                last_scan_at: state.last_scan_at,
            }
        })
        .collect();

    Json(launchers)
}

/// GET /api/launchers/:name/latest
pub async fn latest_version(
    Path(name): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<LatestVersionResponse>> {
    let version = app_state.orchestrator.latest_version(&name).await?;
    Ok(Json(LatestVersionResponse {
        launcher: name,
        version,
    }))
}

/// GET /api/launchers/:name/versions
/// Every mirrored version of a configured launcher, newest first
pub async fn list_versions(
    Path(name): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<VersionEntry>>> {
    let configured = app_state
        .orchestrator
        .launchers()
        .iter()
        .any(|l| l.name == name);
    if !configured {
        return Err(ServerError::NotFound(format!("Launcher {name}")));
    }

    let history = app_state.store.history(&name).await?;
    Ok(Json(history))
}
