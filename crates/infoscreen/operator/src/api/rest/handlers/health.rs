//! Health and status handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use infoscreen_types::SessionPhase;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub stats: DaemonStats,
}

/// Daemon statistics
#[derive(Debug, Serialize)]
pub struct DaemonStats {
    pub total_sessions: usize,
    pub provisioning_sessions: usize,
    pub unobserved_sessions: usize,
    pub total_workloads: usize,
    pub total_exposures: usize,
    pub pending_reconciliations: usize,
}

/// Daemon status endpoint
pub async fn daemon_status(
    State(state): State<AppState>,
) -> ApiResult<Json<DaemonStatusResponse>> {
    let sessions = state.storage.list_sessions().await?;
    let workloads = state.storage.list_workloads().await?;
    let exposures = state.storage.list_exposures().await?;

    let provisioning = sessions
        .iter()
        .filter(|s| s.status.phase == Some(SessionPhase::Provisioning))
        .count();
    let unobserved = sessions
        .iter()
        .filter(|s| s.status.observed_generation != s.metadata.generation)
        .count();

    Ok(Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        stats: DaemonStats {
            total_sessions: sessions.len(),
            provisioning_sessions: provisioning,
            unobserved_sessions: unobserved,
            total_workloads: workloads.len(),
            total_exposures: exposures.len(),
            pending_reconciliations: state.controller.pending().await,
        },
    }))
}
