//! Session management handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use infoscreen_types::{
    NetworkExposure, ObjectKey, Session, WorkloadUnit, API_VERSION, SESSION_KIND,
};
use serde::Serialize;

/// List all sessions
pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    let sessions = state.storage.list_sessions().await?;
    Ok(Json(sessions))
}

/// Get a specific session
pub async fn get_session(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<Session>> {
    let key = ObjectKey::new(namespace, name);
    let session = state
        .storage
        .get_session(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", key)))?;

    Ok(Json(session))
}

/// Create a new session
pub async fn create_session(
    State(state): State<AppState>,
    Json(session): Json<Session>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    validate(&session)?;
    let key = session.key();

    let stored = state.storage.create_session(session).await?;

    tracing::info!(session = %key, uid = %stored.metadata.uid, "Created session");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Update the spec and labels of an existing session
pub async fn update_session(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(session): Json<Session>,
) -> ApiResult<Json<Session>> {
    let key = ObjectKey::new(namespace, name);

    if session.key() != key {
        return Err(ApiError::BadRequest(
            "Session name in body does not match path".to_string(),
        ));
    }
    validate(&session)?;

    if state.storage.get_session(&key).await?.is_none() {
        return Err(ApiError::NotFound(format!("Session {} not found", key)));
    }

    let stored = state.storage.apply_session(session).await?;

    tracing::info!(
        session = %key,
        generation = stored.metadata.generation,
        "Updated session"
    );

    Ok(Json(stored))
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Delete a session together with its children
pub async fn delete_session(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<DeleteResponse>> {
    let key = ObjectKey::new(namespace, name);
    let deleted = state.storage.delete_session(&key).await?;

    if deleted {
        tracing::info!(session = %key, "Deleted session");
    }

    Ok(Json(DeleteResponse { deleted }))
}

/// Objects owned by a session
#[derive(Debug, Serialize)]
pub struct SessionChildrenResponse {
    pub workload: Option<WorkloadUnit>,
    pub exposures: Vec<NetworkExposure>,
}

/// Get the objects a session owns
pub async fn get_session_children(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<SessionChildrenResponse>> {
    let key = ObjectKey::new(namespace, name);
    let session = state
        .storage
        .get_session(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", key)))?;
    let uid = &session.metadata.uid;

    let workload = state
        .storage
        .list_workloads()
        .await?
        .into_iter()
        .find(|w| w.metadata.is_owned_by(uid));
    let exposures = state
        .storage
        .list_exposures()
        .await?
        .into_iter()
        .filter(|e| e.metadata.is_owned_by(uid))
        .collect();

    Ok(Json(SessionChildrenResponse {
        workload,
        exposures,
    }))
}

fn validate(session: &Session) -> ApiResult<()> {
    if session.metadata.name.is_empty() || session.metadata.namespace.is_empty() {
        return Err(ApiError::BadRequest(
            "metadata.name and metadata.namespace are required".to_string(),
        ));
    }
    if session.api_version != API_VERSION || session.kind != SESSION_KIND {
        return Err(ApiError::BadRequest(format!(
            "apiVersion and kind must be {} {}",
            API_VERSION, SESSION_KIND
        )));
    }
    if session.spec.url.is_empty() {
        return Err(ApiError::BadRequest("spec.url is required".to_string()));
    }
    Ok(())
}
