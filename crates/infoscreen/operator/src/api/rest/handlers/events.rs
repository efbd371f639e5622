//! Event handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use infoscreen_types::{ObjectKey, OperatorEventEnvelope};
use serde::Deserialize;

/// Get events query params
#[derive(Debug, Deserialize)]
pub struct GetEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

fn default_limit() -> usize {
    20
}

/// Get recent events, optionally for one session
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<GetEventsQuery>,
) -> ApiResult<Json<Vec<OperatorEventEnvelope>>> {
    let events = match (query.namespace, query.name) {
        (Some(namespace), Some(name)) => {
            let key = ObjectKey::new(namespace, name);
            state
                .storage
                .get_events_for_session(&key, query.limit)
                .await?
        }
        (None, None) => state.storage.get_recent_events(query.limit).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "namespace and name must be given together".to_string(),
            ))
        }
    };

    Ok(Json(events))
}
