//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Sessions
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/:namespace/:name",
            get(handlers::get_session)
                .put(handlers::update_session)
                .delete(handlers::delete_session),
        )
        .route(
            "/sessions/:namespace/:name/children",
            get(handlers::get_session_children),
        )
        // Events
        .route("/events", get(handlers::get_events));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, ReconcilerConfig, WorkloadTemplate};
    use crate::controller::Controller;
    use crate::reconciler::Reconciler;
    use crate::store::{EventStore, InMemoryStore, SessionStore, WorkloadStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use infoscreen_types::{
        ObjectKey, OperatorEvent, OperatorEventEnvelope, Session, SessionSpec,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let (event_tx, _) = broadcast::channel(16);
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            WorkloadTemplate::default(),
            ReconcilerConfig::default(),
            event_tx.clone(),
        ));
        let controller = Controller::new(
            reconciler,
            store.clone(),
            ControllerConfig::default(),
            event_tx,
        );
        let state = AppState::new(store.clone(), controller);
        (create_router(state, true), store)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn session_body(url: &str) -> Value {
        json!({
            "metadata": {
                "name": "lobby",
                "namespace": "screens",
                "labels": {"app": "lobby"}
            },
            "spec": {"url": url}
        })
    }

    fn key() -> ObjectKey {
        ObjectKey::new("screens", "lobby")
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let (status, body) = send(app, Method::GET, "/api/v1/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_then_get_session() {
        let (app, store) = test_app();

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/v1/sessions",
            Some(session_body("https://example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["metadata"]["generation"], 1);
        assert!(store.get_session(&key()).await.unwrap().is_some());

        let (status, body) = send(app, Method::GET, "/api/v1/sessions/screens/lobby", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spec"]["url"], "https://example.com");
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let (app, _) = test_app();
        let body = session_body("https://example.com");

        send(app.clone(), Method::POST, "/api/v1/sessions", Some(body.clone())).await;
        let (status, body) = send(app, Method::POST, "/api/v1/sessions", Some(body)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_one() {
        let (app, store) = test_app();
        let body = session_body("https://example.com");

        let (first, second) = tokio::join!(
            send(app.clone(), Method::POST, "/api/v1/sessions", Some(body.clone())),
            send(app, Method::POST, "/api/v1/sessions", Some(body)),
        );

        let mut statuses = vec![first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
        let stored = store.get_session(&key()).await.unwrap().unwrap();
        assert_eq!(stored.metadata.generation, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_kind() {
        let (app, _) = test_app();
        let mut body = session_body("https://example.com");
        body["apiVersion"] = json!("apps/v1");
        body["kind"] = json!("Deployment");

        let (status, body) = send(app, Method::POST, "/api/v1/sessions", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_url() {
        let (app, _) = test_app();
        let (status, _) =
            send(app, Method::POST, "/api/v1/sessions", Some(session_body(""))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_session() {
        let (app, _) = test_app();
        let (status, body) = send(app, Method::GET, "/api/v1/sessions/screens/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_bumps_generation() {
        let (app, _) = test_app();
        send(
            app.clone(),
            Method::POST,
            "/api/v1/sessions",
            Some(session_body("https://example.com")),
        )
        .await;

        let (status, body) = send(
            app,
            Method::PUT,
            "/api/v1/sessions/screens/lobby",
            Some(session_body("https://example.org")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["generation"], 2);
        assert_eq!(body["spec"]["url"], "https://example.org");
    }

    #[tokio::test]
    async fn test_update_rejects_path_mismatch() {
        let (app, _) = test_app();
        let (status, _) = send(
            app,
            Method::PUT,
            "/api/v1/sessions/screens/other",
            Some(session_body("https://example.com")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (app, store) = test_app();
        send(
            app.clone(),
            Method::POST,
            "/api/v1/sessions",
            Some(session_body("https://example.com")),
        )
        .await;

        let (status, body) =
            send(app.clone(), Method::DELETE, "/api/v1/sessions/screens/lobby", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);
        assert!(store.get_session(&key()).await.unwrap().is_none());

        let (_, body) = send(app, Method::DELETE, "/api/v1/sessions/screens/lobby", None).await;
        assert_eq!(body["deleted"], false);
    }

    #[tokio::test]
    async fn test_children_after_reconcile() {
        let store = Arc::new(InMemoryStore::new());
        let (event_tx, _) = broadcast::channel(16);
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            WorkloadTemplate::default(),
            ReconcilerConfig::default(),
            event_tx.clone(),
        ));
        let controller = Controller::new(
            reconciler.clone(),
            store.clone(),
            ControllerConfig::default(),
            event_tx,
        );
        let app = create_router(AppState::new(store.clone(), controller), false);

        store
            .apply_session(Session::new(&key(), SessionSpec::new("https://example.com")))
            .await
            .unwrap();
        reconciler.reconcile(&key()).await.unwrap();

        let (status, body) =
            send(app, Method::GET, "/api/v1/sessions/screens/lobby/children", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workload"]["metadata"]["name"], "lobby");
        let names: Vec<_> = body["exposures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["metadata"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["lobby", "lobby-pods"]);
        assert!(store.get_workload(&key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_events_limit_and_filter() {
        let (app, store) = test_app();
        for generation in 1..=3 {
            store
                .store_event(OperatorEventEnvelope::new(
                    key(),
                    OperatorEvent::ProvisioningStarted { generation },
                ))
                .await
                .unwrap();
        }
        store
            .store_event(OperatorEventEnvelope::new(
                ObjectKey::new("screens", "hall"),
                OperatorEvent::ProvisioningStarted { generation: 1 },
            ))
            .await
            .unwrap();

        let (status, body) = send(app.clone(), Method::GET, "/api/v1/events?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(
            app,
            Method::GET,
            "/api/v1/events?namespace=screens&name=lobby",
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_status_counts_sessions() {
        let (app, store) = test_app();
        store
            .apply_session(Session::new(&key(), SessionSpec::new("https://example.com")))
            .await
            .unwrap();

        let (status, body) = send(app, Method::GET, "/api/v1/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_sessions"], 1);
        assert_eq!(body["stats"]["total_workloads"], 0);
    }
}
