//! Controller loop against the in-memory store

use infoscreen_operator::config::{ControllerConfig, ReconcilerConfig, WorkloadTemplate};
use infoscreen_operator::store::{ExposureStore, SessionStore, WorkloadStore};
use infoscreen_operator::{Controller, InMemoryStore, Reconciler};
use infoscreen_types::{
    EnvValue, ObjectKey, OperatorEvent, OperatorEventEnvelope, Session, SessionPhase, SessionSpec,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

struct Running {
    store: Arc<InMemoryStore>,
    events: broadcast::Receiver<OperatorEventEnvelope>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

fn start() -> Running {
    start_with(ControllerConfig {
        resync_interval_secs: 3600,
        ..Default::default()
    })
}

fn start_with(config: ControllerConfig) -> Running {
    let store = Arc::new(InMemoryStore::new());
    let (event_tx, events) = broadcast::channel(256);
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        WorkloadTemplate::default(),
        ReconcilerConfig::default(),
        event_tx.clone(),
    ));
    let controller = Controller::new(
        reconciler,
        store.clone(),
        config,
        event_tx,
    );

    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(controller.run(store.subscribe(), shutdown_rx));

    Running {
        store,
        events,
        shutdown,
        handle,
    }
}

impl Running {
    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("controller did not stop")
            .unwrap();
    }
}

async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}

fn key() -> ObjectKey {
    ObjectKey::new("screens", "lobby")
}

#[tokio::test]
async fn test_session_lifecycle() {
    let running = start();
    let store = running.store.clone();

    let session = store
        .apply_session(Session::new(&key(), SessionSpec::new("https://example.com")))
        .await
        .unwrap();

    eventually("children", || {
        let store = store.clone();
        async move { store.list_exposures().await.unwrap().len() == 2 }
    })
    .await;

    let workload = store.get_workload(&key()).await.unwrap().unwrap();
    assert!(workload.metadata.is_controlled_by(&session.metadata.uid));

    let stored = store.get_session(&key()).await.unwrap().unwrap();
    assert_eq!(stored.status.phase, Some(SessionPhase::Provisioning));
    assert_eq!(stored.status.observed_generation, 1);

    // Spec change flows through to the workload
    let mut updated = stored.clone();
    updated.spec.url = "https://example.org".to_string();
    store.apply_session(updated).await.unwrap();

    eventually("updated workload", || {
        let store = store.clone();
        async move {
            let Some(workload) = store.get_workload(&key()).await.unwrap() else {
                return false;
            };
            workload.spec.containers[0]
                .env_var("URL")
                .and_then(|v| v.literal_value())
                == Some("https://example.org")
        }
    })
    .await;

    eventually("observed generation", || {
        let store = store.clone();
        async move {
            store
                .get_session(&key())
                .await
                .unwrap()
                .is_some_and(|s| s.status.observed_generation == 2)
        }
    })
    .await;

    running.stop().await;

    // Deleting the session removes its children
    assert!(store.delete_session(&key()).await.unwrap());
    assert!(store.get_workload(&key()).await.unwrap().is_none());
    assert!(store.list_exposures().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_credentials_wired_from_secret() {
    let running = start();
    let store = running.store.clone();

    store
        .apply_session(Session::new(
            &key(),
            SessionSpec::new("https://example.com").with_credentials("creds1"),
        ))
        .await
        .unwrap();

    eventually("workload", || {
        let store = store.clone();
        async move { store.get_workload(&key()).await.unwrap().is_some() }
    })
    .await;

    let workload = store.get_workload(&key()).await.unwrap().unwrap();
    let container = &workload.spec.containers[0];
    assert!(matches!(
        &container.env_var("LOGIN_USER").unwrap().value,
        EnvValue::SecretKeyRef { secret, .. } if secret == "creds1"
    ));
    assert_eq!(
        container.env_var("LOGIN_PW_BASE64").unwrap().literal_value(),
        Some("false")
    );

    running.stop().await;
}

#[tokio::test]
async fn test_events_reported() {
    let mut running = start();

    running
        .store
        .apply_session(Session::new(&key(), SessionSpec::new("https://example.com")))
        .await
        .unwrap();

    let mut seen = Vec::new();
    let collected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let envelope = running.events.recv().await.unwrap();
            let done = matches!(envelope.event, OperatorEvent::ReconcileSucceeded { .. });
            seen.push(envelope);
            if done {
                break;
            }
        }
    })
    .await;
    assert!(collected.is_ok(), "no success event");

    assert!(seen.iter().all(|e| e.session == key()));
    assert!(matches!(
        seen[0].event,
        OperatorEvent::ProvisioningStarted { generation: 1 }
    ));
    let created = seen
        .iter()
        .filter(|e| matches!(e.event, OperatorEvent::ChildCreated { .. }))
        .count();
    assert_eq!(created, 3);

    running.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_sessions_reconciled_in_parallel() {
    const SESSIONS: usize = 12;
    let running = start_with(ControllerConfig {
        resync_interval_secs: 3600,
        max_concurrent_reconciliations: 4,
        ..Default::default()
    });
    let store = running.store.clone();

    let mut uids = Vec::new();
    for i in 0..SESSIONS {
        let key = ObjectKey::new("screens", format!("wall-{i}"));
        let spec = SessionSpec::new(format!("https://example.com/{i}"));
        let session = store.apply_session(Session::new(&key, spec)).await.unwrap();
        uids.push(session.metadata.uid);
    }

    eventually("all children", || {
        let store = store.clone();
        async move {
            store.list_workloads().await.unwrap().len() == SESSIONS
                && store.list_exposures().await.unwrap().len() == 2 * SESSIONS
        }
    })
    .await;

    let workloads = store.list_workloads().await.unwrap();
    let exposures = store.list_exposures().await.unwrap();
    assert_eq!(workloads.len() + exposures.len(), 3 * SESSIONS);
    for uid in &uids {
        assert_eq!(
            workloads.iter().filter(|w| w.metadata.is_controlled_by(uid)).count(),
            1
        );
        assert_eq!(
            exposures.iter().filter(|e| e.metadata.is_controlled_by(uid)).count(),
            2
        );
    }

    eventually("observed generations", || {
        let store = store.clone();
        async move {
            store
                .list_sessions()
                .await
                .unwrap()
                .iter()
                .all(|s| s.status.observed_generation == 1)
        }
    })
    .await;

    running.stop().await;
}
