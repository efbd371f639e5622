//! Infoscreen operator library
//!
//! Turns browser session resources into the runtime objects that display
//! them:
//! - Object synthesis (workload and network exposures)
//! - Idempotent reconciliation with owner references and status
//! - Controller loop with de-duplicating work queue and backoff
//! - Resource store traits and an in-memory backend
//! - REST API and server lifecycle

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod reconciler;
pub mod server;
pub mod store;
pub mod synth;

pub use config::OperatorConfig;
pub use controller::Controller;
pub use error::{ApiError, DaemonError, ReconcileError, StoreError};
pub use reconciler::{Action, Reconciler};
pub use server::Server;
pub use store::{InMemoryStore, ResourceStore, Storage};
