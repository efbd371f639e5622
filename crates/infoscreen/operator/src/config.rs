//! Configuration for infoscreen-operator

use infoscreen_types::PullPolicy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main operator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Controller loop configuration
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Reconciliation policy
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Template for synthesized workloads
    #[serde(default)]
    pub workload: WorkloadTemplate,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// Controller loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Interval between full resyncs of every session
    #[serde(default = "default_resync_interval")]
    pub resync_interval_secs: u64,

    /// Maximum passes running at once (distinct sessions only)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_reconciliations: usize,

    /// Deadline for a single pass
    #[serde(default = "default_reconcile_timeout")]
    pub reconcile_timeout_secs: u64,

    /// First retry delay after a failed pass
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound for the retry delay
    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resync_interval_secs: default_resync_interval(),
            max_concurrent_reconciliations: default_max_concurrent(),
            reconcile_timeout_secs: default_reconcile_timeout(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_secs: default_backoff_max(),
        }
    }
}

impl ControllerConfig {
    /// Never zero; tokio intervals reject a zero period
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs.max(1))
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Retry delay after `failures` consecutive failed passes
    pub fn backoff(&self, failures: u32) -> Duration {
        let base = Duration::from_millis(self.backoff_base_ms);
        let max = Duration::from_secs(self.backoff_max_secs);
        let factor = 1u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
        base.checked_mul(factor).map_or(max, |d| d.min(max))
    }
}

/// Reconciliation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Persist the provisioning status before touching children
    #[serde(default = "default_true")]
    pub publish_status: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            publish_status: true,
        }
    }
}

/// Fixed parts of every synthesized workload.
///
/// These values form the contract with the workload image; changing them
/// changes what every session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_pull_policy")]
    pub image_pull_policy: PullPolicy,

    #[serde(default = "default_container_name")]
    pub container_name: String,

    /// Size bound of the memory-backed scratch volume
    #[serde(default = "default_scratch_size")]
    pub scratch_size_limit: String,

    /// Key holding the login user in a referenced credential bundle
    #[serde(default = "default_user_key")]
    pub credential_user_key: String,

    /// Key holding the login password in a referenced credential bundle
    #[serde(default = "default_password_key")]
    pub credential_password_key: String,

    /// Value of the workload's `DEBUG` variable
    #[serde(default = "default_true")]
    pub debug: bool,
}

impl Default for WorkloadTemplate {
    fn default() -> Self {
        Self {
            image: default_image(),
            image_pull_policy: default_pull_policy(),
            container_name: default_container_name(),
            scratch_size_limit: default_scratch_size(),
            credential_user_key: default_user_key(),
            credential_password_key: default_password_key(),
            debug: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_resync_interval() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    10
}

fn default_reconcile_timeout() -> u64 {
    30
}

fn default_backoff_base() -> u64 {
    500
}

fn default_backoff_max() -> u64 {
    300
}

fn default_image() -> String {
    "swayvnc-firefox:latest".to_string()
}

fn default_pull_policy() -> PullPolicy {
    PullPolicy::Never
}

fn default_container_name() -> String {
    "firefox".to_string()
}

fn default_scratch_size() -> String {
    "128Mi".to_string()
}

fn default_user_key() -> String {
    "GF_SECURITY_ADMIN_USER".to_string()
}

fn default_password_key() -> String {
    "GF_SECURITY_ADMIN_PASSWORD".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl OperatorConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&OperatorConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables, e.g. INFOSCREEN_CONTROLLER__RESYNC_INTERVAL_SECS
        builder = builder.add_source(
            config::Environment::with_prefix("INFOSCREEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
