//! The user-facing session resource
//!
//! A [`Session`] declares one browser session: the URL to open, an optional
//! forwarding target and an optional reference to a credential bundle. Its
//! `spec` belongs to the user, its `status` to the operator.

use crate::{ObjectKey, ObjectMeta, OwnerReference, SessionStatus};
use serde::{Deserialize, Serialize};

/// API group of the session resource
pub const API_GROUP: &str = "session.infoscreen.dev";

/// Group-qualified API version of the session resource
pub const API_VERSION: &str = "session.infoscreen.dev/v1";

/// Kind of the session resource
pub const SESSION_KIND: &str = "BrowserSession";

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    SESSION_KIND.to_string()
}

/// A declared browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    pub metadata: ObjectMeta,

    pub spec: SessionSpec,

    #[serde(default)]
    pub status: SessionStatus,
}

impl Session {
    pub fn new(key: &ObjectKey, spec: SessionSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(key),
            spec,
            status: SessionStatus::default(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    /// Owner reference that marks this session as the controller of a child
    pub fn controller_owner_ref(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.metadata.name.clone(),
            uid: self.metadata.uid.clone(),
            block_owner_deletion: true,
            controller: true,
        }
    }
}

/// Desired state of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    /// Content to display
    pub url: String,

    /// Opaque routing hint forwarded to the workload
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsSpec>,

    /// Secondary payload forwarded to the workload
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub destination: String,

    // Display and placement hints. Advisory only; nothing consumes them yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits_per_pixel: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ref: Option<ClusterRef>,
}

impl SessionSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Reference a credential bundle by name
    pub fn with_credentials(mut self, secret_name: impl Into<String>) -> Self {
        self.credentials = Some(CredentialsSpec {
            secret_ref: Some(SecretReference {
                name: secret_name.into(),
            }),
        });
        self
    }

    /// Name of the referenced credential bundle, if one is set
    pub fn credential_secret(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .and_then(|c| c.secret_ref.as_ref())
            .map(|s| s.name.as_str())
    }
}

/// Credential wiring for the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,
}

/// Reference to a key/value credential bundle in the session's namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
}

/// Requested display resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(default)]
    pub width: u16,
    #[serde(default)]
    pub height: u16,
}

/// Cluster placement hint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    #[serde(default)]
    pub name: String,
}
