//! Network exposure: a named, ported reachability record for a workload

use crate::{Labels, ObjectMeta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkExposure {
    pub metadata: ObjectMeta,
    pub spec: ExposureSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureSpec {
    #[serde(rename = "type")]
    pub exposure_type: ExposureType,
    pub ports: Vec<ServicePort>,
    /// Workloads carrying all of these labels are targeted
    pub selector: Labels,
}

impl ExposureSpec {
    /// Look up a port by name
    pub fn port(&self, name: &str) -> Option<&ServicePort> {
        self.ports.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureType {
    /// Reachable from outside the cluster through a load balancer
    LoadBalancer,
    /// Cluster-internal virtual address
    ClusterIp,
    /// No virtual address; resolves straight to workload addresses
    Headless,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub target_port: PortTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortTarget {
    Number(u16),
    /// Resolved against the container port of the same name
    Named(String),
}
