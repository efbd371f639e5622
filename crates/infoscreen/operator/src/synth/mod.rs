//! Resource synthesis
//!
//! Pure mapping from a [`Session`] to the objects that realize it: one
//! workload unit and two network exposures. Synthesis never fails and never
//! performs I/O; absent optional fields just produce fewer entries.

pub mod env;

use crate::config::WorkloadTemplate;
use infoscreen_types::{
    Container, ContainerPort, ExposureSpec, ExposureType, NetworkExposure, ObjectKey, ObjectMeta,
    PortTarget, RestartPolicy, ServicePort, Session, StorageMedium, Volume, VolumeMount,
    VolumeSource, WorkloadSpec, WorkloadUnit,
};

pub use env::build_environment;

/// Remote display port
pub const VNC_PORT_NAME: &str = "vnc";
pub const VNC_PORT: u16 = 5900;

/// Workload health endpoint
pub const HEALTH_PORT_NAME: &str = "healthz";
pub const HEALTH_PORT: u16 = 5000;

/// Compositor IPC
pub const IPC_PORT_NAME: &str = "sway-ipc";
pub const IPC_PORT: u16 = 7023;

/// Name of the memory-backed scratch volume
pub const SCRATCH_VOLUME: &str = "temp";

/// Suffix of the headless exposure's name
pub const INTERNAL_EXPOSURE_SUFFIX: &str = "-pods";

/// Everything a session needs in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedObjects {
    pub workload: WorkloadUnit,
    /// Load-balanced, display port only
    pub external: NetworkExposure,
    /// Headless, display and IPC ports
    pub internal: NetworkExposure,
}

/// Derive the child objects of `session`.
pub fn synthesize(session: &Session, template: &WorkloadTemplate) -> SynthesizedObjects {
    let key = session.key();

    SynthesizedObjects {
        workload: synthesize_workload(session, template),
        external: exposure(
            session,
            &key,
            ExposureType::LoadBalancer,
            vec![named_port(VNC_PORT_NAME, VNC_PORT)],
        ),
        internal: exposure(
            session,
            &internal_exposure_key(&key),
            ExposureType::Headless,
            vec![
                named_port(VNC_PORT_NAME, VNC_PORT),
                named_port(IPC_PORT_NAME, IPC_PORT),
            ],
        ),
    }
}

/// Key of the headless exposure belonging to the session at `session`
pub fn internal_exposure_key(session: &ObjectKey) -> ObjectKey {
    session.sibling(format!("{}{}", session.name, INTERNAL_EXPOSURE_SUFFIX))
}

fn synthesize_workload(session: &Session, template: &WorkloadTemplate) -> WorkloadUnit {
    let container = Container {
        name: template.container_name.clone(),
        image: template.image.clone(),
        image_pull_policy: template.image_pull_policy,
        volume_mounts: vec![VolumeMount {
            name: SCRATCH_VOLUME.to_string(),
            mount_path: env::RUNTIME_DIR.to_string(),
        }],
        env: build_environment(&session.spec, template),
        ports: vec![
            ContainerPort {
                name: VNC_PORT_NAME.to_string(),
                container_port: VNC_PORT,
            },
            ContainerPort {
                name: HEALTH_PORT_NAME.to_string(),
                container_port: HEALTH_PORT,
            },
            ContainerPort {
                name: IPC_PORT_NAME.to_string(),
                container_port: IPC_PORT,
            },
        ],
    };

    // Short-lived and sandboxed: no restart after success, no grace period,
    // no ambient orchestrator credentials.
    WorkloadUnit {
        metadata: child_meta(session, &session.key()),
        spec: WorkloadSpec {
            volumes: vec![Volume {
                name: SCRATCH_VOLUME.to_string(),
                source: VolumeSource::EmptyDir {
                    medium: StorageMedium::Memory,
                    size_limit: template.scratch_size_limit.clone(),
                },
            }],
            containers: vec![container],
            restart_policy: RestartPolicy::OnFailure,
            termination_grace_period_seconds: 0,
            automount_service_account_token: false,
        },
    }
}

fn exposure(
    session: &Session,
    key: &ObjectKey,
    exposure_type: ExposureType,
    ports: Vec<ServicePort>,
) -> NetworkExposure {
    NetworkExposure {
        metadata: child_meta(session, key),
        spec: ExposureSpec {
            exposure_type,
            ports,
            selector: session.metadata.labels.clone(),
        },
    }
}

fn named_port(name: &str, port: u16) -> ServicePort {
    ServicePort {
        name: name.to_string(),
        port,
        target_port: PortTarget::Named(name.to_string()),
    }
}

fn child_meta(session: &Session, key: &ObjectKey) -> ObjectMeta {
    ObjectMeta {
        labels: session.metadata.labels.clone(),
        owner_references: vec![session.controller_owner_ref()],
        ..ObjectMeta::new(key)
    }
}
