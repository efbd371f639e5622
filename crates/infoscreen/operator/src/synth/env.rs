//! Environment wiring for the session workload
//!
//! The variable names here are the contract with the workload image. Renaming
//! any of them breaks every deployed image.

use crate::config::WorkloadTemplate;
use infoscreen_types::{EnvVar, SessionSpec};

pub const XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
pub const WLR_BACKENDS: &str = "WLR_BACKENDS";
pub const WLR_LIBINPUT_NO_DEVICES: &str = "WLR_LIBINPUT_NO_DEVICES";
pub const SWAYSOCK: &str = "SWAYSOCK";
pub const MOZ_ENABLE_WAYLAND: &str = "MOZ_ENABLE_WAYLAND";
pub const URL: &str = "URL";
pub const DEBUG: &str = "DEBUG";
pub const TARGET: &str = "TARGET";
pub const LOGIN_USER: &str = "LOGIN_USER";
pub const LOGIN_PW_BASE64: &str = "LOGIN_PW_BASE64";
pub const LOGIN_PW: &str = "LOGIN_PW";
pub const URL_PAYLOAD: &str = "URL_PAYLOAD";

/// Runtime directory, also where the scratch volume is mounted
pub const RUNTIME_DIR: &str = "/tmp";

/// Compositor IPC socket inside the runtime directory
pub const SWAY_SOCKET: &str = "/tmp/sway-ipc.sock";

/// Build the environment table for a session.
///
/// Order is fixed: runtime variables and `URL`, then `TARGET`, then the
/// credential entries, then `URL_PAYLOAD`. Credentials are wired as
/// references into the named bundle; their values are never read here.
pub fn build_environment(spec: &SessionSpec, template: &WorkloadTemplate) -> Vec<EnvVar> {
    let mut env = vec![
        EnvVar::literal(XDG_RUNTIME_DIR, RUNTIME_DIR),
        EnvVar::literal(WLR_BACKENDS, "headless"),
        EnvVar::literal(WLR_LIBINPUT_NO_DEVICES, "1"),
        EnvVar::literal(SWAYSOCK, SWAY_SOCKET),
        EnvVar::literal(MOZ_ENABLE_WAYLAND, "1"),
        EnvVar::literal(URL, spec.url.as_str()),
        EnvVar::literal(DEBUG, template.debug.to_string()),
    ];

    if !spec.target.is_empty() {
        env.push(EnvVar::literal(TARGET, spec.target.as_str()));
    }

    if let Some(secret) = spec.credential_secret() {
        env.push(EnvVar::from_secret(
            LOGIN_USER,
            secret,
            template.credential_user_key.as_str(),
        ));
        env.push(EnvVar::literal(LOGIN_PW_BASE64, "false"));
        env.push(EnvVar::from_secret(
            LOGIN_PW,
            secret,
            template.credential_password_key.as_str(),
        ));
    }

    if !spec.destination.is_empty() {
        env.push(EnvVar::literal(URL_PAYLOAD, spec.destination.as_str()));
    }

    env
}
