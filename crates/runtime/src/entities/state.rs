use serde::{Deserialize, Serialize};

use super::{null_as_default, InspectRecord};

/// Lifecycle snapshot of a container, as reported by the runtime.
///
/// The flags are taken verbatim; nothing checks that they agree with
/// `status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub oci_version: String,
    /// Free-text status such as `running`, `paused` or `exited`.
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pid: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub started_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub finished_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exit_code: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(rename = "OOMKilled", default, deserialize_with = "null_as_default")]
    pub oom_killed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dead: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paused: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub restarting: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub running: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exited: bool,
}

impl InspectRecord for ContainerState {
    const KIND: &'static str = "container state";
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status)
    }
}
