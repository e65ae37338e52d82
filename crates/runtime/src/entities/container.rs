use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{null_as_default, ContainerState, InspectRecord, NetworkSettings};

/// A container as reported by `inspect --type container`.
///
/// `Container::default()` is an unhydrated placeholder; only a container
/// with a non-empty `id` stands for a real resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    pub id: String,
    pub created: String,
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub mounts: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(rename = "ImageID", default, deserialize_with = "null_as_default")]
    pub image_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub restart_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_fs: String,
    /// Id of the owning pod, empty when standalone.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pod: String,
    pub state: ContainerState,
    #[serde(skip_serializing)]
    pub network_settings: NetworkSettings,
}

impl Container {
    /// Whether this value came from a successful hydration.
    pub fn is_loaded(&self) -> bool {
        !self.id.is_empty()
    }

    /// Address on `network`, or the primary address when `network` is empty.
    pub fn ip(&self, network: &str) -> cpcontainer_core::Result<&str> {
        self.network_settings.ip(network)
    }
}

impl InspectRecord for Container {
    const KIND: &'static str = "container";
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}
