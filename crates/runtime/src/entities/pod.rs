use serde::{Deserialize, Serialize};

use super::{null_as_default, InspectRecord};

/// A pod as reported by `pod inspect`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Pod {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exit_policy: String,
    /// Free-text state such as `Running` or `Degraded`.
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hostname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub create_cgroup: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub cgroup_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub create_infra: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub infra_container_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub num_containers: u32,
    /// Member containers in runtime order.
    #[serde(deserialize_with = "null_as_default")]
    pub containers: Vec<PodMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PodMember {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
}

impl Pod {
    pub fn is_loaded(&self) -> bool {
        !self.id.is_empty()
    }

    /// Ids of the member containers, infra container included.
    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.containers.iter().map(|c| c.id.as_str())
    }
}

impl InspectRecord for Pod {
    const KIND: &'static str = "pod";
}

impl std::fmt::Display for Pod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
