use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use cpcontainer_core::{Error, Result};

use super::{null_as_default, InspectRecord};

/// Network configuration of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkSettings {
    #[serde(rename = "EndpointID", deserialize_with = "null_as_default")]
    pub endpoint_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gateway: String,
    /// Primary address; empty for containers attached to named networks only.
    #[serde(rename = "IPAddress", deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(rename = "IPPrefixLen", deserialize_with = "null_as_default")]
    pub ip_prefix_len: u32,
    #[serde(rename = "IPv6Gateway", deserialize_with = "null_as_default")]
    pub ipv6_gateway: String,
    #[serde(rename = "GlobalIPv6Address", deserialize_with = "null_as_default")]
    pub global_ipv6_address: String,
    #[serde(rename = "GlobalIPv6PrefixLen", deserialize_with = "null_as_default")]
    pub global_ipv6_prefix_len: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub mac_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bridge: String,
    #[serde(rename = "SandboxID", deserialize_with = "null_as_default")]
    pub sandbox_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hairpin_mode: bool,
    /// Published ports keyed by `port/proto`, kept as reported.
    #[serde(deserialize_with = "null_as_default")]
    pub ports: Map<String, Value>,
    #[serde(rename = "LinkLocalIPv6Address", deserialize_with = "null_as_default")]
    pub link_local_ipv6_address: String,
    #[serde(rename = "LinkLocalIPv6PrefixLen", deserialize_with = "null_as_default")]
    pub link_local_ipv6_prefix_len: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub sandbox_key: String,
    #[serde(skip_serializing, deserialize_with = "null_as_default")]
    pub networks: BTreeMap<String, NetworkAttachment>,
}

/// Per-network attachment details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkAttachment {
    #[serde(rename = "EndpointID", deserialize_with = "null_as_default")]
    pub endpoint_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gateway: String,
    #[serde(rename = "IPAddress", deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(rename = "IPPrefixLen", deserialize_with = "null_as_default")]
    pub ip_prefix_len: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub mac_address: String,
    #[serde(rename = "NetworkID", deserialize_with = "null_as_default")]
    pub network_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
}

impl NetworkSettings {
    /// Attachment details for a named network.
    pub fn network(&self, name: &str) -> Result<&NetworkAttachment> {
        self.networks
            .get(name)
            .ok_or_else(|| Error::validation(format!("container is not attached to network '{}'", name)))
    }

    /// Address of the container.
    ///
    /// An empty `network` resolves to the primary address when there is one;
    /// otherwise the named attachment is consulted.
    pub fn ip(&self, network: &str) -> Result<&str> {
        if network.is_empty() && !self.ip_address.is_empty() {
            return Ok(&self.ip_address);
        }
        Ok(&self.network(network)?.ip_address)
    }
}

impl InspectRecord for NetworkSettings {
    const KIND: &'static str = "network settings";
}

impl std::fmt::Display for NetworkSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.ip_address)
    }
}
