//! Named-command entry point for transport shims.
//!
//! Callers that receive requests over some wire format (a privileged stdin
//! protocol, a control-panel API) decode the envelope themselves and hand the
//! command name and JSON arguments to [`Podman::dispatch`]. The result is a
//! JSON payload or a typed [`Error`] for the shim to encode.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use cpcontainer_core::{Error, Result};

use crate::entities::InspectRecord;
use crate::podman::Podman;

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateContainerArgs {
    name: String,
    image: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    command: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePodArgs {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerIpArgs {
    name: String,
    #[serde(default)]
    network: String,
}

#[derive(Debug, Deserialize)]
struct NetworkArgs {
    network: String,
}

#[derive(Debug, Deserialize)]
struct TenantIpArgs {
    tenant_id: i64,
    network: Option<String>,
    subtract: Option<i64>,
}

fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::validation(format!("invalid arguments for '{}': {}", command, e)))
}

/// Commands accepted by [`Podman::dispatch`].
pub const COMMANDS: &[&str] = &[
    "container_exists",
    "container_inspect",
    "container_create",
    "container_start",
    "container_stop",
    "container_kill",
    "container_remove",
    "container_pause",
    "container_unpause",
    "container_restart",
    "container_prune",
    "container_ip",
    "pod_exists",
    "pod_inspect",
    "pod_create",
    "pod_start",
    "pod_stop",
    "pod_kill",
    "pod_remove",
    "pod_pause",
    "pod_unpause",
    "pod_restart",
    "pod_prune",
    "network_gateway",
    "tenant_ip",
];

impl Podman {
    /// Run a named command with already-decoded JSON arguments.
    pub async fn dispatch(&self, command: &str, args: Value) -> Result<Value> {
        tracing::debug!(command = %command, "Dispatching runtime command");

        match command {
            "container_exists" => {
                let a: NameArgs = parse_args(command, args)?;
                Ok(json!({ "exists": self.container_exists(&a.name).await? }))
            }
            "container_inspect" => {
                let a: NameArgs = parse_args(command, args)?;
                Ok(self.inspect(&a.name).await?.to_record())
            }
            "container_create" => {
                let a: CreateContainerArgs = parse_args(command, args)?;
                let container = self
                    .create_container(&a.name, &a.image, &a.args, &a.command)
                    .await?;
                Ok(container.to_record())
            }
            "container_start" | "container_stop" | "container_kill" | "container_remove"
            | "container_pause" | "container_unpause" | "container_restart" => {
                let a: NameArgs = parse_args(command, args)?;
                match command {
                    "container_start" => self.start(&a.name).await?,
                    "container_stop" => self.stop(&a.name).await?,
                    "container_kill" => self.kill(&a.name).await?,
                    "container_remove" => self.remove(&a.name).await?,
                    "container_pause" => self.pause(&a.name).await?,
                    "container_unpause" => self.unpause(&a.name).await?,
                    _ => self.restart(&a.name).await?,
                }
                Ok(json!({ "name": a.name }))
            }
            "container_prune" => Ok(json!({ "removed": self.prune_containers().await? })),
            "container_ip" => {
                let a: ContainerIpArgs = parse_args(command, args)?;
                let container = self.inspect(&a.name).await?;
                Ok(json!({ "ip": container.ip(&a.network)? }))
            }
            "pod_exists" => {
                let a: NameArgs = parse_args(command, args)?;
                Ok(json!({ "exists": self.pod_exists(&a.name).await? }))
            }
            "pod_inspect" => {
                let a: NameArgs = parse_args(command, args)?;
                Ok(self.pod_inspect(&a.name).await?.to_record())
            }
            "pod_create" => {
                let a: CreatePodArgs = parse_args(command, args)?;
                Ok(self.create_pod(&a.name, &a.args).await?.to_record())
            }
            "pod_start" | "pod_stop" | "pod_kill" | "pod_remove" | "pod_pause" | "pod_unpause"
            | "pod_restart" => {
                let a: NameArgs = parse_args(command, args)?;
                match command {
                    "pod_start" => self.pod_start(&a.name).await?,
                    "pod_stop" => self.pod_stop(&a.name).await?,
                    "pod_kill" => self.pod_kill(&a.name).await?,
                    "pod_remove" => self.pod_remove(&a.name).await?,
                    "pod_pause" => self.pod_pause(&a.name).await?,
                    "pod_unpause" => self.pod_unpause(&a.name).await?,
                    _ => self.pod_restart(&a.name).await?,
                }
                Ok(json!({ "name": a.name }))
            }
            "pod_prune" => Ok(json!({ "removed": self.prune_pods().await? })),
            "network_gateway" => {
                let a: NetworkArgs = parse_args(command, args)?;
                Ok(json!({ "gateway": self.gateway_of(&a.network).await? }))
            }
            "tenant_ip" => {
                let a: TenantIpArgs = parse_args(command, args)?;
                let ip = self
                    .tenant_address(a.tenant_id, a.network.as_deref(), a.subtract)
                    .await?;
                Ok(json!({ "ip": ip }))
            }
            other => Err(Error::validation(format!("unknown command '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcessRunner, ProcessOutput};
    use cpcontainer_core::RuntimeConfig;
    use std::sync::Arc;

    fn podman(responses: Vec<ProcessOutput>) -> (Podman, MockProcessRunner) {
        let runner = MockProcessRunner::new(responses);
        (Podman::with_runner(Arc::new(runner.clone()), RuntimeConfig::default()), runner)
    }

    #[tokio::test]
    async fn test_unknown_command_is_validation_failure() {
        let (podman, runner) = podman(vec![]);
        let err = podman.dispatch("container_teleport", json!({})).await.unwrap_err();
        assert!(err.is_validation_failure());
        assert!(runner.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_validation_failures() {
        let (podman, runner) = podman(vec![]);

        let err = podman.dispatch("container_stop", json!({ "id": "x" })).await.unwrap_err();
        assert!(err.is_validation_failure());

        let err = podman
            .dispatch("tenant_ip", json!({ "tenant_id": "1100" }))
            .await
            .unwrap_err();
        assert!(err.is_validation_failure());

        assert!(runner.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_tenant_ip_uses_configured_defaults() {
        let (podman, runner) = podman(vec![ProcessOutput::ok(
            json!([{ "subnets": [{ "gateway": "192.168.4.1" }] }]).to_string(),
        )]);

        let out = podman.dispatch("tenant_ip", json!({ "tenant_id": 1100 })).await.unwrap();
        assert_eq!(out, json!({ "ip": "192.168.4.102" }));
        assert_eq!(
            runner.recorded_calls().await[0],
            vec!["/usr/bin/podman", "network", "inspect", "Customers"]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_and_prune_payloads() {
        let (podman, runner) = podman(vec![ProcessOutput::ok("web\n"), ProcessOutput::ok("p9\n")]);

        let out = podman.dispatch("container_pause", json!({ "name": "web" })).await.unwrap();
        assert_eq!(out, json!({ "name": "web" }));

        let out = podman.dispatch("pod_prune", Value::Null).await.unwrap();
        assert_eq!(out, json!({ "removed": ["p9"] }));

        let calls = runner.recorded_calls().await;
        assert_eq!(calls[0], vec!["/usr/bin/podman", "pause", "web"]);
        assert_eq!(calls[1], vec!["/usr/bin/podman", "pod", "prune", "--force"]);
    }

    #[test]
    fn test_command_list_has_no_duplicates() {
        let mut names = COMMANDS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
