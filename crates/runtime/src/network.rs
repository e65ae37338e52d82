//! Network gateway lookup and per-tenant address derivation.
//!
//! A tenant's address is the network gateway plus
//! `tenant_id - subtract + 1`, so with the default subtract of 1000 tenant
//! 1000 gets the first address after the gateway. The result is only checked
//! against the IPv4 range, never against the network's subnet.

use serde_json::Value;
use std::net::Ipv4Addr;
use std::sync::Arc;

use cpcontainer_core::{Error, Result};

use crate::podman::classify_failure;
use crate::process::ProcessRunner;

const KIND: &str = "network";

/// Resolves network metadata through the runtime.
#[derive(Clone)]
pub struct NetworkResolver {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl NetworkResolver {
    pub fn new(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Raw `network inspect` payload for `network`.
    pub async fn inspect(&self, network: &str) -> Result<Value> {
        if network.is_empty() {
            return Err(Error::validation("network name must not be empty"));
        }

        let args = vec![
            self.binary.clone(),
            "network".to_string(),
            "inspect".to_string(),
            network.to_string(),
        ];
        let output = self.runner.run(&args).await?;
        if !output.success() {
            return Err(classify_failure(KIND, network, &args, &output));
        }

        serde_json::from_str(&output.stdout).map_err(|e| Error::parse(KIND, e.to_string()))
    }

    /// Gateway address of `network`.
    pub async fn gateway_of(&self, network: &str) -> Result<String> {
        let payload = self.inspect(network).await?;
        let gateway = gateway_from_payload(&payload)?;
        tracing::debug!(network = %network, gateway = %gateway, "Resolved network gateway");
        Ok(gateway)
    }

    /// Address assigned to `tenant_id` on `network`.
    pub async fn address_for(&self, tenant_id: i64, network: &str, subtract: i64) -> Result<String> {
        let gateway = self.gateway_of(network).await?;
        let base: Ipv4Addr = gateway
            .parse()
            .map_err(|e| Error::parse(KIND, format!("gateway '{}' is not an IPv4 address: {}", gateway, e)))?;

        let address = derive_address(base, tenant_id, subtract).ok_or_else(|| {
            Error::validation(format!(
                "address for tenant {} in network {} falls outside the IPv4 range",
                tenant_id, network
            ))
        })?;

        tracing::info!(tenant_id, network = %network, address = %address, "Derived tenant address");
        Ok(address.to_string())
    }
}

/// `gateway + (tenant_id - subtract + 1)`, or `None` outside the IPv4 range.
pub fn derive_address(gateway: Ipv4Addr, tenant_id: i64, subtract: i64) -> Option<Ipv4Addr> {
    let offset = tenant_id.checked_sub(subtract)?.checked_add(1)?;
    let raw = i64::from(u32::from(gateway)).checked_add(offset)?;
    u32::try_from(raw).ok().map(Ipv4Addr::from)
}

/// Extract the gateway from a `network inspect` payload.
///
/// Newer runtimes report `subnets[0].gateway`; older CNI-based ones nest it
/// at `plugins[].ipam.ranges[0][0].gateway`. Both are accepted.
pub fn gateway_from_payload(payload: &Value) -> Result<String> {
    let net = payload
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| Error::parse(KIND, "inspect output is not a non-empty list"))?;

    if let Some(gateway) = non_empty(&net["subnets"][0]["gateway"]) {
        return Ok(gateway);
    }

    let plugins = net
        .get("plugins")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse(KIND, "neither subnets nor plugins carry a gateway"))?;

    plugins
        .iter()
        .filter(|plugin| plugin.get("ipam").is_some())
        .find_map(|plugin| non_empty(&plugin["ipam"]["ranges"][0][0]["gateway"]))
        .ok_or_else(|| Error::parse(KIND, "no ipam plugin reports a gateway"))
}

fn non_empty(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcessRunner, ProcessOutput};
    use serde_json::json;

    fn resolver(responses: Vec<ProcessOutput>) -> (NetworkResolver, MockProcessRunner) {
        let runner = MockProcessRunner::new(responses);
        (NetworkResolver::new(Arc::new(runner.clone()), "/usr/bin/podman"), runner)
    }

    fn subnets_payload(gateway: &str) -> String {
        json!([{ "name": "Customers", "subnets": [{ "subnet": "192.168.4.0/22", "gateway": gateway }] }])
            .to_string()
    }

    fn plugins_payload() -> String {
        json!([{
            "cniVersion": "0.4.0",
            "name": "Customers",
            "plugins": [
                { "type": "portmap" },
                { "type": "bridge", "ipam": { "ranges": [[{ "subnet": "10.89.0.0/24", "gateway": "10.89.0.1" }]] } }
            ]
        }])
        .to_string()
    }

    #[test]
    fn test_derive_address() {
        let gateway: Ipv4Addr = "192.168.4.1".parse().unwrap();
        assert_eq!(derive_address(gateway, 1000, 1000), Some(Ipv4Addr::new(192, 168, 4, 2)));
        assert_eq!(derive_address(gateway, 1100, 1000), Some(Ipv4Addr::new(192, 168, 4, 102)));
        // Crosses into the next /24; no subnet check.
        assert_eq!(derive_address(gateway, 1300, 1000), Some(Ipv4Addr::new(192, 168, 5, 46)));
        // Tenant ids below the subtract walk backwards from the gateway.
        assert_eq!(derive_address(gateway, 998, 1000), Some(Ipv4Addr::new(192, 168, 4, 0)));
    }

    #[test]
    fn test_derive_address_out_of_range() {
        assert_eq!(derive_address(Ipv4Addr::new(255, 255, 255, 254), 1001, 1000), None);
        assert_eq!(derive_address(Ipv4Addr::new(0, 0, 0, 1), 0, 1000), None);
        assert_eq!(derive_address(Ipv4Addr::new(10, 0, 0, 1), i64::MIN, 1), None);
    }

    #[test]
    fn test_gateway_prefers_subnets() {
        let payload = json!([{
            "subnets": [{ "gateway": "192.168.4.1" }],
            "plugins": [{ "ipam": { "ranges": [[{ "gateway": "10.89.0.1" }]] } }]
        }]);
        assert_eq!(gateway_from_payload(&payload).unwrap(), "192.168.4.1");
    }

    #[test]
    fn test_gateway_falls_back_to_ipam_plugin() {
        let payload: Value = serde_json::from_str(&plugins_payload()).unwrap();
        assert_eq!(gateway_from_payload(&payload).unwrap(), "10.89.0.1");

        let empty_subnet = json!([{
            "subnets": [{ "gateway": "" }],
            "plugins": [{ "ipam": { "ranges": [[{ "gateway": "10.89.0.1" }]] } }]
        }]);
        assert_eq!(gateway_from_payload(&empty_subnet).unwrap(), "10.89.0.1");
    }

    #[test]
    fn test_gateway_missing_is_parse_failure() {
        for payload in [
            json!([]),
            json!({ "subnets": [] }),
            json!([{ "name": "x" }]),
            json!([{ "plugins": [{ "type": "bridge" }] }]),
            json!([{ "plugins": [{ "ipam": { "ranges": [] } }] }]),
        ] {
            let err = gateway_from_payload(&payload).unwrap_err();
            assert!(err.is_parse_failure(), "{payload}: {err}");
        }
    }

    #[tokio::test]
    async fn test_address_for_invokes_network_inspect() {
        let (resolver, runner) = resolver(vec![ProcessOutput::ok(subnets_payload("192.168.4.1"))]);

        let address = resolver.address_for(1100, "Customers", 1000).await.unwrap();
        assert_eq!(address, "192.168.4.102");

        let calls = runner.recorded_calls().await;
        assert_eq!(calls, vec![vec!["/usr/bin/podman", "network", "inspect", "Customers"]]);
    }

    #[tokio::test]
    async fn test_address_for_with_plugin_schema() {
        let (resolver, _) = resolver(vec![ProcessOutput::ok(plugins_payload())]);
        assert_eq!(resolver.address_for(1005, "Customers", 1000).await.unwrap(), "10.89.0.7");
    }

    #[tokio::test]
    async fn test_empty_network_name_is_validation_failure() {
        let (resolver, runner) = resolver(vec![]);
        let err = resolver.gateway_of("").await.unwrap_err();
        assert!(err.is_validation_failure());
        assert!(runner.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_network_is_not_found() {
        let (resolver, _) = resolver(vec![ProcessOutput::failed(
            125,
            "Error: unable to find network with name or ID nope: network not found\n",
        )]);
        let err = resolver.gateway_of("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_bad_gateway_text_is_parse_failure() {
        let (resolver, _) = resolver(vec![ProcessOutput::ok(subnets_payload("fd00::1"))]);
        let err = resolver.address_for(1100, "v6", 1000).await.unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[tokio::test]
    async fn test_out_of_range_address_is_rejected() {
        let (resolver, _) = resolver(vec![ProcessOutput::ok(subnets_payload("255.255.255.250"))]);
        let err = resolver.address_for(1010, "Customers", 1000).await.unwrap_err();
        assert!(err.is_validation_failure());
    }
}
