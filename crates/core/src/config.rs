use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cgroup backend the runtime enforces resource limits with.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CgroupManager {
    #[default]
    Cgroupfs,
    Systemd,
}

impl CgroupManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cgroupfs => "cgroupfs",
            Self::Systemd => "systemd",
        }
    }
}

impl std::fmt::Display for CgroupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path of the runtime executable.
    pub binary: String,
    pub cgroup_manager: CgroupManager,
    /// Network the builder attaches to when none is given.
    pub default_network: String,
    /// Network tenant addresses are derived on.
    pub tenant_network: String,
    /// Tenant id that maps onto the first address after the gateway.
    pub tenant_subtract: i64,
    /// Unset means a runtime call may block indefinitely.
    pub command_timeout_secs: Option<u64>,
}

impl RuntimeConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "/usr/bin/podman".into(),
            cgroup_manager: CgroupManager::Cgroupfs,
            default_network: "podman".into(),
            tenant_network: "Customers".into(),
            tenant_subtract: 1000,
            command_timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> crate::Result<Self> {
        let env = std::env::var("CPCONTAINER_ENV").unwrap_or_else(|_| "production".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map CPCONTAINER__RUNTIME__BINARY=/opt/podman to runtime.binary
            .add_source(Environment::with_prefix("CPCONTAINER").separator("__"))
            .build()?;

        Self::from_config(s)
    }

    /// Deserialize an already-assembled source stack.
    pub fn from_config(config: Config) -> crate::Result<Self> {
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.runtime.binary, "/usr/bin/podman");
        assert_eq!(config.runtime.cgroup_manager, CgroupManager::Cgroupfs);
        assert_eq!(config.runtime.tenant_network, "Customers");
        assert_eq!(config.runtime.tenant_subtract, 1000);
        assert!(config.runtime.command_timeout().is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_runtime_section_keeps_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[runtime]\ncgroup_manager = \"systemd\"\ncommand_timeout_secs = 30\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.runtime.cgroup_manager, CgroupManager::Systemd);
        assert_eq!(config.runtime.command_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.runtime.binary, "/usr/bin/podman");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_unknown_cgroup_manager_is_config_error() {
        let source = Config::builder()
            .add_source(config::File::from_str(
                "[runtime]\ncgroup_manager = \"lxc\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let err = AppConfig::from_config(source).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)), "{err:?}");
    }
}
