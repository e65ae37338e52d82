#![deny(unused)]
//! cpcontainer - container runtime orchestration for control-panel hosts.
//!
//! Operator entry point: `cpcontainer <command> [json-args]`. Runs one
//! dispatch command against the configured runtime and prints the JSON
//! result on stdout. Logs go to stderr.

use cpcontainer_core::AppConfig;
use cpcontainer_runtime::{dispatch::COMMANDS, Podman};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    cpcontainer_core::configure_tracing(&config.logging)?;

    let mut argv = std::env::args().skip(1);
    let Some(command) = argv.next() else {
        eprintln!("usage: cpcontainer <command> [json-args]");
        eprintln!("commands: {}", COMMANDS.join(", "));
        std::process::exit(2);
    };
    let args = match argv.next() {
        Some(raw) => serde_json::from_str(&raw)?,
        None => serde_json::Value::Null,
    };

    tracing::debug!(
        binary = %config.runtime.binary,
        cgroup_manager = %config.runtime.cgroup_manager,
        "Starting cpcontainer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let podman = Podman::new(config.runtime.clone());
    let result = podman.dispatch(&command, args).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
