//! High-level operations over the container runtime.
//!
//! [`Podman`] is stateless apart from its injected configuration and runner.
//! Every operation maps to exactly one runtime invocation, except those that
//! create a resource, which follow up with an `inspect` of the printed id.

use std::sync::Arc;

use cpcontainer_core::{Error, Result, RuntimeConfig};

use crate::builder::Builder;
use crate::entities::{Container, InspectRecord, Pod};
use crate::network::NetworkResolver;
use crate::process::{ProcessOutput, ProcessRunner, TokioProcessRunner};

/// Map a failed invocation to [`Error::NotFound`] when the runtime says the
/// resource is absent, otherwise to [`Error::Invocation`].
pub(crate) fn classify_failure(
    kind: &'static str,
    name: &str,
    args: &[String],
    output: &ProcessOutput,
) -> Error {
    let stderr = output.stderr.to_lowercase();
    if stderr.contains("no such") || stderr.contains("not found") {
        tracing::warn!(kind, name = %name, "Runtime reports resource absent");
        Error::not_found(kind, name, &output.stderr)
    } else {
        tracing::warn!(kind, name = %name, exit_code = ?output.exit_code, "Runtime invocation failed");
        Error::invocation(args, output.exit_code, &output.stderr)
    }
}

/// Identifier a create-style command printed on stdout.
pub(crate) fn printed_id<'a>(
    kind: &'static str,
    args: &[String],
    output: &'a ProcessOutput,
) -> Result<&'a str> {
    let id = output.stdout.trim();
    if id.is_empty() {
        return Err(Error::parse(
            kind,
            format!("`{}` printed no identifier", args.join(" ")),
        ));
    }
    Ok(id)
}

/// Container runtime facade.
#[derive(Clone)]
pub struct Podman {
    runner: Arc<dyn ProcessRunner>,
    config: RuntimeConfig,
}

impl Podman {
    /// Create a facade that spawns the configured runtime binary.
    pub fn new(config: RuntimeConfig) -> Self {
        let runner = TokioProcessRunner::new().with_timeout(config.command_timeout());
        Self::with_runner(Arc::new(runner), config)
    }

    /// Create a facade over an existing runner (for testing).
    pub fn with_runner(runner: Arc<dyn ProcessRunner>, config: RuntimeConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    /// A command builder seeded from this facade's configuration.
    pub fn builder(&self) -> Builder {
        Builder::new(&self.config)
    }

    /// Network lookups through the same runner.
    pub fn network(&self) -> NetworkResolver {
        NetworkResolver::new(self.runner.clone(), self.config.binary.clone())
    }

    fn command<'a>(&self, parts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        std::iter::once(self.config.binary.clone())
            .chain(parts.into_iter().map(str::to_string))
            .collect()
    }

    async fn exists(&self, kind: &'static str, name: &str) -> Result<bool> {
        require_name(kind, name)?;
        let args = match kind {
            "pod" => self.command(["pod", "exists", name]),
            _ => self.command(["container", "exists", name]),
        };

        // Exit 1 is the runtime's "does not exist"; anything else nonzero is an error.
        let output = self.runner.run(&args).await?;
        match output.exit_code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Error::invocation(&args, output.exit_code, output.stderr)),
        }
    }

    async fn inspect_as<T: InspectRecord>(&self, name: &str, args: Vec<String>) -> Result<T> {
        let output = self.runner.run(&args).await?;
        if !output.success() {
            return Err(classify_failure(T::KIND, name, &args, &output));
        }
        T::from_json(&output.stdout)
    }

    // =========================================================================
    // Containers
    // =========================================================================

    /// Whether a container with this name or id exists.
    pub async fn container_exists(&self, name: &str) -> Result<bool> {
        self.exists("container", name).await
    }

    /// Full state of a container.
    pub async fn inspect(&self, name: &str) -> Result<Container> {
        require_name("container", name)?;
        let args = self.command(["inspect", "--type", "container", name]);
        self.inspect_as(name, args).await
    }

    /// Re-inspect a previously hydrated container in place.
    pub async fn reload(&self, container: &mut Container) -> Result<()> {
        require_loaded(container)?;
        *container = self.inspect(&container.id).await?;
        Ok(())
    }

    /// `container run --name <name> <args...> <image> <cmd...>`, then inspect.
    pub async fn create_container(
        &self,
        name: &str,
        image: &str,
        args: &[String],
        cmd: &[String],
    ) -> Result<Container> {
        require_name("container", name)?;
        if image.is_empty() {
            return Err(Error::validation("image must not be empty"));
        }

        let mut argv = self.command(["container", "run", "--name", name]);
        argv.extend(args.iter().cloned());
        argv.push(image.to_string());
        argv.extend(cmd.iter().cloned());

        let output = self.runner.run_checked(&argv).await?;
        let id = printed_id("container", &argv, &output)?;
        tracing::info!(container = %name, id = %id, image = %image, "Container created");
        self.inspect(id).await
    }

    async fn container_verb(&self, verb: &str, id: &str) -> Result<()> {
        require_name("container", id)?;
        let args = self.command([verb, id]);
        let output = self.runner.run(&args).await?;
        if !output.success() {
            return Err(classify_failure("container", id, &args, &output));
        }
        tracing::info!(container = %id, action = verb, "Container lifecycle command completed");
        Ok(())
    }

    pub async fn start(&self, id: &str) -> Result<()> {
        self.container_verb("start", id).await
    }

    pub async fn stop(&self, id: &str) -> Result<()> {
        self.container_verb("stop", id).await
    }

    pub async fn kill(&self, id: &str) -> Result<()> {
        self.container_verb("kill", id).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.container_verb("rm", id).await
    }

    pub async fn pause(&self, id: &str) -> Result<()> {
        self.container_verb("pause", id).await
    }

    pub async fn unpause(&self, id: &str) -> Result<()> {
        self.container_verb("unpause", id).await
    }

    pub async fn restart(&self, id: &str) -> Result<()> {
        self.container_verb("restart", id).await
    }

    /// Remove all stopped containers, returning their ids.
    pub async fn prune_containers(&self) -> Result<Vec<String>> {
        let args = self.command(["container", "prune", "--force"]);
        let output = self.runner.run_checked(&args).await?;
        Ok(output_lines(&output))
    }

    // =========================================================================
    // Pods
    // =========================================================================

    pub async fn pod_exists(&self, name: &str) -> Result<bool> {
        self.exists("pod", name).await
    }

    pub async fn pod_inspect(&self, name: &str) -> Result<Pod> {
        require_name("pod", name)?;
        let args = self.command(["pod", "inspect", name]);
        self.inspect_as(name, args).await
    }

    /// `pod create --name <name> <args...>`, then inspect.
    pub async fn create_pod(&self, name: &str, args: &[String]) -> Result<Pod> {
        require_name("pod", name)?;
        let mut argv = self.command(["pod", "create", "--name", name]);
        argv.extend(args.iter().cloned());

        let output = self.runner.run_checked(&argv).await?;
        let id = printed_id("pod", &argv, &output)?;
        tracing::info!(pod = %name, id = %id, "Pod created");
        self.pod_inspect(id).await
    }

    async fn pod_verb(&self, verb: &str, name: &str) -> Result<()> {
        require_name("pod", name)?;
        let args = self.command(["pod", verb, name]);
        self.runner.run_checked(&args).await?;
        tracing::info!(pod = %name, action = verb, "Pod lifecycle command completed");
        Ok(())
    }

    pub async fn pod_start(&self, name: &str) -> Result<()> {
        self.pod_verb("start", name).await
    }

    pub async fn pod_stop(&self, name: &str) -> Result<()> {
        self.pod_verb("stop", name).await
    }

    pub async fn pod_kill(&self, name: &str) -> Result<()> {
        self.pod_verb("kill", name).await
    }

    pub async fn pod_remove(&self, name: &str) -> Result<()> {
        self.pod_verb("rm", name).await
    }

    pub async fn pod_pause(&self, name: &str) -> Result<()> {
        self.pod_verb("pause", name).await
    }

    pub async fn pod_unpause(&self, name: &str) -> Result<()> {
        self.pod_verb("unpause", name).await
    }

    pub async fn pod_restart(&self, name: &str) -> Result<()> {
        self.pod_verb("restart", name).await
    }

    /// Remove all stopped pods, returning their ids.
    pub async fn prune_pods(&self) -> Result<Vec<String>> {
        let args = self.command(["pod", "prune", "--force"]);
        let output = self.runner.run_checked(&args).await?;
        Ok(output_lines(&output))
    }

    // =========================================================================
    // Networks
    // =========================================================================

    pub async fn gateway_of(&self, network: &str) -> Result<String> {
        self.network().gateway_of(network).await
    }

    /// Address for `tenant_id`, defaulting to the configured tenant network
    /// and subtract constant.
    pub async fn tenant_address(
        &self,
        tenant_id: i64,
        network: Option<&str>,
        subtract: Option<i64>,
    ) -> Result<String> {
        let network = network.unwrap_or(self.config.tenant_network.as_str());
        let subtract = subtract.unwrap_or(self.config.tenant_subtract);
        self.network().address_for(tenant_id, network, subtract).await
    }
}

fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("{} name must not be empty", kind)));
    }
    Ok(())
}

fn require_loaded(container: &Container) -> Result<()> {
    if !container.is_loaded() {
        return Err(Error::validation("container has not been loaded from the runtime"));
    }
    Ok(())
}

fn output_lines(output: &ProcessOutput) -> Vec<String> {
    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
