//! Fluent assembly of runtime command lines.
//!
//! A [`Builder`] collects flag tokens in call order and lays them out as
//!
//! ```text
//! binary --cgroup-manager <mgr> <action> <flags...> (--rootfs <path> | <image>) <command...>
//! ```
//!
//! Setters never fail. [`Builder::build`] is the dry run; [`Builder::execute`]
//! hands the vector to the runtime and inspects the container it printed.

use std::fmt::Display;

use cpcontainer_core::{CgroupManager, Error, Result, RuntimeConfig};

use crate::entities::Container;
use crate::podman::{printed_id, Podman};

/// Verb passed to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Run,
    Create,
    Start,
    Stop,
    Restart,
    Kill,
    Rm,
    Pause,
    Unpause,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Create => "create",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Kill => "kill",
            Self::Rm => "rm",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
        }
    }

    /// Whether the runtime answers this verb with the id of a live container.
    pub fn reports_container(&self) -> bool {
        matches!(self, Self::Run | Self::Create | Self::Start)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulates runtime flags for a single invocation.
#[derive(Debug, Clone)]
pub struct Builder {
    binary: String,
    cgroup_manager: CgroupManager,
    action: Action,
    args: Vec<String>,
    image: String,
    rootfs: String,
    command: Vec<String>,
    name: String,
    network: String,
}

impl Builder {
    /// Create a builder seeded with the runtime binary, cgroup manager and
    /// default network from `config`.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            cgroup_manager: config.cgroup_manager,
            action: Action::Run,
            args: Vec::new(),
            image: String::new(),
            rootfs: String::new(),
            command: Vec::new(),
            name: String::new(),
            network: config.default_network.clone(),
        }
    }

    fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    fn option(mut self, flag: &str, value: impl Display) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    fn pair(self, flag: &str, left: impl Display, sep: char, right: impl Display) -> Self {
        self.option(flag, format!("{}{}{}", left, sep, right))
    }

    // =========================================================================
    // Positional settings
    // =========================================================================

    /// Override the cgroup manager for this invocation.
    pub fn cgroup_manager(mut self, manager: CgroupManager) -> Self {
        self.cgroup_manager = manager;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Use an extracted filesystem tree instead of an image. Takes precedence
    /// over [`Builder::image`].
    pub fn rootfs(mut self, rootfs: impl Into<String>) -> Self {
        self.rootfs = rootfs.into();
        self
    }

    /// Command and arguments placed after the image.
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    // =========================================================================
    // Toggles
    // =========================================================================

    pub fn interactive(self) -> Self {
        self.flag("-i")
    }

    pub fn tty(self) -> Self {
        self.flag("-t")
    }

    pub fn daemon(self) -> Self {
        self.flag("-d")
    }

    /// Same as [`Builder::daemon`], long form.
    pub fn detach(self) -> Self {
        self.flag("--detach")
    }

    /// Remove the container when it exits.
    pub fn remove(self) -> Self {
        self.flag("--rm")
    }

    /// Replace an existing container of the same name.
    pub fn replace(self) -> Self {
        self.flag("--replace")
    }

    // =========================================================================
    // Identity and placement
    // =========================================================================

    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = name.clone();
        self.option("--name", name)
    }

    pub fn hostname(self, hostname: impl Display) -> Self {
        self.option("--hostname", hostname)
    }

    pub fn pod(self, pod: impl Display) -> Self {
        self.option("--pod", pod)
    }

    pub fn user(self, user: impl Display) -> Self {
        self.option("--user", user)
    }

    pub fn group(self, group: impl Display) -> Self {
        self.option("--group", group)
    }

    pub fn workdir(self, workdir: impl Display) -> Self {
        self.option("--workdir", workdir)
    }

    pub fn restart(self, policy: impl Display) -> Self {
        self.option("--restart", policy)
    }

    pub fn cgroup_parent(self, parent: impl Display) -> Self {
        self.option("--cgroup-parent", parent)
    }

    pub fn label(self, label: impl Display) -> Self {
        self.option("--label", label)
    }

    pub fn label_file(self, path: impl Display) -> Self {
        self.option("--label-file", path)
    }

    pub fn log_driver(self, driver: impl Display) -> Self {
        self.option("--log-driver", driver)
    }

    pub fn log_opt(self, opt: impl Display) -> Self {
        self.option("--log-opt", opt)
    }

    // =========================================================================
    // Storage and environment
    // =========================================================================

    pub fn env(self, key: impl Display, value: impl Display) -> Self {
        self.pair("-e", key, '=', value)
    }

    /// Bind `source` on the host to `destination` in the container.
    pub fn volume(self, source: impl Display, destination: impl Display) -> Self {
        self.pair("-v", source, ':', destination)
    }

    /// Raw `--mount` value, e.g. `type=tmpfs,destination=/tmp`.
    pub fn mount(self, mount: impl Display) -> Self {
        self.option("--mount", mount)
    }

    // =========================================================================
    // Networking
    // =========================================================================

    /// Publish host port `host` as container port `container`.
    pub fn port(self, host: impl Display, container: impl Display) -> Self {
        self.pair("-p", host, ':', container)
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        let network = network.into();
        self.network = network.clone();
        self.option("--network", network)
    }

    pub fn ip(self, ip: impl Display) -> Self {
        self.option("--ip", ip)
    }

    /// Pin the container to the address derived for `tenant_id` on this
    /// builder's network.
    pub async fn tenant_ip(self, podman: &Podman, tenant_id: i64, subtract: i64) -> Result<Self> {
        let address = podman
            .network()
            .address_for(tenant_id, &self.network, subtract)
            .await?;
        Ok(self.ip(address))
    }

    // =========================================================================
    // Resource limits
    // =========================================================================

    pub fn memory(self, limit: impl Display) -> Self {
        self.option("--memory", limit)
    }

    pub fn memory_reservation(self, limit: impl Display) -> Self {
        self.option("--memory-reservation", limit)
    }

    pub fn memory_swap(self, limit: impl Display) -> Self {
        self.option("--memory-swap", limit)
    }

    pub fn memory_swappiness(self, swappiness: impl Display) -> Self {
        self.option("--memory-swappiness", swappiness)
    }

    pub fn kernel_memory(self, limit: impl Display) -> Self {
        self.option("--kernel-memory", limit)
    }

    pub fn cpu_shares(self, shares: impl Display) -> Self {
        self.option("--cpu-shares", shares)
    }

    pub fn cpu_period(self, period: impl Display) -> Self {
        self.option("--cpu-period", period)
    }

    pub fn cpu_quota(self, quota: impl Display) -> Self {
        self.option("--cpu-quota", quota)
    }

    pub fn cpu_rt_period(self, period: impl Display) -> Self {
        self.option("--cpu-rt-period", period)
    }

    pub fn cpu_rt_runtime(self, runtime: impl Display) -> Self {
        self.option("--cpu-rt-runtime", runtime)
    }

    pub fn cpus(self, cpus: impl Display) -> Self {
        self.option("--cpus", cpus)
    }

    pub fn cpuset_cpus(self, cpus: impl Display) -> Self {
        self.option("--cpuset-cpus", cpus)
    }

    pub fn cpuset_mems(self, mems: impl Display) -> Self {
        self.option("--cpuset-mems", mems)
    }

    pub fn blkio_weight(self, weight: impl Display) -> Self {
        self.option("--blkio-weight", weight)
    }

    pub fn blkio_weight_device(self, device: impl Display, weight: impl Display) -> Self {
        self.pair("--blkio-weight-device", device, ':', weight)
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Container name set through [`Builder::name`], empty if none.
    pub fn container_name(&self) -> &str {
        &self.name
    }

    /// Assemble the argument vector without running it.
    pub fn build(&self) -> Vec<String> {
        let mut cmd = Vec::with_capacity(self.args.len() + self.command.len() + 6);
        cmd.push(self.binary.clone());
        cmd.push("--cgroup-manager".to_string());
        cmd.push(self.cgroup_manager.to_string());
        cmd.push(self.action.to_string());
        cmd.extend(self.args.iter().cloned());

        if !self.rootfs.is_empty() {
            cmd.push("--rootfs".to_string());
            cmd.push(self.rootfs.clone());
        } else if !self.image.is_empty() {
            cmd.push(self.image.clone());
        }

        cmd.extend(self.command.iter().cloned());
        cmd
    }

    /// Run the assembled command and inspect the container it reports.
    ///
    /// The runtime prints only the container id; the returned state comes
    /// from a follow-up `inspect`. Only `run`, `create` and `start` are
    /// accepted; the other verbs go through the [`Podman`] lifecycle methods.
    pub async fn execute(&self, podman: &Podman) -> Result<Container> {
        if !self.action.reports_container() {
            return Err(Error::validation(format!(
                "`{}` does not produce a container to inspect",
                self.action
            )));
        }

        let args = self.build();
        let output = podman.runner().run_checked(&args).await?;
        let id = printed_id("container", &args, &output)?;

        tracing::info!(action = %self.action, container = %id, "Container command completed");
        podman.inspect(id).await
    }

    /// `run` the container.
    pub async fn run(self, podman: &Podman) -> Result<Container> {
        self.action(Action::Run).execute(podman).await
    }

    /// `create` the container without starting it.
    pub async fn create(self, podman: &Podman) -> Result<Container> {
        self.action(Action::Create).execute(podman).await
    }

    /// `start` an existing container.
    pub async fn start(self, podman: &Podman) -> Result<Container> {
        self.action(Action::Start).execute(podman).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> Builder {
        Builder::new(&RuntimeConfig::default())
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_golden_vector() {
        let args = builder().name("x").image("y").port("80", "443").build();
        assert_eq!(
            args,
            argv(&["/usr/bin/podman", "--cgroup-manager", "cgroupfs", "run", "--name", "x", "-p", "80:443", "y"])
        );
    }

    #[test]
    fn test_full_golden_vector() {
        let args = builder()
            .name("test")
            .image("test")
            .ip("192.168.4.101")
            .port(80, 443)
            .volume("/var/www/htmls", "/var/www/htmld")
            .env("TEST", "test")
            .user("testuser")
            .group("testgroup")
            .memory(1024)
            .cpus(1)
            .cpu_shares(1024)
            .cpu_period(100000)
            .cpu_quota(50000)
            .cpuset_cpus("0-1")
            .cpuset_mems("0")
            .blkio_weight(500)
            .blkio_weight_device("/dev/sda", 500)
            .action(Action::Run)
            .cgroup_manager(CgroupManager::Cgroupfs)
            .build();

        assert_eq!(
            args,
            argv(&[
                "/usr/bin/podman",
                "--cgroup-manager",
                "cgroupfs",
                "run",
                "--name",
                "test",
                "--ip",
                "192.168.4.101",
                "-p",
                "80:443",
                "-v",
                "/var/www/htmls:/var/www/htmld",
                "-e",
                "TEST=test",
                "--user",
                "testuser",
                "--group",
                "testgroup",
                "--memory",
                "1024",
                "--cpus",
                "1",
                "--cpu-shares",
                "1024",
                "--cpu-period",
                "100000",
                "--cpu-quota",
                "50000",
                "--cpuset-cpus",
                "0-1",
                "--cpuset-mems",
                "0",
                "--blkio-weight",
                "500",
                "--blkio-weight-device",
                "/dev/sda:500",
                "test",
            ])
        );
    }

    #[test]
    fn test_rootfs_wins_over_image_and_command_trails() {
        let args = builder()
            .action(Action::Create)
            .image("fedora")
            .rootfs("/home/u/rootfs")
            .daemon()
            .remove()
            .command(["/usr/bin/sleep", "10"])
            .build();

        assert_eq!(
            args,
            argv(&[
                "/usr/bin/podman",
                "--cgroup-manager",
                "cgroupfs",
                "create",
                "-d",
                "--rm",
                "--rootfs",
                "/home/u/rootfs",
                "/usr/bin/sleep",
                "10",
            ])
        );
    }

    #[test]
    fn test_configuration_seeds_binary_and_cgroup_manager() {
        let config = RuntimeConfig {
            binary: "/opt/bin/podman".into(),
            cgroup_manager: CgroupManager::Systemd,
            ..RuntimeConfig::default()
        };
        let args = Builder::new(&config).action(Action::Start).build();
        assert_eq!(args, argv(&["/opt/bin/podman", "--cgroup-manager", "systemd", "start"]));
    }

    #[test]
    fn test_flags_keep_call_order() {
        let args = builder()
            .interactive()
            .tty()
            .replace()
            .detach()
            .network("Customers")
            .hostname("h")
            .label("tenant=1100")
            .label_file("/etc/labels")
            .log_driver("journald")
            .log_opt("tag=web")
            .restart("on-failure")
            .pod("p1")
            .cgroup_parent("/tenants/1100")
            .workdir("/srv")
            .mount("type=tmpfs,destination=/tmp")
            .memory_reservation("256m")
            .memory_swap("1g")
            .memory_swappiness(10)
            .kernel_memory("64m")
            .cpu_rt_period(1000)
            .cpu_rt_runtime(950)
            .build();

        assert_eq!(
            &args[4..],
            argv(&[
                "-i",
                "-t",
                "--replace",
                "--detach",
                "--network",
                "Customers",
                "--hostname",
                "h",
                "--label",
                "tenant=1100",
                "--label-file",
                "/etc/labels",
                "--log-driver",
                "journald",
                "--log-opt",
                "tag=web",
                "--restart",
                "on-failure",
                "--pod",
                "p1",
                "--cgroup-parent",
                "/tenants/1100",
                "--workdir",
                "/srv",
                "--mount",
                "type=tmpfs,destination=/tmp",
                "--memory-reservation",
                "256m",
                "--memory-swap",
                "1g",
                "--memory-swappiness",
                "10",
                "--kernel-memory",
                "64m",
                "--cpu-rt-period",
                "1000",
                "--cpu-rt-runtime",
                "950",
            ])
            .as_slice()
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let b = builder().name("x").image("y").env("A", "1").command(["sh"]);
        assert_eq!(b.build(), b.build());
        assert_eq!(b.container_name(), "x");
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Rm.to_string(), "rm");
        assert_eq!(Action::Unpause.as_str(), "unpause");
        assert_eq!(Action::default(), Action::Run);
        assert!(Action::Start.reports_container());
        assert!(!Action::Rm.reports_container());
    }

    #[tokio::test]
    async fn test_execute_rejects_teardown_actions() {
        let runner = crate::process::MockProcessRunner::new(vec![]);
        let podman = Podman::with_runner(std::sync::Arc::new(runner.clone()), RuntimeConfig::default());

        for action in [Action::Stop, Action::Kill, Action::Rm, Action::Pause, Action::Unpause, Action::Restart] {
            let err = builder().name("web").action(action).execute(&podman).await.unwrap_err();
            assert!(err.is_validation_failure(), "{action}: {err:?}");
        }
        assert!(runner.recorded_calls().await.is_empty());
    }
}
