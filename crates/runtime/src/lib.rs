#![deny(unused)]
//! Container runtime orchestration for cpcontainer.
//!
//! This crate turns structured intents into invocations of the podman
//! executable and turns its JSON output back into typed records.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │  Transport shims (stdin, panel API)    │
//! │    ↓ Podman::dispatch(command, args)   │
//! ├────────────────────────────────────────┤
//! │  Podman facade / Builder               │
//! │    ↓ argument vectors                  │
//! ├────────────────────────────────────────┤
//! │  ProcessRunner (tokio::process)        │
//! │    ↓ stdout / stderr / exit code       │
//! ├────────────────────────────────────────┤
//! │  Entities (Container, Pod, ...)        │
//! └────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use cpcontainer_runtime::Podman;
//!
//! let podman = Podman::new(config.runtime.clone());
//! let container = podman
//!     .builder()
//!     .name("tenant-1100")
//!     .network("Customers")
//!     .tenant_ip(&podman, 1100, 1000)
//!     .await?
//!     .daemon()
//!     .image("registry.fedoraproject.org/fedora:latest")
//!     .run(&podman)
//!     .await?;
//! ```

pub mod builder;
pub mod dispatch;
pub mod entities;
pub mod network;
pub mod podman;
pub mod process;

pub use builder::{Action, Builder};
pub use entities::{Container, ContainerState, InspectRecord, NetworkAttachment, NetworkSettings, Pod, PodMember};
pub use network::{derive_address, NetworkResolver};
pub use podman::Podman;
pub use process::{MockProcessRunner, ProcessOutput, ProcessRunner, TokioProcessRunner};
