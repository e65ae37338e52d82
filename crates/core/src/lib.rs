#![deny(unused)]
//! Core error, configuration and logging definitions for cpcontainer.
//!
//! This crate provides the building blocks shared by the runtime layer and
//! the operator binary.

pub mod config;
pub mod error;
pub mod telemetry;

pub use crate::config::{AppConfig, CgroupManager, LoggingConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use telemetry::configure_tracing;
