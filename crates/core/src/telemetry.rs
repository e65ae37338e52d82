//! Tracing subscriber configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::{Error, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Fails if a subscriber is
/// already installed.
pub fn configure_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| logging.filter.clone()),
    );

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| Error::Other(anyhow::anyhow!("Failed to install tracing subscriber: {}", e)))
}
