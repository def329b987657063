//! Telemetry initialization (logging)

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging to stderr. `RUST_LOG` takes precedence over `log_level`.
pub fn init_telemetry(log_level: &str, json_logs: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("Failed to create environment filter")?;

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    }

    Ok(())
}
