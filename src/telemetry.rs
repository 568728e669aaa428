//! Logging setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` directives win over `log_level`. `format` is `json` for
/// line-delimited JSON, anything else for human-readable text.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(log_level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        "json" => subscriber
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(anyhow::Error::msg)?,
        _ => subscriber.try_init().map_err(anyhow::Error::msg)?,
    }

    Ok(())
}
