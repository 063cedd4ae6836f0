use std::error::Error;

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides `--log-level`.
pub const LOG_ENV: &str = "ROI_LOG";

/// Installs the global subscriber; logs go to stderr so stdout stays parseable.
pub fn init_logging(level: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| level.to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|err| format!("failed to initialize logging: {err}"))?;
    debug!(level = level.as_str(), json, "logging initialized");
    Ok(())
}
