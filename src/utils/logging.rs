//! tracing subscriber setup for hosts that do not install their own.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,texture_resolver=debug";

/// Installs a stderr fmt subscriber. `RUST_LOG` takes precedence over `default_filter`.
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_logging(default_filter: &str) -> Result<(), String> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| e.to_string())?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::debug!("logging initialized");
    Ok(())
}
