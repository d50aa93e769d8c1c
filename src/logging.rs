//! Tracing subscriber setup.
//!
//! All logs go to stderr so `pgrag store` and `pgrag ask` can print results
//! on stdout. The filter comes from `RUST_LOG` (default `info`). Production
//! emits one JSON object per line; other environments get the human-readable
//! format.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::RuntimeEnv;

pub fn init_logging(env: RuntimeEnv) -> Result<()> {
    let filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_new(&filter_str).map_err(|e| anyhow!("Invalid log filter: {}", e))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match env {
        RuntimeEnv::Production => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        RuntimeEnv::Development | RuntimeEnv::Test => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(std::env::var("NO_COLOR").is_err()),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to init logging: {}", e))
}
