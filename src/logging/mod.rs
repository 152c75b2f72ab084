//! Logging setup
//!
//! One `tracing` subscriber for the binary. `RUST_LOG` wins when set;
//! otherwise the crate logs at the requested level and dependencies at
//! `warn`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::types::{HostwayError, Result};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("hostway={},warn", level.trim().to_ascii_lowercase())
}

/// Install the global subscriber
pub fn init(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| HostwayError::Config(format!("failed to install logger: {}", e)))
}

/// Log a per-request decision at `debug`, or `info` when the stored debug flag is on
#[macro_export]
macro_rules! decision {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            ::tracing::info!($($arg)+)
        } else {
            ::tracing::debug!($($arg)+)
        }
    };
}
