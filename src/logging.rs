//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Applications that want
//! them on stdout call [`init`] once at startup with their
//! [`LoggingConfig`]; nothing is installed implicitly.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static INIT: OnceLock<bool> = OnceLock::new();

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` overrides `config.level`. Safe to call multiple times: only
/// the first call has effect. Returns `false` when another global
/// subscriber was already installed by someone else.
pub fn init(config: &LoggingConfig) -> bool {
    *INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(config.ansi))
            .try_init()
            .is_ok()
    })
}
