//! Log output setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the embedding program, which may call [`init`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns `false` if a global
/// subscriber was already installed.
pub fn init(settings: &LoggingSettings) -> bool {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(settings.ansi))
        .try_init()
        .is_ok()
}
