use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Env;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "kliksy_gate=debug,reqwest=info";

/// init_tracing
///
/// Installs the global subscriber. `RUST_LOG` wins over the default filter.
/// Local runs get pretty, human-readable output; production emits JSON for log aggregation.
///
/// Uses `try_init`, so a second call (e.g. from several tests) is a no-op instead of a panic.
pub fn init_tracing(env: &Env) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let result = match env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
