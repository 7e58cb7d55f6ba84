//! Tracing subscriber setup shared by the server, the worker and the bot

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Default directives when `RUST_LOG` is not set
pub fn default_directives(config: &LoggingConfig, target: &str) -> String {
    let mut directives = format!("library_service={},tower_http=debug", config.level);
    if target != "library_service" {
        directives.push_str(&format!(",{}={}", target, config.level));
    }
    directives
}

/// Install the global subscriber. `target` is the calling binary's crate name.
pub fn init_tracing(config: &LoggingConfig, target: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(config, target).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_str() {
        "json" => registry.with(fmt::layer().json()).init(),
        _ => registry.with(fmt::layer()).init(),
    }
}
