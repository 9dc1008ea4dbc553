// Tracing initialization with a configurable and reloadable log level.
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Log `devscope_*` crates at `info`, dependencies at `warn`.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let (reload_layer, handle) = reload::Layer::new(build_filter(level));
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Apply the configured level at runtime. `RUST_LOG`, when set, keeps
/// precedence.
pub fn apply_logging_level(level: &str) {
    if let Some(handle) = LOG_RELOAD_HANDLE.get() {
        let _ = handle.modify(|f| {
            *f = build_filter(level);
        });
    }
}

fn build_filter(level: &str) -> EnvFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(directives(level)))
}

/// The configured level applies to the `devscope_*` crates; dependencies
/// (hyper, reqwest, tower-http) stay at `warn` unless logging is off.
fn directives(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    if level == "off" {
        return level;
    }
    format!("warn,devscope={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_targets_devscope_crates() {
        assert_eq!(directives("debug"), "warn,devscope=debug");
        assert_eq!(directives(" INFO "), "warn,devscope=info");
        assert_eq!(directives("off"), "off");
        assert!(EnvFilter::try_new(directives("trace")).is_ok());
    }
}
