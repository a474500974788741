//! Structured logging setup.
//!
//! `RUST_LOG` always wins when set; otherwise the `--log-level` CLI flag
//! picks a blanket filter level.

/// Initialize the global `tracing` subscriber. Safe to call once at process
/// startup; a second call is a no-op (`try_init` swallows the "already set"
/// error).
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
