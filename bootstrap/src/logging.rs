//! Log output for the bootstrap pipeline and the `chainload` binary.
//!
//! Every event carries structured fields rather than formatted text:
//! `stage` on stage entry, `attempt` on loader events,
//! `path` on store open and removal, and `height` whenever the chain head
//! moves. [`LogFormat::Json`] flattens those fields into top-level JSON keys so a single
//! attempt can be followed with `jq 'select(.attempt == 3)'`.
//! [`LogFormat::Human`] prints the same fields inline and names the thread,
//! which tells the `chain-bootstrap-N` worker apart from the foreground.
//!
//! `RUST_LOG` takes precedence over the configured `log_level`, e.g.
//! `RUST_LOG=chainload_store_lmdb=debug` to trace store probes only.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The `log_format` config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    /// `"human"` (or `"text"`) and `"json"`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Install the process-wide subscriber. Call once, before the first attempt
/// is started.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let events = fmt::layer().with_target(true).with_thread_names(true);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Human => registry.with(events).init(),
        LogFormat::Json => registry.with(events.json().flatten_event(true)).init(),
    }
}
