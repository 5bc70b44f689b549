// src/telemetry.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "supabase_notion_sync=info,tower_http=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`;
/// `LOG_FORMAT=json` switches to JSON lines. A second call leaves the first subscriber in place.
pub fn init_tracing(default_filter: &str, to_stderr: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = match (json, to_stderr) {
        (true, false) => registry.with(fmt::layer().json()).try_init(),
        (true, true) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (false, false) => registry.with(fmt::layer().compact()).try_init(),
        (false, true) => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
