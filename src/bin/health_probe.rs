//! Standalone dependency probe: app health route, static site, store REST root.
//! Exits 0 when every configured service answered HTTP 200, else 1.

use supabase_notion_sync::health_probe::{run_probe, targets_from_config, PROBE_TIMEOUT};
use supabase_notion_sync::telemetry::{init_tracing, DEFAULT_LOG_FILTER};
use supabase_notion_sync::BridgeConfig;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    // Report goes to stdout; logs stay on stderr.
    init_tracing(DEFAULT_LOG_FILTER, true);

    let cfg = match BridgeConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "invalid configuration");
            std::process::exit(1);
        }
    };

    let client = match reqwest::Client::builder().build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            std::process::exit(1);
        }
    };

    let report = run_probe(&client, &targets_from_config(&cfg), PROBE_TIMEOUT).await;
    print!("{}", report.render());
    std::process::exit(report.exit_code());
}
