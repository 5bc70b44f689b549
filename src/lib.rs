// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod guard;
pub mod health_probe;
pub mod metrics;
pub mod publish;
pub mod scheduler;
pub mod source;
pub mod sync;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::BridgeConfig;
pub use crate::publish::{map_record, NotionPublisher, PagePublisher, PageProperties};
pub use crate::source::{Record, RecordId, RecordSource, SupabaseSource, BATCH_SIZE};
pub use crate::sync::{sync_batch, SyncError, SyncJob, SyncResult, Trigger};

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One pooled client shared by the store source and the page publisher.
pub fn build_http_client(cfg: &BridgeConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("supabase-notion-sync/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4).min(cfg.http_timeout()))
        .timeout(cfg.http_timeout())
        .build()
        .context("building http client")
}

/// Wire the Supabase source and Notion publisher into a job.
pub fn build_sync_job(cfg: &BridgeConfig, client: reqwest::Client) -> Arc<SyncJob> {
    let source = SupabaseSource::from_config(cfg, client.clone());
    let publisher = NotionPublisher::from_config(cfg, client);

    // Safe diagnostics: presence only, never the secrets themselves.
    info!(
        table = source.table(),
        supabase_url = cfg.supabase_url.is_some(),
        supabase_key = cfg.supabase_key.is_some(),
        notion_token = cfg.notion_token.is_some(),
        notion_database_id = cfg.notion_database_id.is_some(),
        single_flight = cfg.single_flight,
        "sync job configured"
    );

    Arc::new(
        SyncJob::new(Arc::new(source), Arc::new(publisher)).with_single_flight(cfg.single_flight),
    )
}
