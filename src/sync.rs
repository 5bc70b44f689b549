// src/sync.rs
//! Sync job: pull the latest batch from the record source and create one page
//! per record. Publish failures are isolated per record; a fetch failure fails
//! the whole run.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::guard::SingleFlight;
use crate::publish::{map_record, PagePublisher};
use crate::source::RecordSource;

/// Summary of one run. `records_processed` is the fetched count, whatever
/// happened to individual publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub records_processed: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync already in progress")]
    AlreadyRunning,
    /// Source fetch failed; nothing was published.
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),
}

/// Who asked for the run; used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceLock<()> = OnceLock::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_runs_total", "Sync runs started, by trigger.");
        describe_counter!(
            "sync_run_failures_total",
            "Sync runs that failed to fetch the source batch."
        );
        describe_counter!(
            "sync_runs_rejected_total",
            "Sync runs rejected because another run was in flight."
        );
        describe_counter!("sync_records_fetched_total", "Records pulled from the source.");
        describe_counter!("sync_pages_created_total", "Pages created in the target.");
        describe_counter!("sync_page_failures_total", "Page creations that failed.");
        describe_histogram!("sync_run_duration_ms", "Wall-clock time of a sync run.");
        describe_gauge!(
            "sync_last_success_ts",
            "Unix ts of the last sync run that completed."
        );
    });
}

/// One full pass: fetch, then map + publish each record in fetch order.
///
/// A fetch error is returned as-is and no publish is attempted. Publish errors
/// are logged with the record id and counted; they never stop the batch.
pub async fn sync_batch(
    source: &dyn RecordSource,
    publisher: &dyn PagePublisher,
) -> anyhow::Result<SyncResult> {
    info!(source = source.name(), "starting data synchronization");

    let records = source.fetch_recent().await?;
    let fetched = records.len();
    info!(fetched, source = source.name(), "fetched records");
    counter!("sync_records_fetched_total").increment(fetched as u64);

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for record in &records {
        let properties = map_record(record);
        match publisher.create_page(&properties).await {
            Ok(()) => {
                succeeded += 1;
                info!(record_id = %record.id, publisher = publisher.name(), "synced record");
            }
            Err(e) => {
                failed += 1;
                error!(record_id = %record.id, error = %format!("{e:#}"), "failed to sync record");
            }
        }
    }

    counter!("sync_pages_created_total").increment(succeeded as u64);
    counter!("sync_page_failures_total").increment(failed as u64);

    info!(fetched, succeeded, failed, "data synchronization completed");

    Ok(SyncResult {
        success: true,
        records_processed: fetched,
        attempted: fetched,
        succeeded,
        failed,
    })
}

/// Long-lived job shared by the scheduler and the manual trigger.
pub struct SyncJob {
    source: Arc<dyn RecordSource>,
    publisher: Arc<dyn PagePublisher>,
    guard: Option<SingleFlight>,
}

impl SyncJob {
    /// Without a guard overlapping runs proceed independently (and may publish
    /// the same records twice).
    pub fn new(source: Arc<dyn RecordSource>, publisher: Arc<dyn PagePublisher>) -> Self {
        Self {
            source,
            publisher,
            guard: None,
        }
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.guard = enabled.then(SingleFlight::new);
        self
    }

    pub fn single_flight(&self) -> bool {
        self.guard.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.guard.as_ref().is_some_and(SingleFlight::is_busy)
    }

    pub async fn run(&self, trigger: Trigger) -> Result<SyncResult, SyncError> {
        ensure_metrics_described();

        // Held until the end of this call, success or not.
        let _permit = match &self.guard {
            Some(guard) => match guard.try_acquire() {
                Some(p) => Some(p),
                None => {
                    warn!(%trigger, "sync already in progress, rejecting");
                    counter!("sync_runs_rejected_total", "trigger" => trigger.as_str())
                        .increment(1);
                    return Err(SyncError::AlreadyRunning);
                }
            },
            None => None,
        };

        counter!("sync_runs_total", "trigger" => trigger.as_str()).increment(1);
        let t0 = Instant::now();

        let res = sync_batch(self.source.as_ref(), self.publisher.as_ref()).await;
        histogram!("sync_run_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(r) => {
                gauge!("sync_last_success_ts").set(chrono::Utc::now().timestamp() as f64);
                Ok(r)
            }
            Err(e) => {
                error!(%trigger, error = %format!("{e:#}"), "sync error");
                counter!("sync_run_failures_total", "trigger" => trigger.as_str()).increment(1);
                Err(SyncError::Fetch(e))
            }
        }
    }
}
