// src/scheduler.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::sync::{SyncError, SyncJob, SyncResult, Trigger};

/// Running cron scheduler. Dropping it does not stop the jobs; call `shutdown`.
pub struct SyncScheduler {
    inner: JobScheduler,
    cron: String,
}

impl SyncScheduler {
    pub fn cron(&self) -> &str {
        &self.cron
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("shutting down scheduler")?;
        info!("scheduler stopped");
        Ok(())
    }
}

/// Accept classic five-field cron by pinning seconds to 0.
pub fn normalize_cron(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}

/// Register the sync job on `cron` and start ticking.
///
/// Every firing is spawned as its own task, so a slow or failing run never
/// delays or cancels the next one.
pub async fn start_sync_scheduler(job: Arc<SyncJob>, cron: &str) -> Result<SyncScheduler> {
    let cron = normalize_cron(cron);
    let sched = JobScheduler::new().await.context("creating scheduler")?;

    let cron_job = Job::new_async(cron.as_str(), move |_uuid, _l| {
        let job = Arc::clone(&job);
        Box::pin(async move {
            spawn_firing(job);
        })
    })
    .with_context(|| format!("creating scheduler job for cron {cron}"))?;

    sched.add(cron_job).await.context("adding scheduler job")?;
    sched.start().await.context("starting scheduler")?;

    info!(%cron, "cron jobs scheduled successfully");
    Ok(SyncScheduler { inner: sched, cron })
}

pub fn spawn_firing(job: Arc<SyncJob>) -> JoinHandle<Option<SyncResult>> {
    tokio::spawn(async move { fire(&job).await })
}

/// One scheduled run. Errors are logged here and never escape.
pub async fn fire(job: &SyncJob) -> Option<SyncResult> {
    info!("running scheduled sync");
    match job.run(Trigger::Scheduled).await {
        Ok(r) => {
            info!(
                fetched = r.records_processed,
                succeeded = r.succeeded,
                failed = r.failed,
                "scheduled sync finished"
            );
            Some(r)
        }
        Err(SyncError::AlreadyRunning) => {
            warn!("previous sync still running, skipping this firing");
            None
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "scheduled sync failed");
            None
        }
    }
}
