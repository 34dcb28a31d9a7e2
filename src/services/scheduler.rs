use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::services::ledger::RunSummary;
use crate::services::sync::SyncJob;

/// Repeats sync runs on a cron expression or a fixed interval. Each tick is
/// an independent run with its own session ledger; a tick that fires while
/// the previous run is still going is skipped.
pub struct Scheduler {
    job: Arc<SyncJob>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
    run_lock: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(job: Arc<SyncJob>, config: SchedulerConfig) -> Self {
        Self {
            job,
            config,
            running: Arc::new(RwLock::new(false)),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let job = Arc::clone(&self.job);
        let running = Arc::clone(&self.running);
        let run_lock = Arc::clone(&self.run_lock);

        let sync_job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            let running = Arc::clone(&running);
            let run_lock = Arc::clone(&run_lock);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_exclusive(&job, &run_lock).await;
            })
        })?;

        sched.add(sync_job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.check_interval_minutes.max(1);

        info!("Scheduler running every {} minutes", interval_mins);

        let mut check_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            check_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            run_exclusive(&self.job, &self.run_lock).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// Runs the job unless another run holds `run_lock`. Returns `None` for a
/// skipped tick.
async fn run_exclusive(job: &SyncJob, run_lock: &Mutex<()>) -> Option<RunSummary> {
    let Ok(_guard) = run_lock.try_lock() else {
        debug!(event = "job_skipped", job_name = "sync_feeds", "Previous feed check still running");
        return None;
    };

    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "sync_feeds", "Starting scheduled feed check");

    let summary = job.run().await;
    for line in summary.render() {
        info!(event = "run_summary", "{}", line);
    }
    if summary.stats.failed_feeds > 0 {
        warn!(
            event = "job_degraded",
            job_name = "sync_feeds",
            failed_feeds = summary.stats.failed_feeds,
            "Some feeds could not be processed"
        );
    }

    info!(
        event = "job_finished",
        job_name = "sync_feeds",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Scheduled feed check finished"
    );
    Some(summary)
}
