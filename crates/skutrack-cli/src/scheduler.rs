//! Daily run trigger.
//!
//! Registers one cron job that fires at the configured UTC wall-clock time
//! and starts an exclusive collection run for the previous day.

use std::sync::Arc;

use chrono::{NaiveTime, Timelike, Utc};
use skutrack_collector::default_target_date;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::ProductionCollector;

/// Six-field cron expression (`sec min hour dom mon dow`) firing daily at `at`.
pub(crate) fn daily_cron(at: NaiveTime) -> String {
    format!("0 {} {} * * *", at.minute(), at.hour())
}

/// Builds and starts the scheduler with the daily collection job.
///
/// The returned [`JobScheduler`] must be kept alive; dropping it stops the
/// job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler fails to start.
pub(crate) async fn build_scheduler(
    collector: Arc<ProductionCollector>,
    daily_at: NaiveTime,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let cron = daily_cron(daily_at);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let collector = Arc::clone(&collector);
        Box::pin(async move {
            let target_date = default_target_date(Utc::now());
            tracing::info!(%target_date, "scheduler: starting daily collection run");
            collector.run_exclusive(target_date).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(%daily_at, %cron, "scheduler: daily collection registered (UTC)");
    Ok(scheduler)
}
