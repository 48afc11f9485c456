//! Background job scheduler.
//!
//! Runs housekeeping on the in-process record cache.

use std::sync::Arc;

use coffeehaus_search::RecordCache;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every 15 minutes, on the minute.
const PURGE_SCHEDULE: &str = "0 */15 * * * *";

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it stops all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(cache: Arc<RecordCache>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_cache_purge_job(&scheduler, cache).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Drops cached search results past their retention window. Expired entries
/// are already ignored on read; this only reclaims memory.
async fn register_cache_purge_job(
    scheduler: &JobScheduler,
    cache: Arc<RecordCache>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(PURGE_SCHEDULE, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            let purged = cache.purge_expired().await;
            if purged > 0 {
                tracing::info!(purged, "scheduler: purged expired search results");
            } else {
                tracing::debug!("scheduler: no expired search results");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
