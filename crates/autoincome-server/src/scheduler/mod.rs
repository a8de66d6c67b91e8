//! Background job scheduler.
//!
//! Registers every [`JobKind`] on a [`JobScheduler`] at its configured
//! repeat interval. Each tick goes through [`JobRunner::trigger`], so a tick
//! that lands while the previous run of the same job is still going is
//! skipped rather than stacked.

use std::sync::Arc;
use std::time::Duration;

use autoincome_core::JobIntervals;
use autoincome_engine::{JobKind, JobOutcome, JobRunner};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Repeat interval for `kind`. Zero is bumped to one second.
pub fn interval_for(kind: JobKind, intervals: &JobIntervals) -> Duration {
    let secs = match kind {
        JobKind::Ingest => intervals.ingest_secs,
        JobKind::Analyze => intervals.analyze_secs,
        JobKind::Launch => intervals.launch_secs,
        JobKind::Reprice => intervals.reprice_secs,
        JobKind::Performance => intervals.performance_secs,
        JobKind::Segment => intervals.segment_secs,
        JobKind::Reinvest => intervals.reinvest_secs,
        JobKind::Snapshot => intervals.snapshot_secs,
    };
    Duration::from_secs(secs.max(1))
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it stops all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: Arc<JobRunner>,
    intervals: &JobIntervals,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for kind in JobKind::ALL {
        register_job(&scheduler, Arc::clone(&runner), kind, interval_for(kind, intervals)).await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_job(
    scheduler: &JobScheduler,
    runner: Arc<JobRunner>,
    kind: JobKind,
    every: Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(every, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);
        Box::pin(async move {
            log_outcome(kind, &runner.trigger(kind).await);
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(job = %kind, every_secs = every.as_secs(), "scheduler: registered job");
    Ok(())
}

fn log_outcome(kind: JobKind, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Completed(report) => match serde_json::to_string(report) {
            Ok(json) => tracing::debug!(job = %kind, report = %json, "scheduler: job report"),
            Err(e) => tracing::warn!(job = %kind, error = %e, "scheduler: report not serialisable"),
        },
        // JobRunner already logged these.
        JobOutcome::Skipped | JobOutcome::TimedOut | JobOutcome::Failed(_) => {}
    }
}

/// Runs the ingest, analyze and snapshot jobs once so a fresh daemon has
/// data before the first interval elapses.
pub async fn run_startup_jobs(runner: &JobRunner) {
    for kind in [JobKind::Ingest, JobKind::Analyze, JobKind::Snapshot] {
        log_outcome(kind, &runner.trigger(kind).await);
    }
}

#[cfg(test)]
mod tests {
    use autoincome_core::Heuristics;
    use autoincome_engine::{MemoryStore, Pipeline, PipelineOptions};

    use super::*;

    fn intervals(secs: u64) -> JobIntervals {
        JobIntervals {
            ingest_secs: secs,
            analyze_secs: secs,
            launch_secs: secs,
            reprice_secs: secs,
            performance_secs: secs,
            segment_secs: secs,
            reinvest_secs: secs,
            snapshot_secs: 1,
        }
    }

    fn runner() -> Arc<JobRunner> {
        let pipeline = Pipeline::new(
            Arc::new(MemoryStore::new()),
            &Heuristics::default(),
            PipelineOptions::default(),
        )
        .with_seed(3);
        Arc::new(JobRunner::new(Arc::new(pipeline), Duration::from_secs(30)))
    }

    #[test]
    fn intervals_map_per_job() {
        let mut cfg = intervals(3600);
        cfg.reprice_secs = 21_600;
        cfg.snapshot_secs = 0;
        assert_eq!(interval_for(JobKind::Reprice, &cfg), Duration::from_secs(21_600));
        assert_eq!(interval_for(JobKind::Ingest, &cfg), Duration::from_secs(3600));
        assert_eq!(interval_for(JobKind::Snapshot, &cfg), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn startup_jobs_publish_a_snapshot() {
        let runner = runner();
        let mut rx = runner.subscribe();
        run_startup_jobs(&runner).await;
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.trends, 30);
        assert!(snapshot.last_update.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn registered_snapshot_job_fires() {
        let runner = runner();
        let mut rx = runner.subscribe();
        let mut scheduler = build_scheduler(Arc::clone(&runner), &intervals(3600))
            .await
            .expect("scheduler should start");

        tokio::time::timeout(Duration::from_secs(10), rx.changed())
            .await
            .expect("snapshot job should fire within the timeout")
            .expect("sender alive");
        assert!(rx.borrow().last_update.is_some());

        scheduler.shutdown().await.expect("shutdown");
    }
}
