//! One-shot job triggers and business plans.

use std::sync::Arc;
use std::time::Duration;

use autoincome_engine::{JobKind, JobOutcome, JobRunner, Pipeline};

/// Run a single job through a [`JobRunner`] so the configured deadline applies,
/// then print its report as JSON.
///
/// # Errors
///
/// Returns an error if the job fails or exceeds its deadline.
pub(crate) async fn run_job(
    pipeline: Pipeline,
    job: JobKind,
    deadline_secs: u64,
) -> anyhow::Result<()> {
    let runner = JobRunner::new(Arc::new(pipeline), Duration::from_secs(deadline_secs));

    match runner.trigger(job).await {
        JobOutcome::Completed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        JobOutcome::Skipped => {
            println!("{job} is already running; skipped");
            Ok(())
        }
        JobOutcome::TimedOut => {
            anyhow::bail!("{job} exceeded its {deadline_secs}s deadline")
        }
        JobOutcome::Failed(message) => anyhow::bail!("{job} failed: {message}"),
    }
}

/// Print the business plan for one opportunity.
///
/// # Errors
///
/// Returns an error if the opportunity does not exist.
pub(crate) async fn run_plan(pipeline: &Pipeline, opportunity_id: i64) -> anyhow::Result<()> {
    let plan = pipeline.business_plan(opportunity_id).await?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
