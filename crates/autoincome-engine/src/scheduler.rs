//! Periodic job execution.
//!
//! [`JobRunner`] owns one in-flight flag per [`JobKind`]. A trigger that
//! arrives while the same job is still running is skipped rather than
//! queued, and every run is bounded by a soft deadline. The server drives
//! `trigger` from cron registrations; the CLI and tests call it directly.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::EngineError;
use crate::performance::FinancialSummary;
use crate::pipeline::{AutomatedReinvestment, DashboardSnapshot, Pipeline};

const JOB_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Ingest,
    Analyze,
    Launch,
    Reprice,
    Performance,
    Segment,
    Reinvest,
    Snapshot,
}

impl JobKind {
    pub const ALL: [JobKind; JOB_COUNT] = [
        JobKind::Ingest,
        JobKind::Analyze,
        JobKind::Launch,
        JobKind::Reprice,
        JobKind::Performance,
        JobKind::Segment,
        JobKind::Reinvest,
        JobKind::Snapshot,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Ingest => "ingest",
            JobKind::Analyze => "analyze",
            JobKind::Launch => "launch",
            JobKind::Reprice => "reprice",
            JobKind::Performance => "performance",
            JobKind::Segment => "segment",
            JobKind::Reinvest => "reinvest",
            JobKind::Snapshot => "snapshot",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown job '{s}'"))
    }
}

/// What a completed job produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobReport {
    Ingest { stored: usize },
    Analyze { analyzed: usize },
    Launch { stream_ids: Vec<i64> },
    Reprice { updated: usize },
    Performance { summary: FinancialSummary },
    Segment { changed: usize },
    Reinvest(AutomatedReinvestment),
    Snapshot(DashboardSnapshot),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(JobReport),
    /// The same job was already running.
    Skipped,
    TimedOut,
    Failed(String),
}

/// Clears an in-flight flag when dropped, including on timeout cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct JobRunner {
    pipeline: Arc<Pipeline>,
    in_flight: [AtomicBool; JOB_COUNT],
    deadline: Duration,
    snapshots: watch::Sender<DashboardSnapshot>,
}

impl JobRunner {
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>, deadline: Duration) -> Self {
        let (snapshots, _) = watch::channel(DashboardSnapshot::default());
        Self {
            pipeline,
            in_flight: std::array::from_fn(|_| AtomicBool::new(false)),
            deadline,
            snapshots,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Receiver for the dashboard snapshot published by the snapshot job.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.subscribe()
    }

    fn claim(&self, kind: JobKind) -> Option<InFlight<'_>> {
        let flag = &self.in_flight[kind.index()];
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }

    /// Runs `kind` now unless it is already running.
    pub async fn trigger(&self, kind: JobKind) -> JobOutcome {
        let Some(_guard) = self.claim(kind) else {
            tracing::info!(job = %kind, "scheduler: job already running, skipped");
            return JobOutcome::Skipped;
        };

        let started = std::time::Instant::now();
        match tokio::time::timeout(self.deadline, self.run(kind)).await {
            Ok(Ok(report)) => {
                tracing::info!(
                    job = %kind,
                    elapsed_ms = started.elapsed().as_millis(),
                    "scheduler: job completed"
                );
                JobOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                tracing::error!(job = %kind, error = %e, "scheduler: job failed");
                JobOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!(
                    job = %kind,
                    deadline_secs = self.deadline.as_secs(),
                    "scheduler: job exceeded deadline, aborted"
                );
                JobOutcome::TimedOut
            }
        }
    }

    async fn run(&self, kind: JobKind) -> Result<JobReport, EngineError> {
        let now = Utc::now();
        let p = &self.pipeline;
        Ok(match kind {
            JobKind::Ingest => JobReport::Ingest {
                stored: p.ingest_trends(now).await,
            },
            JobKind::Analyze => JobReport::Analyze {
                analyzed: p.analyze_trends(now).await?,
            },
            JobKind::Launch => JobReport::Launch {
                stream_ids: p.launch_streams(now).await?,
            },
            JobKind::Reprice => JobReport::Reprice {
                updated: p.optimize_pricing(now).await?,
            },
            JobKind::Performance => JobReport::Performance {
                summary: p.financial_summary(now).await?,
            },
            JobKind::Segment => JobReport::Segment {
                changed: p.run_segmentation(now).await?.len(),
            },
            JobKind::Reinvest => JobReport::Reinvest(p.run_automated_reinvestment(now).await?),
            JobKind::Snapshot => {
                let snapshot = p.snapshot(now).await?;
                self.snapshots.send_replace(snapshot.clone());
                JobReport::Snapshot(snapshot)
            }
        })
    }
}
