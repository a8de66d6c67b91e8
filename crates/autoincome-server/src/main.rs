mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use autoincome_engine::{JobRunner, OpenAiAnalyst, Pipeline, PipelineOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = autoincome_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "autoincome-server starting");

    let pool = autoincome_db::connect_pool_from_config(&config).await?;
    let applied = autoincome_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let heuristics = autoincome_core::load_heuristics(config.heuristics_path.as_deref())?;
    let store = Arc::new(autoincome_db::PgStore::new(pool));
    let mut pipeline = Pipeline::new(store, &heuristics, PipelineOptions::from_app_config(&config));
    match &config.analyst {
        Some(settings) => {
            tracing::info!(model = %settings.model, "generative analyst enabled");
            pipeline = pipeline.with_analyst(Arc::new(OpenAiAnalyst::new(settings)?));
        }
        None => tracing::info!("no analyst key configured; scoring is heuristic only"),
    }

    let runner = Arc::new(JobRunner::new(
        Arc::new(pipeline),
        Duration::from_secs(config.job_deadline_secs),
    ));
    let dashboard = tokio::spawn(log_dashboard(runner.subscribe()));

    scheduler::run_startup_jobs(&runner).await;
    let mut jobs = scheduler::build_scheduler(Arc::clone(&runner), &config.intervals).await?;

    shutdown_signal().await;
    jobs.shutdown().await?;
    dashboard.abort();
    tracing::info!("autoincome-server stopped");
    Ok(())
}

/// Logs each dashboard snapshot the snapshot job publishes.
async fn log_dashboard(mut rx: tokio::sync::watch::Receiver<autoincome_engine::DashboardSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        tracing::info!(
            trends = snapshot.trends,
            opportunities = snapshot.opportunities,
            active_streams = snapshot.active_streams,
            customers = snapshot.customers,
            total_revenue = %snapshot.total_revenue,
            total_profit = %snapshot.total_profit,
            "dashboard: snapshot"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
