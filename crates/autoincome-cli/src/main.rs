mod order;
mod report;
mod run;

use std::sync::Arc;

use autoincome_core::AppConfig;
use autoincome_engine::{JobKind, OpenAiAnalyst, Pipeline, PipelineOptions};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::order::OrderArgs;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "autoincome-cli")]
#[command(about = "Operator commands for the autoincome pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one pipeline job now (ingest, analyze, launch, reprice,
    /// performance, segment, reinvest, snapshot)
    Run {
        job: JobKind,
    },
    /// Print the business plan for an opportunity
    Plan {
        opportunity_id: i64,
    },
    /// Record a sale and re-segment the buyer
    Order(OrderArgs),
    /// Read-only portfolio reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("autoincome-cli: pass --help for the list of commands");
        return Ok(());
    };

    let config = autoincome_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = autoincome_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                autoincome_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = autoincome_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Run { job } => {
            let pipeline = build_pipeline(&config, pool)?;
            run::run_job(pipeline, job, config.job_deadline_secs).await?;
        }
        Commands::Plan { opportunity_id } => {
            let pipeline = build_pipeline(&config, pool)?;
            run::run_plan(&pipeline, opportunity_id).await?;
        }
        Commands::Order(args) => {
            let pipeline = build_pipeline(&config, pool)?;
            order::run_order(&pipeline, &args).await?;
        }
        Commands::Report { command } => {
            let pipeline = build_pipeline(&config, pool)?;
            report::run_report(&pipeline, &command).await?;
        }
    }

    Ok(())
}

/// Wires the Postgres store, heuristics and optional analyst into a pipeline.
///
/// # Errors
///
/// Returns an error if the heuristics file cannot be loaded or the analyst
/// client cannot be built.
fn build_pipeline(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Pipeline> {
    let heuristics = autoincome_core::load_heuristics(config.heuristics_path.as_deref())?;
    let store = Arc::new(autoincome_db::PgStore::new(pool));
    let mut pipeline = Pipeline::new(store, &heuristics, PipelineOptions::from_app_config(config));
    if let Some(settings) = &config.analyst {
        pipeline = pipeline.with_analyst(Arc::new(OpenAiAnalyst::new(settings)?));
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests;
