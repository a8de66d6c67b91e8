//! Read-only portfolio reports.
//!
//! `streams`, `summary` and `reinvestment` run a performance pass first, so
//! stream metrics in the store are refreshed as a side effect. Nothing here
//! executes a reinvestment plan.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use autoincome_core::{Recommendation, Segment};
use autoincome_engine::{
    segment_distribution, CustomerAnalytics, Pipeline, ProfitReport, ReinvestmentDecision,
};
use chrono::Utc;
use clap::Subcommand;

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Profit and ROI per stream
    Streams,
    /// Portfolio totals
    Summary,
    /// Customer count per segment
    Segments,
    /// Customer totals, averages and top spenders
    Customers,
    /// Reinvestment plan for the current profit (not executed)
    Reinvestment,
    /// Dashboard snapshot as JSON
    Dashboard,
}

/// # Errors
///
/// Returns an error if a store read fails.
pub(crate) async fn run_report(pipeline: &Pipeline, command: &ReportCommands) -> anyhow::Result<()> {
    let now = Utc::now();
    match command {
        ReportCommands::Streams => {
            let reports = pipeline.refresh_performance(now).await?;
            if reports.is_empty() {
                println!("no streams yet; run `run launch` first");
            } else {
                print!("{}", format_streams(&reports));
            }
        }
        ReportCommands::Summary => {
            let summary = pipeline.financial_summary(now).await?;
            println!("streams:            {}", summary.stream_count);
            println!("profitable streams: {}", summary.profitable_streams);
            println!("total revenue:      {}", summary.total_revenue);
            println!("total expenses:     {}", summary.total_expenses);
            println!("total profit:       {}", summary.total_profit);
            println!("average ROI:        {}%", summary.average_roi);
            println!("profit margin:      {}%", summary.profit_margin);
            if let Some((id, name)) = &summary.top_performer {
                println!("top performer:      {name} (stream {id})");
            }
        }
        ReportCommands::Segments => {
            let customers = pipeline.store().list_customers().await?;
            print!("{}", format_segments(&segment_distribution(&customers)));
        }
        ReportCommands::Customers => {
            let analytics = pipeline.customer_analytics(now).await?;
            print!("{}", format_customers(&analytics));
        }
        ReportCommands::Reinvestment => {
            let decision = pipeline.analyze_reinvestment(now).await?;
            print!("{}", format_decision(&decision));
        }
        ReportCommands::Dashboard => {
            let snapshot = pipeline.snapshot(now).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}

fn format_streams(reports: &[ProfitReport]) -> String {
    let mut out = format!(
        "{:<6}{:<40}{:>12}{:>12}{:>10}{:>10}\n",
        "ID", "STREAM", "REVENUE", "PROFIT", "ROI %", "GROWTH %"
    );
    for r in reports {
        let _ = writeln!(
            out,
            "{:<6}{:<40}{:>12}{:>12}{:>10}{:>10}",
            r.stream_id,
            truncate(&r.stream_name, 38),
            r.revenue,
            r.profit,
            r.roi.round_dp(1),
            r.growth_rate.round_dp(1),
        );
    }
    out
}

fn format_segments(counts: &BTreeMap<Segment, usize>) -> String {
    let mut out = format!("{:<12}{:>8}\n", "SEGMENT", "COUNT");
    for (segment, count) in counts {
        let _ = writeln!(out, "{:<12}{:>8}", segment.as_str(), count);
    }
    out
}

fn format_customers(analytics: &CustomerAnalytics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "customers:           {}", analytics.total_customers);
    let _ = writeln!(out, "new this month:      {}", analytics.new_this_month);
    let _ = writeln!(out, "average order value: {}", analytics.average_order_value);
    let _ = writeln!(out, "lifetime value:      {}", analytics.customer_lifetime_value);
    if analytics.top_customers.is_empty() {
        return out;
    }
    let _ = writeln!(
        out,
        "\n{:<6}{:<36}{:>12}{:>8}  {}",
        "ID", "EMAIL", "SPENT", "ORDERS", "SEGMENT"
    );
    for c in &analytics.top_customers {
        let _ = writeln!(
            out,
            "{:<6}{:<36}{:>12}{:>8}  {}",
            c.id,
            truncate(&c.email, 34),
            c.total_spent,
            c.order_count,
            c.segment.as_str()
        );
    }
    out
}

fn format_decision(decision: &ReinvestmentDecision) -> String {
    if !decision.should_reinvest {
        return format!(
            "total profit {} is below the reinvestment threshold; nothing to do\n",
            decision.total_profit
        );
    }
    let mut out = format!(
        "total profit {}: {} available, {} held as reserve\n",
        decision.total_profit, decision.available, decision.emergency_reserve
    );
    out.push_str(&format_recommendations(&decision.recommendations));
    out
}

fn format_recommendations(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "no recommendations\n".to_string();
    }
    let mut out = format!(
        "{:<8}{:<28}{:>10}{:>10}  {}\n",
        "PRIO", "STRATEGY", "AMOUNT", "ROI %", "DESCRIPTION"
    );
    for rec in recommendations {
        let _ = writeln!(
            out,
            "{:<8}{:<28}{:>10}{:>10}  {}",
            rec.priority.as_str(),
            rec.strategy.as_str(),
            rec.amount,
            rec.expected_roi.round_dp(0),
            rec.description
        );
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('\u{2026}');
    cut
}
