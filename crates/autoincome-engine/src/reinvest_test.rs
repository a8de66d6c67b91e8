use autoincome_core::{
    BusinessModel, CompetitionLevel, MarketSize, NewStream, NewTrend, OpportunityCandidate,
    StreamStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use super::*;
use crate::memory::MemoryStore;
use crate::performance::ExpenseBreakdown;

fn report(stream_id: i64, name: &str, profit: Decimal, roi: Decimal) -> ProfitReport {
    ProfitReport {
        stream_id,
        stream_name: name.to_string(),
        revenue: Decimal::ZERO,
        expenses: ExpenseBreakdown::default(),
        profit,
        profit_margin: Decimal::ZERO,
        roi,
        growth_rate: Decimal::ZERO,
        initial_investment: dec!(100),
        days_active: 30,
        profit_per_day: Decimal::ZERO,
    }
}

fn opportunity(id: i64) -> Opportunity {
    Opportunity {
        id,
        trend_id: 1,
        keyword: "standing desk".to_string(),
        business_model: BusinessModel::Dropshipping,
        profit_potential: 8,
        difficulty_score: 5,
        investment_required: dec!(150),
        roi_estimate: 300,
        market_size: MarketSize::Medium,
        competition_analysis: String::new(),
        recommendation: String::new(),
        status: OpportunityStatus::Pending,
        created_at: Utc::now(),
    }
}

fn strategies(decision: &ReinvestmentDecision) -> Vec<Strategy> {
    decision.recommendations.iter().map(|r| r.strategy).collect()
}

#[test]
fn below_minimum_profit_declines() {
    let d = ReinvestmentPlanner::default().plan(&[report(1, "a", dec!(49), dec!(80))], None);
    assert!(!d.should_reinvest);
    assert_eq!(d.total_profit, dec!(49));
    assert_eq!(d.available, Decimal::ZERO);
    assert!(d.recommendations.is_empty());
}

#[test]
fn minimum_profit_exactly_reinvests() {
    let d = ReinvestmentPlanner::default().plan(&[report(1, "a", dec!(50), dec!(30))], None);
    assert!(d.should_reinvest);
    assert_eq!(d.available, dec!(35));
    assert_eq!(d.emergency_reserve, dec!(5));
    // roi 30 is neither a top performer nor an underperformer
    assert!(d.recommendations.is_empty());
}

#[test]
fn strong_portfolio_allocates_down_the_table() {
    let opp = opportunity(9);
    let d = ReinvestmentPlanner::default().plan(
        &[report(1, "desk lamp - dropshipping", dec!(1000), dec!(200))],
        Some(&opp),
    );

    assert_eq!(d.available, dec!(700));
    assert_eq!(d.emergency_reserve, dec!(100));
    assert_eq!(
        strategies(&d),
        vec![
            Strategy::ScaleExistingStreams,
            Strategy::CreateNewStreams,
            Strategy::IncreaseMarketingBudget,
            Strategy::ExpandToNewPlatforms,
        ]
    );
    let amounts: Vec<Decimal> = d.recommendations.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![dec!(280), dec!(126), dec!(147), dec!(147)]);

    let scale = &d.recommendations[0];
    assert_eq!(scale.priority, Priority::High);
    assert_eq!(scale.stream_id, Some(1));
    assert_eq!(scale.expected_roi, dec!(160));

    let create = &d.recommendations[1];
    assert_eq!(create.opportunity_id, Some(9));
    assert_eq!(create.expected_roi, dec!(300));
    assert_eq!(d.recommendations[3].priority, Priority::Low);
}

#[test]
fn underperformer_gets_improvement_without_expansion() {
    let d = ReinvestmentPlanner::default().plan(
        &[
            report(1, "winner", dec!(600), dec!(120)),
            report(2, "laggard", dec!(-100), dec!(-50)),
        ],
        None,
    );

    assert_eq!(d.total_profit, dec!(500));
    assert_eq!(
        strategies(&d),
        vec![
            Strategy::ScaleExistingStreams,
            Strategy::IncreaseMarketingBudget,
            Strategy::ImproveProductQuality,
        ]
    );
    let amounts: Vec<Decimal> = d.recommendations.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![dec!(140), dec!(105), dec!(100)]);
    assert_eq!(d.recommendations[2].stream_id, Some(2));
}

#[test]
fn top_performer_is_the_highest_roi() {
    let d = ReinvestmentPlanner::default().plan(
        &[
            report(1, "steady", dec!(400), dec!(60)),
            report(2, "rocket", dec!(200), dec!(400)),
        ],
        None,
    );
    assert_eq!(d.recommendations[0].stream_id, Some(2));
}

#[test]
fn candidate_criteria_follow_heuristics() {
    let c = ReinvestmentPlanner::default().candidate_criteria();
    assert_eq!(c.min_profit_potential, 7);
    assert_eq!(c.max_investment, dec!(200));
    assert_eq!(c.limit, 3);
}

async fn seeded(store: &MemoryStore, now: DateTime<Utc>) -> (i64, i64) {
    let trend = NewTrend {
        keyword: "standing desk".to_string(),
        platform: "google_trends".to_string(),
        search_volume: 5000,
        growth_rate: 60.0,
        competition_level: CompetitionLevel::Low,
        sentiment_score: 5.0,
    };
    let trend_id = store.upsert_trend(&trend, now).await.unwrap();
    let candidate = OpportunityCandidate::new(
        BusinessModel::Dropshipping,
        8,
        5,
        dec!(150),
        300,
        MarketSize::Medium,
        "moderate",
        "go",
    );
    let opp_id = store.insert_opportunity(trend_id, &candidate, now).await.unwrap();
    let stream_id = store
        .create_stream(
            &NewStream {
                opportunity_id: None,
                name: "desk lamp - dropshipping".to_string(),
                platform: "facebook_marketplace".to_string(),
                business_model: BusinessModel::Dropshipping,
                initial_investment: dec!(100),
            },
            now,
        )
        .await
        .unwrap();
    (stream_id, opp_id)
}

fn rec(strategy: Strategy, stream_id: Option<i64>, opportunity_id: Option<i64>, amount: Decimal) -> Recommendation {
    Recommendation {
        strategy,
        stream_id,
        stream_name: None,
        opportunity_id,
        amount,
        expected_roi: dec!(100),
        description: strategy.to_string(),
        priority: Priority::Medium,
    }
}

#[tokio::test]
async fn execute_applies_each_strategy() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let (stream_id, opp_id) = seeded(&store, now).await;

    let recs = vec![
        rec(Strategy::ScaleExistingStreams, Some(stream_id), None, dec!(40)),
        rec(Strategy::CreateNewStreams, None, Some(opp_id), dec!(30)),
        rec(Strategy::IncreaseMarketingBudget, Some(stream_id), None, dec!(25)),
        rec(Strategy::ExpandToNewPlatforms, None, None, dec!(10)),
    ];
    let summary = execute_plan(&store, &recs, now).await;

    assert_eq!(summary.executed_count, 4);
    assert_eq!(summary.total_invested, dec!(105));

    let stream = store.get_stream(stream_id).await.unwrap();
    assert_eq!(stream.initial_investment, dec!(140));
    assert_eq!(stream.marketing_budget, dec!(25));
    assert_eq!(stream.status, StreamStatus::Active);

    let opp = store.get_opportunity(opp_id).await.unwrap();
    assert_eq!(opp.status, OpportunityStatus::Implementing);

    let log = store.reinvestments().unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].strategy, Strategy::ScaleExistingStreams);
    assert_eq!(log[0].executed_at, now);
}

#[tokio::test]
async fn execute_skips_failures_and_unexecutable_strategies() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let (stream_id, _) = seeded(&store, now).await;

    let recs = vec![
        rec(Strategy::ScaleExistingStreams, Some(9999), None, dec!(40)),
        rec(Strategy::AutomateOperations, None, None, dec!(20)),
        rec(Strategy::IncreaseMarketingBudget, None, None, dec!(20)),
        rec(Strategy::IncreaseMarketingBudget, Some(stream_id), None, dec!(15)),
    ];
    let summary = execute_plan(&store, &recs, now).await;

    assert_eq!(summary.executed_count, 1);
    assert_eq!(summary.total_invested, dec!(15));
    assert_eq!(store.reinvestments().unwrap().len(), 1);
}

#[tokio::test]
async fn execute_rejects_second_claim_on_an_opportunity() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let (_, opp_id) = seeded(&store, now).await;
    store
        .set_opportunity_status(opp_id, OpportunityStatus::Implemented)
        .await
        .unwrap();

    let summary = execute_plan(
        &store,
        &[rec(Strategy::CreateNewStreams, None, Some(opp_id), dec!(50))],
        now,
    )
    .await;
    assert_eq!(summary.executed_count, 0);
}
