//! Live integration tests for autoincome-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/autoincome-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use std::sync::Arc;

use autoincome_core::{
    BusinessModel, CompetitionLevel, CustomerMetrics, Heuristics, MarketSize, NewCustomer,
    NewOrder, NewProduct, NewStream, NewTrend, OpportunityCandidate, OpportunityCriteria,
    OpportunityStatus, OrderStatus, Segment, Store, StoreError, StreamMetrics, StreamStatus,
};
use autoincome_db::{run_migrations, PgStore};
use autoincome_engine::{OrderIntake, Pipeline, PipelineOptions};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trend(keyword: &str, volume: i64) -> NewTrend {
    NewTrend {
        keyword: keyword.to_string(),
        platform: "ecommerce".to_string(),
        search_volume: volume,
        growth_rate: 40.0,
        competition_level: CompetitionLevel::Low,
        sentiment_score: 5.0,
    }
}

fn candidate(profit: i64, investment: rust_decimal::Decimal, roi: i32) -> OpportunityCandidate {
    OpportunityCandidate::new(
        BusinessModel::Dropshipping,
        profit,
        4,
        investment,
        roi,
        MarketSize::Medium,
        "Low competition, good opportunity",
        "Launch quickly",
    )
}

async fn seed_stream(store: &PgStore) -> i64 {
    store
        .create_stream(
            &NewStream {
                opportunity_id: None,
                name: "yoga mats - dropshipping".to_string(),
                platform: "facebook_marketplace".to_string(),
                business_model: BusinessModel::Dropshipping,
                initial_investment: dec!(150),
            },
            Utc::now(),
        )
        .await
        .unwrap_or_else(|e| panic!("seed_stream failed: {e}"))
}

async fn seed_customer(store: &PgStore, email: &str) -> i64 {
    store
        .create_customer(&NewCustomer {
            email: email.to_string(),
            first_name: Some("Test".to_string()),
            last_name: None,
            source: "facebook_marketplace".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap_or_else(|e| panic!("seed_customer failed for '{email}': {e}"))
}

// ---------------------------------------------------------------------------
// Section 1: Migrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn migrations_are_idempotent(pool: sqlx::PgPool) {
    let applied = run_migrations(&pool).await.expect("run_migrations failed");
    assert_eq!(applied, 0, "harness already applied every migration");
    autoincome_db::health_check(&pool)
        .await
        .expect("health_check failed");
}

// ---------------------------------------------------------------------------
// Section 2: Trends
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_trend_refreshes_existing_row(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();

    let first = store.upsert_trend(&trend("yoga mats", 1000), now).await.unwrap();
    store.mark_trend_analyzed(first).await.unwrap();
    assert!(store.list_unanalyzed_trends(10).await.unwrap().is_empty());

    let second = store
        .upsert_trend(&trend("yoga mats", 4000), now + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(first, second);

    let queued = store.list_unanalyzed_trends(10).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].search_volume, 4000);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unanalyzed_trends_come_oldest_first(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    store.upsert_trend(&trend("later", 100), now).await.unwrap();
    store
        .upsert_trend(&trend("earlier", 100), now - Duration::hours(1))
        .await
        .unwrap();

    let queued = store.list_unanalyzed_trends(1).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].keyword, "earlier");
}

#[sqlx::test(migrations = "../../migrations")]
async fn mark_missing_trend_is_not_found(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let err = store.mark_trend_analyzed(404).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "trend", .. }));
}

// ---------------------------------------------------------------------------
// Section 3: Opportunities
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pending_opportunities_filter_and_order(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    let trend_id = store.upsert_trend(&trend("desk lamps", 2000), now).await.unwrap();

    let low = store
        .insert_opportunity(trend_id, &candidate(5, dec!(100), 400), now)
        .await
        .unwrap();
    let best = store
        .insert_opportunity(trend_id, &candidate(8, dec!(150), 200), now)
        .await
        .unwrap();
    let tie = store
        .insert_opportunity(trend_id, &candidate(8, dec!(150), 300), now)
        .await
        .unwrap();
    let pricey = store
        .insert_opportunity(trend_id, &candidate(9, dec!(900), 500), now)
        .await
        .unwrap();

    let criteria = OpportunityCriteria {
        min_profit_potential: 6,
        max_investment: dec!(500),
        limit: 10,
    };
    let ids: Vec<i64> = store
        .list_pending_opportunities(&criteria)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![tie, best]);
    assert!(!ids.contains(&low));
    assert!(!ids.contains(&pricey));

    let opp = store.get_opportunity(best).await.unwrap();
    assert_eq!(opp.keyword, "desk lamps");
    assert_eq!(opp.status, OpportunityStatus::Pending);
}

#[sqlx::test(migrations = "../../migrations")]
async fn opportunity_status_only_moves_forward(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    let trend_id = store.upsert_trend(&trend("desk lamps", 2000), now).await.unwrap();
    let id = store
        .insert_opportunity(trend_id, &candidate(7, dec!(100), 200), now)
        .await
        .unwrap();

    store
        .set_opportunity_status(id, OpportunityStatus::Implementing)
        .await
        .unwrap();
    store
        .set_opportunity_status(id, OpportunityStatus::Implemented)
        .await
        .unwrap();

    let err = store
        .set_opportunity_status(id, OpportunityStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: OpportunityStatus::Implemented,
            to: OpportunityStatus::Pending
        }
    ));

    let missing = store
        .set_opportunity_status(999, OpportunityStatus::Implemented)
        .await
        .unwrap_err();
    assert!(matches!(missing, StoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn opportunity_for_missing_trend_is_not_found(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let err = store
        .insert_opportunity(77, &candidate(7, dec!(100), 200), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "trend", .. }));
}

// ---------------------------------------------------------------------------
// Section 4: Streams and products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stream_metrics_and_budget_updates(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    let id = seed_stream(&store).await;

    store
        .update_stream_metrics(
            id,
            &StreamMetrics {
                revenue: dec!(500),
                expenses: dec!(200),
                profit_margin: dec!(60),
                roi: dec!(200),
                products_count: 5,
                customers_count: 3,
                conversion_rate: dec!(1.5),
            },
            now,
        )
        .await
        .unwrap();
    store.add_stream_investment(id, dec!(40), now).await.unwrap();
    store.add_marketing_budget(id, dec!(25.50), now).await.unwrap();

    let stream = store.get_stream(id).await.unwrap();
    assert_eq!(stream.revenue, dec!(500));
    assert_eq!(stream.initial_investment, dec!(190));
    assert_eq!(stream.marketing_budget, dec!(25.50));
    assert_eq!(stream.products_count, 5);

    store
        .set_stream_status(id, StreamStatus::Paused, now)
        .await
        .unwrap();
    assert!(store
        .list_streams(Some(StreamStatus::Active))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.list_streams(None).await.unwrap().len(), 1);

    let counts = store.dashboard_counts().await.unwrap();
    assert_eq!(counts.active_streams, 0);
    assert_eq!(counts.total_revenue, dec!(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_sku_is_unique(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    let stream_id = seed_stream(&store).await;
    let product = NewProduct {
        stream_id,
        name: "Premium yoga mats".to_string(),
        sku: "AI-1-0-ABCD".to_string(),
        price: dec!(29.99),
        cost: dec!(12.00),
        supplier: "AliExpress".to_string(),
        description: "High-quality yoga mats".to_string(),
        category: "fitness".to_string(),
    };

    let id = store.insert_product(&product, now).await.unwrap();
    let err = store.insert_product(&product, now).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { entity: "product", ref key } if key == "AI-1-0-ABCD"));

    store.update_product_price(id, dec!(24.99)).await.unwrap();
    store
        .set_product_listing(id, "https://facebook_marketplace.com/listing/abc123xyz")
        .await
        .unwrap();
    store.record_product_sale(id, 3).await.unwrap();

    let listed = store.list_stream_products(stream_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].price, dec!(24.99));
    assert_eq!(listed[0].sales_count, 3);
    assert!(listed[0].marketplace_url.is_some());
    assert_eq!(store.list_active_products().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_for_missing_stream_is_not_found(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let err = store
        .insert_product(
            &NewProduct {
                stream_id: 12,
                name: "Orphan".to_string(),
                sku: "AI-ORPHAN".to_string(),
                price: dec!(10),
                cost: dec!(5),
                supplier: "AliExpress".to_string(),
                description: String::new(),
                category: "general".to_string(),
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "stream", .. }));
}

// ---------------------------------------------------------------------------
// Section 5: Customers and orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn customer_email_is_unique_and_metrics_persist(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let id = seed_customer(&store, "ada@example.com").await;

    let err = store
        .create_customer(&NewCustomer {
            email: "ada@example.com".to_string(),
            first_name: None,
            last_name: None,
            source: "etsy".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { entity: "customer", .. }));

    let when = Utc::now();
    store
        .update_customer_metrics(
            id,
            &CustomerMetrics {
                order_count: 2,
                total_spent: dec!(80),
                average_order_value: dec!(40),
                last_order_date: Some(when),
            },
        )
        .await
        .unwrap();
    store
        .update_customer_segment(id, Segment::Regular)
        .await
        .unwrap();

    let found = store
        .find_customer_by_email("ada@example.com")
        .await
        .unwrap()
        .expect("customer exists");
    assert_eq!(found.id, id);
    assert_eq!(found.order_count, 2);
    assert_eq!(found.segment, Segment::Regular);
    assert!(store
        .find_customer_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn completed_orders_are_listed_per_stream(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let stream_id = seed_stream(&store).await;
    let customer_id = seed_customer(&store, "bob@example.com").await;
    let now = Utc::now();

    for (i, status) in [OrderStatus::Completed, OrderStatus::Refunded, OrderStatus::Completed]
        .into_iter()
        .enumerate()
    {
        store
            .insert_order(&NewOrder {
                order_number: format!("AI-TEST-{i}"),
                customer_id,
                product_id: None,
                stream_id,
                amount: dec!(30),
                quantity: 1,
                status,
                platform: "facebook_marketplace".to_string(),
                created_at: now + Duration::seconds(i64::try_from(i).unwrap()),
            })
            .await
            .unwrap();
    }

    assert_eq!(store.list_customer_orders(customer_id).await.unwrap().len(), 3);
    let completed = store.list_completed_orders(stream_id).await.unwrap();
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].order_number, "AI-TEST-0");
    assert_eq!(completed[1].order_number, "AI-TEST-2");
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_for_missing_customer_is_not_found(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let stream_id = seed_stream(&store).await;
    let err = store
        .insert_order(&NewOrder {
            order_number: "AI-NOBODY".to_string(),
            customer_id: 55,
            product_id: None,
            stream_id,
            amount: dec!(30),
            quantity: 1,
            status: OrderStatus::Completed,
            platform: "facebook_marketplace".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "customer", .. }));
}

// ---------------------------------------------------------------------------
// Section 6: Pipeline over Postgres
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pipeline_runs_end_to_end(pool: sqlx::PgPool) {
    let store = Arc::new(PgStore::new(pool));
    let pipeline = Pipeline::new(store.clone(), &Heuristics::default(), PipelineOptions::default())
        .with_seed(7);
    let now = Utc::now();

    let stored = pipeline.ingest_trends(now).await;
    assert_eq!(stored, 30);
    pipeline.analyze_trends(now).await.expect("analyze failed");
    assert!(store.list_unanalyzed_trends(100).await.unwrap().is_empty());

    let launched = pipeline.launch_streams(now).await.expect("launch failed");
    for stream_id in &launched {
        let products = store.list_stream_products(*stream_id).await.unwrap();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.marketplace_url.is_some()));
    }

    if let Some(&stream_id) = launched.first() {
        let product_id = store.list_stream_products(stream_id).await.unwrap()[0].id;
        let recorded = pipeline
            .record_order(
                &OrderIntake {
                    email: "  Buyer@Example.com ".to_string(),
                    first_name: Some("Buyer".to_string()),
                    last_name: None,
                    source: "facebook_marketplace".to_string(),
                    stream_id,
                    product_id: Some(product_id),
                    amount: dec!(45),
                    quantity: 1,
                    status: OrderStatus::Completed,
                    platform: "facebook_marketplace".to_string(),
                },
                now,
            )
            .await
            .expect("record_order failed");
        let customer = store.get_customer(recorded.customer_id).await.unwrap();
        assert_eq!(customer.email, "buyer@example.com");
        assert_eq!(customer.order_count, 1);
    }

    let snapshot = pipeline.snapshot(now).await.expect("snapshot failed");
    assert_eq!(snapshot.trends, 30);
    assert_eq!(
        snapshot.active_streams,
        i64::try_from(launched.len()).unwrap()
    );
}
