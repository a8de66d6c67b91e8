//! Customer segmentation from order aggregates.

use std::collections::BTreeMap;

use autoincome_core::heuristics::SegmentationHeuristics;
use autoincome_core::{Customer, CustomerMetrics, Order, OrderStatus, Segment};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::performance::days_between;
use crate::pricing::round_money;

#[derive(Debug, Clone)]
pub struct Segmenter {
    heuristics: SegmentationHeuristics,
}

impl Segmenter {
    #[must_use]
    pub fn new(heuristics: SegmentationHeuristics) -> Self {
        Self { heuristics }
    }

    /// First match wins: vip, high value, new, at risk, regular.
    #[must_use]
    pub fn segment(&self, customer: &Customer, now: DateTime<Utc>) -> Segment {
        let h = &self.heuristics;
        let meets = |min_spent: Decimal, min_orders: i32| {
            customer.total_spent >= min_spent && customer.order_count >= min_orders
        };

        if meets(h.vip.min_spent, h.vip.min_orders) {
            Segment::Vip
        } else if meets(h.high_value.min_spent, h.high_value.min_orders) {
            Segment::HighValue
        } else if now - customer.created_at <= Duration::days(h.new_customer_days) {
            Segment::New
        } else if self.is_at_risk(customer, now) {
            Segment::AtRisk
        } else {
            Segment::Regular
        }
    }

    fn is_at_risk(&self, customer: &Customer, now: DateTime<Utc>) -> bool {
        if customer.order_count < self.heuristics.at_risk_min_orders {
            return false;
        }
        customer
            .last_order_date
            .is_some_and(|last| days_between(last, now) >= self.heuristics.at_risk_days)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmentationHeuristics::default())
    }
}

/// Aggregates a customer's full order history.
#[must_use]
pub fn metrics_from_orders(orders: &[Order]) -> CustomerMetrics {
    let order_count = i32::try_from(orders.len()).unwrap_or(i32::MAX);
    let total_spent: Decimal = orders.iter().map(|o| o.amount).sum();
    let average_order_value = if orders.is_empty() {
        Decimal::ZERO
    } else {
        total_spent / Decimal::from(orders.len())
    };
    CustomerMetrics {
        order_count,
        total_spent,
        average_order_value,
        last_order_date: orders.iter().map(|o| o.created_at).max(),
    }
}

/// Customer count per segment; every segment is present, possibly with zero.
#[must_use]
pub fn segment_distribution(customers: &[Customer]) -> BTreeMap<Segment, usize> {
    let mut counts: BTreeMap<Segment, usize> = Segment::ALL.iter().map(|s| (*s, 0)).collect();
    for customer in customers {
        *counts.entry(customer.segment).or_default() += 1;
    }
    counts
}

/// One row of the top-spender list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCustomer {
    pub id: i64,
    pub email: String,
    pub total_spent: Decimal,
    pub order_count: i32,
    pub segment: Segment,
}

/// Customer base roll-up for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerAnalytics {
    pub total_customers: usize,
    /// Customers created since the first day of `now`'s month (UTC).
    pub new_this_month: usize,
    /// Mean amount of completed orders.
    pub average_order_value: Decimal,
    /// Mean `total_spent` over customers who spent anything.
    pub customer_lifetime_value: Decimal,
    pub segment_distribution: BTreeMap<Segment, usize>,
    /// Highest `total_spent` first.
    pub top_customers: Vec<TopCustomer>,
}

impl CustomerAnalytics {
    #[must_use]
    pub fn compute(
        customers: &[Customer],
        orders: &[Order],
        now: DateTime<Utc>,
        top_n: usize,
    ) -> Self {
        let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        let new_this_month = month_start.map_or(0, |start| {
            customers.iter().filter(|c| c.created_at >= start).count()
        });

        let completed: Vec<Decimal> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| o.amount)
            .collect();
        let spenders: Vec<Decimal> = customers
            .iter()
            .map(|c| c.total_spent)
            .filter(|spent| *spent > Decimal::ZERO)
            .collect();

        let mut ranked: Vec<&Customer> = customers.iter().collect();
        ranked.sort_by(|a, b| b.total_spent.cmp(&a.total_spent).then(a.id.cmp(&b.id)));
        let top_customers = ranked
            .into_iter()
            .take(top_n)
            .map(|c| TopCustomer {
                id: c.id,
                email: c.email.clone(),
                total_spent: c.total_spent,
                order_count: c.order_count,
                segment: c.segment,
            })
            .collect();

        Self {
            total_customers: customers.len(),
            new_this_month,
            average_order_value: mean(&completed),
            customer_lifetime_value: mean(&spenders),
            segment_distribution: segment_distribution(customers),
            top_customers,
        }
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    round_money(values.iter().copied().sum::<Decimal>() / Decimal::from(values.len()))
}
