//! Delivery history summaries for the home and history screens.

use crate::orders::{Order, OrderStatus};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// History list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    /// Every order
    #[default]
    All,
    /// Completed deliveries only
    Delivered,
    /// Cancelled orders only
    Cancelled,
}

/// Orders created on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Day and month, e.g. `"23 Feb"`
    pub label: String,
    /// Orders created that day
    pub count: usize,
}

/// Whole minutes from `start` to `end`, never negative
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Orders keyed by status name
pub fn group_by_status(orders: &[Order]) -> BTreeMap<String, Vec<&Order>> {
    let mut groups: BTreeMap<String, Vec<&Order>> = BTreeMap::new();
    for order in orders {
        groups.entry(order.status.to_string()).or_default().push(order);
    }
    groups
}

/// Orders grouped by creation day, newest day first, labelled like `"23 Feb"`.
///
/// Orders without a creation time are left out.
pub fn group_by_day(orders: &[Order]) -> Vec<(String, Vec<&Order>)> {
    let mut days: BTreeMap<NaiveDate, Vec<&Order>> = BTreeMap::new();
    for order in orders {
        if let Some(created) = order.created_at {
            days.entry(created.date_naive()).or_default().push(order);
        }
    }

    days.into_iter()
        .rev()
        .map(|(day, orders)| (day.format("%d %b").to_string(), orders))
        .collect()
}

/// Order counts by creation day for the seven days ending at `today`, oldest first.
///
/// Every status counts; orders without a creation time are left out.
pub fn weekly_counts(orders: &[Order], today: NaiveDate) -> Vec<DayCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for created in orders.iter().filter_map(|o| o.created_at) {
        *counts.entry(created.date_naive()).or_default() += 1;
    }

    (0..7u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| DayCount {
            date,
            label: date.format("%d %b").to_string(),
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Mean assigned-to-delivered time over delivered orders with both timestamps
pub fn average_delivery_minutes(orders: &[Order]) -> Option<f64> {
    let durations: Vec<i64> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .filter_map(|o| Some(minutes_between(o.assigned_at?, o.delivered_at?)))
        .collect();

    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
}

/// Sum of amounts over delivered orders
pub fn total_earnings(orders: &[Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .map(|o| o.total_amount)
        .sum()
}

/// Orders matching a history filter, in input order
pub fn filter_history(orders: &[Order], filter: HistoryFilter) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| match filter {
            HistoryFilter::All => true,
            HistoryFilter::Delivered => o.status == OrderStatus::Delivered,
            HistoryFilter::Cancelled => o.status == OrderStatus::Cancelled,
        })
        .collect()
}
