//! Balance aggregation and monthly statistics derivation.
//!
//! Everything here is re-derivable from the stored transaction log: current
//! balance is the latest `balance_after`, and monthly stats fold the history
//! into income, bucket totals, percentage splits and month-over-month
//! variation. The pure functions take the history explicitly;
//! [`StatisticsService`] is the storage-backed face used by the dashboards.

use anyhow::Result;
use chrono::{Datelike, Utc};
use log::{info, warn};
use shared::{
    BalanceCategory, BalanceRegistration, CategoryPercentages, MonthlyStats, MonthlyVariation,
};
use std::sync::Arc;

use crate::domain::commands::statistics::{MonthlySeriesQuery, MonthlyStatsQuery};
use crate::storage::{BalanceStore, Connection};

/// Epsilon for balance-chain comparisons
const BALANCE_EPSILON: f64 = 0.001;

/// Latest known balance, or the declared baseline when the history is empty
pub fn current_balance(history: &[BalanceRegistration], baseline: f64) -> f64 {
    history
        .iter()
        .max_by_key(|r| r.date)
        .map(|r| r.balance_after)
        .unwrap_or(baseline)
}

/// Derive one month's statistics from the full history.
///
/// Expenses are split into the three budget buckets (needs, wants,
/// investment); `Deuda` keeps its expense sign for the balance chain but
/// sits outside the buckets. Percentages are each bucket's share of income,
/// 0–100 with 2 decimals, and all 0 when income is 0.
pub fn compute_monthly_stats(history: &[BalanceRegistration], year: i32, month: u32) -> MonthlyStats {
    let (total_income, needs, wants, investment) = month_totals(history, year, month);

    let total_expenses = needs + wants + investment;
    let balance = total_income - total_expenses;
    let disponible = balance.max(0.0);

    let percentages = if total_income > 0.0 {
        CategoryPercentages {
            needs: percentage_of(needs, total_income),
            wants: percentage_of(wants, total_income),
            savings: percentage_of(disponible, total_income),
            investment: percentage_of(investment, total_income),
        }
    } else {
        // Zero income: every percentage is defined as 0, never NaN
        CategoryPercentages::default()
    };

    let (prev_year, prev_month) = previous_month(year, month);
    let previous_balance = month_balance(history, prev_year, prev_month);
    let percentage_change = if previous_balance == 0.0 {
        0.0
    } else {
        round2((balance - previous_balance) / previous_balance * 100.0)
    };

    MonthlyStats {
        year,
        month,
        total_income,
        total_expenses,
        balance,
        disponible,
        percentages,
        variation: MonthlyVariation {
            previous_balance,
            percentage_change,
        },
    }
}

/// Trailing window of monthly stats ending at (year, month), oldest first.
/// `months_back` includes the anchor month; 0 yields an empty series.
pub fn monthly_series(
    history: &[BalanceRegistration],
    year: i32,
    month: u32,
    months_back: u32,
) -> Vec<MonthlyStats> {
    let mut series = Vec::with_capacity(months_back as usize);
    let (mut y, mut m) = (year, month);
    for _ in 0..months_back {
        series.push(compute_monthly_stats(history, y, m));
        let (py, pm) = previous_month(y, m);
        y = py;
        m = pm;
    }
    series.reverse();
    series
}

/// Diagnostic pass over the `balance_after` chain.
///
/// The first record anchors the chain; every subsequent record must equal
/// the previous snapshot plus its own signed amount. Returns one message per
/// violation.
pub fn validate_history(history: &[BalanceRegistration]) -> Vec<String> {
    let mut ordered: Vec<&BalanceRegistration> = history.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let mut errors = Vec::new();
    let mut previous_balance: Option<f64> = None;

    for registration in ordered {
        if let Some(previous) = previous_balance {
            let expected = previous + registration.signed_amount();
            if (registration.balance_after - expected).abs() > BALANCE_EPSILON {
                errors.push(format!(
                    "Registration {} has incorrect balance: expected {:.2}, actual {:.2}",
                    registration.id, expected, registration.balance_after
                ));
            }
        }
        previous_balance = Some(registration.balance_after);
    }

    errors
}

fn month_totals(history: &[BalanceRegistration], year: i32, month: u32) -> (f64, f64, f64, f64) {
    let mut income = 0.0;
    let mut needs = 0.0;
    let mut wants = 0.0;
    let mut investment = 0.0;

    for registration in history.iter().filter(|r| r.in_month(year, month)) {
        match registration.category {
            BalanceCategory::Ingreso => income += registration.amount,
            BalanceCategory::Necesidad => needs += registration.amount,
            BalanceCategory::Consumo => wants += registration.amount,
            BalanceCategory::Inversion => investment += registration.amount,
            // Debt payments stay outside the budget buckets
            BalanceCategory::Deuda => {}
        }
    }

    (income, needs, wants, investment)
}

fn month_balance(history: &[BalanceRegistration], year: i32, month: u32) -> f64 {
    let (income, needs, wants, investment) = month_totals(history, year, month);
    income - (needs + wants + investment)
}

fn percentage_of(part: f64, income: f64) -> f64 {
    round2((part / income * 100.0).clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Storage-backed statistics queries for the dashboards
#[derive(Clone)]
pub struct StatisticsService<C: Connection> {
    balance_repository: C::BalanceRepository,
}

impl<C: Connection> StatisticsService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let balance_repository = connection.create_balance_repository();
        Self { balance_repository }
    }

    /// Last known balance for the user
    pub async fn current_balance(&self, user_id: &str) -> Result<f64> {
        self.balance_repository.get_current_balance(user_id).await
    }

    /// Stats for one month. A server-precomputed result is honored when the
    /// store offers one; otherwise the stats are derived from the history.
    pub async fn monthly_stats(&self, query: MonthlyStatsQuery) -> Result<MonthlyStats> {
        if let Some(stats) = self
            .balance_repository
            .get_monthly_stats(&query.user_id, query.year, query.month)
            .await?
        {
            info!("using precomputed stats for {}/{}", query.month, query.year);
            return Ok(stats);
        }

        let history = self
            .balance_repository
            .get_balance_history(&query.user_id)
            .await?;
        Ok(compute_monthly_stats(&history, query.year, query.month))
    }

    /// Trailing monthly stats for trend charts, oldest first
    pub async fn monthly_series(&self, query: MonthlySeriesQuery) -> Result<Vec<MonthlyStats>> {
        let history = self
            .balance_repository
            .get_balance_history(&query.user_id)
            .await?;
        Ok(monthly_series(&history, query.year, query.month, query.months_back))
    }

    /// Stats for the month containing "now"
    pub async fn current_month_stats(&self, user_id: &str) -> Result<MonthlyStats> {
        let now = Utc::now();
        self.monthly_stats(MonthlyStatsQuery {
            user_id: user_id.to_string(),
            year: now.year(),
            month: now.month(),
        })
        .await
    }

    /// Check the balance chain of a user's history, logging violations
    pub async fn check_history_integrity(&self, user_id: &str) -> Result<Vec<String>> {
        let history = self
            .balance_repository
            .get_balance_history(user_id)
            .await?;
        let errors = validate_history(&history);

        if errors.is_empty() {
            info!("balance chain is consistent for user {}", user_id);
        } else {
            warn!("found {} balance chain errors for user {}", errors.len(), user_id);
        }

        Ok(errors)
    }
}
