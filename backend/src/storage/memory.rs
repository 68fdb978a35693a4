//! In-memory storage backend.
//!
//! Reference implementation of the storage traits, used by the domain tests
//! and handy for demos. It maintains the running `balance_after` chain the
//! same way a real backend must, and can inject write failures to exercise
//! the non-atomic batch submission policy.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use shared::{BalanceCategory, BalanceRegistration, MonthlyStats, RecordType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::storage::traits::{BalanceStore, Connection};

#[derive(Default)]
struct MemoryState {
    histories: HashMap<String, Vec<BalanceRegistration>>,
    /// Number of writes still allowed before injected failure; None = never fail
    writes_before_failure: Option<usize>,
}

/// In-memory connection shared across repositories via `Clone`
#[derive(Clone, Default)]
pub struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's history. Registrations are kept in date order.
    pub fn with_history(self, user_id: &str, mut history: Vec<BalanceRegistration>) -> Self {
        history.sort_by_key(|r| r.date);
        if let Ok(mut state) = self.state.lock() {
            state.histories.insert(user_id.to_string(), history);
        }
        self
    }

    /// Allow `n` more successful writes, then fail every write after
    pub fn fail_after(&self, n: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.writes_before_failure = Some(n);
        }
    }
}

impl Connection for MemoryConnection {
    type BalanceRepository = MemoryBalanceRepository;

    fn create_balance_repository(&self) -> Self::BalanceRepository {
        MemoryBalanceRepository {
            connection: self.clone(),
        }
    }
}

/// Balance repository over a [`MemoryConnection`]
#[derive(Clone)]
pub struct MemoryBalanceRepository {
    connection: MemoryConnection,
}

#[async_trait]
impl BalanceStore for MemoryBalanceRepository {
    async fn get_current_balance(&self, user_id: &str) -> Result<f64> {
        let state = lock(&self.connection)?;
        Ok(state
            .histories
            .get(user_id)
            .and_then(|h| h.last())
            .map(|r| r.balance_after)
            .unwrap_or(0.0))
    }

    async fn get_balance_history(&self, user_id: &str) -> Result<Vec<BalanceRegistration>> {
        let state = lock(&self.connection)?;
        Ok(state.histories.get(user_id).cloned().unwrap_or_default())
    }

    async fn get_monthly_stats(
        &self,
        _user_id: &str,
        _year: i32,
        _month: u32,
    ) -> Result<Option<MonthlyStats>> {
        // This backend precomputes nothing; stats are derived client-side
        Ok(None)
    }

    async fn register_balance(
        &self,
        user_id: &str,
        record_type: RecordType,
        description: &str,
        amount: f64,
        category: BalanceCategory,
    ) -> Result<bool> {
        let mut state = lock(&self.connection)?;

        if let Some(remaining) = state.writes_before_failure {
            if remaining == 0 {
                bail!("simulated storage failure");
            }
            state.writes_before_failure = Some(remaining - 1);
        }

        let history = state.histories.entry(user_id.to_string()).or_default();
        let previous_balance = history.last().map(|r| r.balance_after).unwrap_or(0.0);
        let signed = match record_type {
            RecordType::Income => amount,
            RecordType::Expense => -amount,
        };
        let date = Utc::now().fixed_offset();
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        history.push(BalanceRegistration {
            id: BalanceRegistration::generate_id(record_type, now_millis),
            record_type,
            category,
            amount,
            description: description.to_string(),
            date,
            balance_after: previous_balance + signed,
            month: date.month(),
            year: date.year(),
        });

        Ok(true)
    }
}

fn lock(connection: &MemoryConnection) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
    connection
        .state
        .lock()
        .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chains_balance_after_across_writes() {
        let connection = MemoryConnection::new();
        let repo = connection.create_balance_repository();

        repo.register_balance("u1", RecordType::Income, "sueldo", 100_000.0, BalanceCategory::Ingreso)
            .await
            .unwrap();
        repo.register_balance("u1", RecordType::Expense, "mercado", 30_000.0, BalanceCategory::Necesidad)
            .await
            .unwrap();

        assert_eq!(repo.get_current_balance("u1").await.unwrap(), 70_000.0);

        let history = repo.get_balance_history("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].balance_after, 100_000.0);
        assert_eq!(history[1].balance_after, 70_000.0);
        assert!(history[1].id.starts_with("ex-"));
    }

    #[tokio::test]
    async fn fresh_user_has_zero_balance_and_empty_history() {
        let connection = MemoryConnection::new();
        let repo = connection.create_balance_repository();

        assert_eq!(repo.get_current_balance("nadie").await.unwrap(), 0.0);
        assert!(repo.get_balance_history("nadie").await.unwrap().is_empty());
        assert!(repo.get_monthly_stats("nadie", 2024, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_injection_counts_writes() {
        let connection = MemoryConnection::new();
        connection.fail_after(1);
        let repo = connection.create_balance_repository();

        assert!(repo
            .register_balance("u1", RecordType::Income, "ok", 1_000.0, BalanceCategory::Ingreso)
            .await
            .is_ok());
        assert!(repo
            .register_balance("u1", RecordType::Income, "falla", 1_000.0, BalanceCategory::Ingreso)
            .await
            .is_err());

        // The first write is not rolled back
        assert_eq!(repo.get_balance_history("u1").await.unwrap().len(), 1);
    }
}
