//! # Storage Traits
//!
//! Interface boundary to the external collaborators: the authentication
//! provider and the balance persistence layer. The domain services work
//! against these traits so any backend (remote store, local file, in-memory
//! test double) can stand behind them without domain changes.

use anyhow::Result;
use async_trait::async_trait;
use shared::{BalanceCategory, BalanceRegistration, MonthlyStats, RecordType};

/// Callback invoked whenever the signed-in user changes
pub type AuthCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Authentication collaborator.
///
/// The domain services take a resolved user id as an explicit parameter and
/// never query auth state themselves; this trait exists so the wiring layer
/// has a typed boundary to hang a session provider on.
pub trait AuthService: Send + Sync {
    /// Currently signed-in user, if any
    fn current_user_id(&self) -> Option<String>;

    /// Subscribe to auth state changes. Dropping the returned subscription
    /// unsubscribes.
    fn on_auth_state_changed(&self, callback: AuthCallback) -> AuthSubscription;
}

/// Guard for an auth-state subscription; unsubscribes on drop
pub struct AuthSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl AuthSubscription {
    pub fn new(unsubscribe: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            unsubscribe: Some(unsubscribe),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

/// Trait defining the interface for balance persistence operations
///
/// The history is treated as an append-only log and refetched wholesale;
/// there is no incremental patching or multi-writer merge at this boundary.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Last known balance for the user (0 for a fresh account)
    async fn get_current_balance(&self, user_id: &str) -> Result<f64>;

    /// Full transaction history, ordered by date ascending
    async fn get_balance_history(&self, user_id: &str) -> Result<Vec<BalanceRegistration>>;

    /// Server-precomputed stats for a month, if the backend offers them.
    /// `None` means the caller derives them client-side from the history.
    async fn get_monthly_stats(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyStats>>;

    /// Persist one explanatory record as an independent transaction.
    /// Returns whether the backend accepted the write.
    async fn register_balance(
        &self,
        user_id: &str,
        record_type: RecordType,
        description: &str,
        amount: f64,
        category: BalanceCategory,
    ) -> Result<bool>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts the concrete connection type and provides a factory for
/// repositories, so the domain layer stays independent of the backend.
pub trait Connection: Send + Sync + Clone {
    /// The type of BalanceStore this connection creates
    type BalanceRepository: BalanceStore;

    /// Create a new balance repository for this connection
    fn create_balance_repository(&self) -> Self::BalanceRepository;
}
