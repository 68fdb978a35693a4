//! Two-step balance registration workflow.
//!
//! The user declares a current amount, the flow computes the signed
//! difference against the last known balance, the user explains the
//! difference with a reconciliation session, and the flow persists each
//! record as an independent transaction.
//!
//! Submission is sequential and non-atomic: when one persistence call fails
//! the remaining calls are aborted and the records already written stay
//! written. Retrying may therefore duplicate them; the error names how many
//! committed so the caller can warn the user. There is also no timeout or
//! cancellation for an in-flight batch, so a stuck remote call stalls the
//! flow. Both are inherited limitations, kept visible rather than patched.

use anyhow::Result;
use log::{error, info};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::commands::registration::{BeginRegistrationCommand, SubmitRecordsResult};
use crate::domain::currency::format_currency;
use crate::domain::reconciliation::{ReconciliationError, ReconciliationSession};
use crate::domain::validation::validate_amount;
use crate::storage::{BalanceStore, Connection};

/// Where a registration flow currently stands
#[derive(Debug)]
pub enum RegistrationStep {
    /// Waiting for the user-declared current amount
    AwaitingCurrentAmount,
    /// Collecting the explanatory records for the computed difference
    AwaitingReconciliationRecords(ReconciliationSession),
    /// Batch persistence in flight; no cancellation once started
    Submitting,
    /// Every record committed; terminal
    Complete,
}

/// Workflow-level failures
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Ingresa un monto válido mayor que cero")]
    InvalidAmount,
    #[error("La operación no corresponde al paso actual del registro")]
    InvalidStep,
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
    #[error("No se pudo guardar el registro {failed_index} de {total}; {committed} ya quedaron guardados y no se revierten")]
    Persistence {
        committed: usize,
        failed_index: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// One user's in-memory registration flow. Created by
/// [`RegistrationService::begin`] and driven by the screens.
#[derive(Debug)]
pub struct RegistrationFlow {
    user_id: String,
    last_known_balance: f64,
    step: RegistrationStep,
}

impl RegistrationFlow {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn last_known_balance(&self) -> f64 {
        self.last_known_balance
    }

    pub fn step(&self) -> &RegistrationStep {
        &self.step
    }

    /// Accept the declared current amount and advance to record collection.
    /// Returns the required difference the records must explain.
    pub fn submit_current_amount(&mut self, input: &str) -> Result<f64, WorkflowError> {
        if !matches!(self.step, RegistrationStep::AwaitingCurrentAmount) {
            return Err(WorkflowError::InvalidStep);
        }
        let amount = validate_amount(input).ok_or(WorkflowError::InvalidAmount)?;
        let required_difference = amount - self.last_known_balance;

        info!(
            "current amount {} declared, difference to explain {:.2}",
            format_currency(amount, true),
            required_difference
        );
        self.step =
            RegistrationStep::AwaitingReconciliationRecords(ReconciliationSession::new(required_difference));
        Ok(required_difference)
    }

    /// The live session, while collecting records
    pub fn session_mut(&mut self) -> Option<&mut ReconciliationSession> {
        match &mut self.step {
            RegistrationStep::AwaitingReconciliationRecords(session) => Some(session),
            _ => None,
        }
    }

    /// Step backwards, discarding not-yet-submitted edits. No persistence
    /// side effect; a no-op outside the record-collection step.
    pub fn back(&mut self) {
        if matches!(self.step, RegistrationStep::AwaitingReconciliationRecords(_)) {
            info!("discarding reconciliation session on back navigation");
            self.step = RegistrationStep::AwaitingCurrentAmount;
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.step, RegistrationStep::Complete)
    }
}

/// Orchestrates the registration workflow against the persistence boundary
#[derive(Clone)]
pub struct RegistrationService<C: Connection> {
    balance_repository: C::BalanceRepository,
}

impl<C: Connection> RegistrationService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let balance_repository = connection.create_balance_repository();
        Self { balance_repository }
    }

    /// Open a flow for the user, anchored at their last known balance
    pub async fn begin(&self, command: BeginRegistrationCommand) -> Result<RegistrationFlow> {
        let last_known_balance = self
            .balance_repository
            .get_current_balance(&command.user_id)
            .await?;

        info!(
            "registration flow opened for user {}, last known balance {:.2}",
            command.user_id, last_known_balance
        );
        Ok(RegistrationFlow {
            user_id: command.user_id,
            last_known_balance,
            step: RegistrationStep::AwaitingCurrentAmount,
        })
    }

    /// Validate the session and persist every record, one call at a time.
    ///
    /// On the first failure the rest of the batch is aborted and the flow
    /// returns to record collection so the user can retry; nothing already
    /// written is rolled back.
    pub async fn submit(&self, flow: &mut RegistrationFlow) -> Result<SubmitRecordsResult, WorkflowError> {
        let session = match std::mem::replace(&mut flow.step, RegistrationStep::Submitting) {
            RegistrationStep::AwaitingReconciliationRecords(session) => session,
            other => {
                flow.step = other;
                return Err(WorkflowError::InvalidStep);
            }
        };

        if let Err(validation) = session.validate() {
            flow.step = RegistrationStep::AwaitingReconciliationRecords(session);
            return Err(validation.into());
        }

        let signed_total = session.signed_total();
        let records = session.clone().into_records();
        let total = records.len();

        for (index, record) in records.iter().enumerate() {
            let category = match record.category {
                Some(category) => category,
                None => {
                    // validate() already rejected this; guard anyway
                    flow.step = RegistrationStep::AwaitingReconciliationRecords(session);
                    return Err(ReconciliationError::MissingCategory.into());
                }
            };

            let outcome = self
                .balance_repository
                .register_balance(
                    &flow.user_id,
                    record.record_type,
                    &record.description,
                    record.amount,
                    category,
                )
                .await;

            let accepted = match outcome {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!(
                        "persistence failed on record {}/{} after {} commits: {}",
                        index + 1,
                        total,
                        index,
                        err
                    );
                    flow.step = RegistrationStep::AwaitingReconciliationRecords(session);
                    return Err(WorkflowError::Persistence {
                        committed: index,
                        failed_index: index + 1,
                        total,
                        source: err,
                    });
                }
            };

            if !accepted {
                error!("store rejected record {}/{}", index + 1, total);
                flow.step = RegistrationStep::AwaitingReconciliationRecords(session);
                return Err(WorkflowError::Persistence {
                    committed: index,
                    failed_index: index + 1,
                    total,
                    source: anyhow::anyhow!("el servicio rechazó el registro"),
                });
            }
        }

        let new_balance = flow.last_known_balance + signed_total;
        flow.step = RegistrationStep::Complete;
        info!(
            "registration complete for user {}: {} records, new balance {:.2}",
            flow.user_id, total, new_balance
        );

        Ok(SubmitRecordsResult {
            records_committed: total,
            new_balance,
            success_message: format!(
                "Se registraron {} movimientos. Nuevo saldo: {}",
                total,
                format_currency(new_balance, true)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryConnection;
    use shared::BalanceCategory;

    async fn seeded_service(
        user_id: &str,
        opening_amount: f64,
    ) -> (Arc<MemoryConnection>, RegistrationService<MemoryConnection>) {
        let connection = Arc::new(MemoryConnection::new());
        let service = RegistrationService::new(connection.clone());

        if opening_amount > 0.0 {
            let repo = connection.create_balance_repository();
            repo.register_balance(
                user_id,
                shared::RecordType::Income,
                "saldo inicial",
                opening_amount,
                BalanceCategory::Ingreso,
            )
            .await
            .unwrap();
        }

        (connection, service)
    }

    #[tokio::test]
    async fn happy_path_single_income_record() {
        let (connection, service) = seeded_service("u1", 100_000.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(flow.last_known_balance(), 100_000.0);

        let difference = flow.submit_current_amount("150000").unwrap();
        assert_eq!(difference, 50_000.0);

        {
            let session = flow.session_mut().unwrap();
            let id = session.add_record().map(|r| r.id).unwrap();
            session.set_amount(id, 50_000.0);
            session.set_description(id, "venta bicicleta");
        }

        let result = service.submit(&mut flow).await.unwrap();
        assert_eq!(result.records_committed, 1);
        assert_eq!(result.new_balance, 150_000.0);
        assert!(flow.is_complete());

        let history = connection
            .create_balance_repository()
            .get_balance_history("u1")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].category, BalanceCategory::Ingreso);
        assert_eq!(history[1].amount, 50_000.0);
        assert_eq!(history[1].balance_after, 150_000.0);
    }

    #[tokio::test]
    async fn invalid_amount_blocks_the_first_transition() {
        let (_connection, service) = seeded_service("u1", 0.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            flow.submit_current_amount(""),
            Err(WorkflowError::InvalidAmount)
        ));
        assert!(matches!(
            flow.submit_current_amount("cero"),
            Err(WorkflowError::InvalidAmount)
        ));
        assert!(matches!(flow.step(), RegistrationStep::AwaitingCurrentAmount));
    }

    #[tokio::test]
    async fn mismatch_is_rejected_before_any_persistence() {
        let (connection, service) = seeded_service("u1", 100_000.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        flow.submit_current_amount("150000").unwrap();

        {
            let session = flow.session_mut().unwrap();
            let id = session.add_record().map(|r| r.id).unwrap();
            session.set_amount(id, 49_000.0);
        }

        let err = service.submit(&mut flow).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Reconciliation(ReconciliationError::SumMismatch { .. })
        ));

        // Nothing was persisted and the session survives for editing
        let history = connection
            .create_balance_repository()
            .get_balance_history("u1")
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(flow.session_mut().is_some());
    }

    #[tokio::test]
    async fn mid_batch_failure_aborts_without_rollback() {
        let (connection, service) = seeded_service("u1", 100_000.0).await;
        // The seed write already happened; allow one batch write, then fail
        connection.fail_after(1);

        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        flow.submit_current_amount("80000").unwrap();

        {
            let session = flow.session_mut().unwrap();
            let first = session.add_record().map(|r| r.id).unwrap();
            session.set_category(first, BalanceCategory::Consumo);
            session.set_amount(first, 30_000.0);
            let second = session.add_record().map(|r| r.id).unwrap();
            session.set_category(second, BalanceCategory::Ingreso);
            session.set_amount(second, 10_000.0);
        }

        let err = service.submit(&mut flow).await.unwrap_err();
        match err {
            WorkflowError::Persistence {
                committed,
                failed_index,
                total,
                ..
            } => {
                assert_eq!(committed, 1);
                assert_eq!(failed_index, 2);
                assert_eq!(total, 2);
            }
            other => panic!("expected persistence error, got {:?}", other),
        }

        // The first record stays committed; the flow is back on the records
        // step so the user can retry, at the risk of duplicating it
        let history = connection
            .create_balance_repository()
            .get_balance_history("u1")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(flow.session_mut().is_some());
        assert!(!flow.is_complete());
    }

    #[tokio::test]
    async fn back_discards_the_session() {
        let (_connection, service) = seeded_service("u1", 50_000.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        flow.submit_current_amount("60000").unwrap();
        flow.session_mut().unwrap().add_record();

        flow.back();
        assert!(matches!(flow.step(), RegistrationStep::AwaitingCurrentAmount));

        // Re-entering starts a fresh session
        flow.submit_current_amount("60000").unwrap();
        assert!(flow.session_mut().unwrap().records().is_empty());
    }

    #[tokio::test]
    async fn submit_requires_the_records_step() {
        let (_connection, service) = seeded_service("u1", 0.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service.submit(&mut flow).await.unwrap_err(),
            WorkflowError::InvalidStep
        ));
        assert!(matches!(flow.step(), RegistrationStep::AwaitingCurrentAmount));
    }

    #[tokio::test]
    async fn zero_difference_submits_with_no_records() {
        let (_connection, service) = seeded_service("u1", 100_000.0).await;
        let mut flow = service
            .begin(BeginRegistrationCommand {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        let difference = flow.submit_current_amount("100000").unwrap();
        assert_eq!(difference, 0.0);

        let result = service.submit(&mut flow).await.unwrap();
        assert_eq!(result.records_committed, 0);
        assert_eq!(result.new_balance, 100_000.0);
        assert!(flow.is_complete());
    }
}
