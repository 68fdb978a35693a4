//! Reconciliation session and validator.
//!
//! A reconciliation session explains the gap between a user-declared current
//! amount and the last stored balance. The user adds up to five categorized
//! line items; the session is valid when every record has a category and the
//! signed sum of the records matches the required difference within a small
//! tolerance that absorbs floating-point drift.

use log::{info, warn};
use shared::{BalanceCategory, BalanceRecord, MAX_RECORDS_PER_SESSION};
use thiserror::Error;

/// Tolerance for the signed-sum comparison, in currency units
pub const SUM_TOLERANCE: f64 = 0.01;

/// Why a record set does not explain the required difference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconciliationError {
    #[error("Agrega al menos un registro que explique la diferencia")]
    EmptyRecords,
    #[error("Todos los registros deben tener una categoría")]
    MissingCategory,
    #[error("La suma de los registros ({signed_total:.2}) no coincide con la diferencia requerida ({required_difference:.2})")]
    SumMismatch {
        signed_total: f64,
        required_difference: f64,
    },
}

/// Sum of record amounts with income positive and expense negative
pub fn signed_total(records: &[BalanceRecord]) -> f64 {
    records.iter().map(|r| r.signed_amount()).sum()
}

/// Sum of record magnitudes, for display summaries only
pub fn absolute_total(records: &[BalanceRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// Validate that a record set explains `required_difference` exactly.
///
/// An empty set is only acceptable when there is nothing to explain. The
/// category pre-selection heuristic plays no role here; only the final sum
/// and category presence matter.
pub fn validate(records: &[BalanceRecord], required_difference: f64) -> Result<(), ReconciliationError> {
    if records.is_empty() {
        if required_difference != 0.0 {
            return Err(ReconciliationError::EmptyRecords);
        }
        return Ok(());
    }

    if records.iter().any(|r| r.category.is_none()) {
        return Err(ReconciliationError::MissingCategory);
    }

    let total = signed_total(records);
    if (total - required_difference).abs() > SUM_TOLERANCE {
        return Err(ReconciliationError::SumMismatch {
            signed_total: total,
            required_difference,
        });
    }

    Ok(())
}

/// In-memory editing session for one reconciliation.
///
/// Single active editor, single device: the session is plain mutable state
/// with no locking. Records are discarded on cancel and converted 1:1 into
/// persisted transactions on successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationSession {
    required_difference: f64,
    records: Vec<BalanceRecord>,
    next_id: u32,
}

impl ReconciliationSession {
    pub fn new(required_difference: f64) -> Self {
        info!("opening reconciliation session, required difference {:.2}", required_difference);
        Self {
            required_difference,
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn required_difference(&self) -> f64 {
        self.required_difference
    }

    pub fn records(&self) -> &[BalanceRecord] {
        &self.records
    }

    /// Portion of the required difference the current records leave
    /// unexplained; used to seed the next record's default category
    pub fn outstanding_difference(&self) -> f64 {
        self.required_difference - signed_total(&self.records)
    }

    /// Add a new record seeded by the sign of the outstanding difference.
    /// A no-op once the session holds five records (UI-level guard, not a
    /// data invariant).
    pub fn add_record(&mut self) -> Option<&mut BalanceRecord> {
        if self.records.len() >= MAX_RECORDS_PER_SESSION {
            warn!("record cap reached, ignoring add");
            return None;
        }
        let record = BalanceRecord::for_difference(self.next_id, self.outstanding_difference());
        self.next_id += 1;
        self.records.push(record);
        self.records.last_mut()
    }

    /// Remove a record by its session-local id
    pub fn remove_record(&mut self, id: u32) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    pub fn record_mut(&mut self, id: u32) -> Option<&mut BalanceRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn set_amount(&mut self, id: u32, amount: f64) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.set_amount(amount);
                true
            }
            None => false,
        }
    }

    /// Change a record's category; the record re-derives its type
    pub fn set_category(&mut self, id: u32, category: BalanceCategory) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.set_category(category);
                true
            }
            None => false,
        }
    }

    pub fn set_description(&mut self, id: u32, description: &str) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.set_description(description);
                true
            }
            None => false,
        }
    }

    pub fn signed_total(&self) -> f64 {
        signed_total(&self.records)
    }

    pub fn absolute_total(&self) -> f64 {
        absolute_total(&self.records)
    }

    pub fn validate(&self) -> Result<(), ReconciliationError> {
        validate(&self.records, self.required_difference)
    }

    /// Consume the session, yielding the records for submission
    pub fn into_records(self) -> Vec<BalanceRecord> {
        self.records
    }
}
