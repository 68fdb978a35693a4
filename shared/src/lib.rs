use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum length of a reconciliation record description (display compactness)
pub const MAX_RECORD_DESCRIPTION_LENGTH: usize = 20;

/// Maximum number of explanatory records in one reconciliation session
pub const MAX_RECORDS_PER_SESSION: usize = 5;

/// Spending category for a balance movement.
///
/// `Ingreso` is the only income category; every other category is an expense
/// whose declared amount is a non-negative magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceCategory {
    /// Income (money coming in)
    Ingreso,
    /// Debt payment
    Deuda,
    /// Discretionary spending (wants)
    Consumo,
    /// Essential spending (needs)
    Necesidad,
    /// Capital allocation (investment)
    #[serde(rename = "Inversión")]
    Inversion,
}

impl BalanceCategory {
    /// All categories, in the order the UI presents them
    pub const ALL: [BalanceCategory; 5] = [
        BalanceCategory::Ingreso,
        BalanceCategory::Deuda,
        BalanceCategory::Consumo,
        BalanceCategory::Necesidad,
        BalanceCategory::Inversion,
    ];

    /// Derive the record type implied by this category
    pub fn record_type(&self) -> RecordType {
        match self {
            BalanceCategory::Ingreso => RecordType::Income,
            BalanceCategory::Deuda
            | BalanceCategory::Consumo
            | BalanceCategory::Necesidad
            | BalanceCategory::Inversion => RecordType::Expense,
        }
    }

    pub fn is_income(&self) -> bool {
        self.record_type() == RecordType::Income
    }

    /// User-facing label (Spanish, as stored)
    pub fn label(&self) -> &'static str {
        match self {
            BalanceCategory::Ingreso => "Ingreso",
            BalanceCategory::Deuda => "Deuda",
            BalanceCategory::Consumo => "Consumo",
            BalanceCategory::Necesidad => "Necesidad",
            BalanceCategory::Inversion => "Inversión",
        }
    }
}

impl fmt::Display for BalanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sign convention of a balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Positive contribution to the balance
    Income,
    /// Negative contribution to the balance
    Expense,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Income => write!(f, "income"),
            RecordType::Expense => write!(f, "expense"),
        }
    }
}

/// One explanatory line item within a reconciliation session.
///
/// Created transiently while the user explains a balance difference; never
/// persisted as-is. The `id` is session-local only and may collide with the
/// durable transaction id assigned at persistence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Session-local identifier (not a durable key)
    pub id: u32,
    /// Sign convention, always derived from `category`
    pub record_type: RecordType,
    /// Non-negative magnitude; the sign lives in `record_type`
    pub amount: f64,
    /// None while the user has not picked a category yet
    pub category: Option<BalanceCategory>,
    /// Free-text label, capped at `MAX_RECORD_DESCRIPTION_LENGTH`
    pub description: String,
}

impl BalanceRecord {
    /// New empty record with the category pre-seeded by the sign of the
    /// outstanding unexplained difference. The seed is a UI default only;
    /// validation never depends on it.
    pub fn for_difference(id: u32, outstanding_difference: f64) -> Self {
        let category = if outstanding_difference > 0.0 {
            Some(BalanceCategory::Ingreso)
        } else if outstanding_difference < 0.0 {
            Some(BalanceCategory::Necesidad)
        } else {
            None
        };
        Self {
            id,
            record_type: category.map(|c| c.record_type()).unwrap_or(RecordType::Expense),
            amount: 0.0,
            category,
            description: String::new(),
        }
    }

    /// Change the category, re-deriving the record type so the two can
    /// never disagree
    pub fn set_category(&mut self, category: BalanceCategory) {
        self.record_type = category.record_type();
        self.category = Some(category);
    }

    /// Store the entered magnitude; negatives collapse to their magnitude
    /// since the sign is carried by the record type
    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount.abs();
    }

    /// Store the description, truncated to the display cap
    pub fn set_description(&mut self, description: &str) {
        self.description = description
            .chars()
            .take(MAX_RECORD_DESCRIPTION_LENGTH)
            .collect();
    }

    /// Amount with the sign implied by the record type
    pub fn signed_amount(&self) -> f64 {
        match self.record_type {
            RecordType::Income => self.amount,
            RecordType::Expense => -self.amount,
        }
    }
}

/// A committed balance transaction, read back from history.
///
/// Id format: "in-<epoch_millis>-<hex>" or "ex-<epoch_millis>-<hex>".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRegistration {
    pub id: String,
    pub record_type: RecordType,
    pub category: BalanceCategory,
    /// Unsigned magnitude
    pub amount: f64,
    pub description: String,
    /// Timestamp with timezone (RFC 3339 on the wire)
    pub date: DateTime<FixedOffset>,
    /// Running balance snapshot immediately after this transaction
    pub balance_after: f64,
    pub month: u32,
    pub year: i32,
}

impl BalanceRegistration {
    /// Generate a durable transaction id from the record type and a
    /// millisecond timestamp. Example: ex-1625846400123-af3c
    pub fn generate_id(record_type: RecordType, timestamp_ms: u64) -> String {
        let prefix = match record_type {
            RecordType::Income => "in",
            RecordType::Expense => "ex",
        };
        format!("{}-{}-{}", prefix, timestamp_ms, Self::random_suffix(4))
    }

    fn random_suffix(len: usize) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        format!("{:x}", now % (16_u128.pow(len as u32)))
            .chars()
            .take(len)
            .collect()
    }

    /// Amount with the sign implied by the record type
    pub fn signed_amount(&self) -> f64 {
        match self.record_type {
            RecordType::Income => self.amount,
            RecordType::Expense => -self.amount,
        }
    }

    /// True if this registration falls in the given calendar month
    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }
}

/// Percentage split of a month's income across the budget buckets.
/// Savings is the residual "disponible" share, not a stored category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CategoryPercentages {
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
    pub investment: f64,
}

/// Balance change of one month versus the previous one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonthlyVariation {
    pub previous_balance: f64,
    /// 0 when the previous month's balance is 0 (never infinite)
    pub percentage_change: f64,
}

/// Derived statistics for one (year, month). Recomputed from the
/// registration history on demand; never authoritative on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub total_income: f64,
    pub total_expenses: f64,
    /// total_income - total_expenses
    pub balance: f64,
    /// Residual available amount: max(0, balance)
    pub disponible: f64,
    pub percentages: CategoryPercentages,
    pub variation: MonthlyVariation,
}

/// Field-level validation outcome for a form. A field absent from the error
/// map is valid; messages are user-facing strings. Fields are private so
/// `is_valid` always agrees with the error map; construct via [`Self::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormValidation {
    is_valid: bool,
    errors: HashMap<String, String>,
}

impl FormValidation {
    pub fn new(errors: HashMap<String, String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

impl Default for FormValidation {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

/// Login form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Account registration form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub monthly_income: Option<f64>,
    pub current_savings: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_determines_record_type() {
        assert_eq!(BalanceCategory::Ingreso.record_type(), RecordType::Income);
        for category in BalanceCategory::ALL {
            if category != BalanceCategory::Ingreso {
                assert_eq!(category.record_type(), RecordType::Expense);
            }
        }
    }

    #[test]
    fn set_category_rederives_type() {
        let mut record = BalanceRecord::for_difference(1, -500.0);
        assert_eq!(record.record_type, RecordType::Expense);

        record.set_category(BalanceCategory::Ingreso);
        assert_eq!(record.record_type, RecordType::Income);

        record.set_category(BalanceCategory::Inversion);
        assert_eq!(record.record_type, RecordType::Expense);
    }

    #[test]
    fn smart_default_follows_difference_sign() {
        let positive = BalanceRecord::for_difference(1, 50_000.0);
        assert_eq!(positive.category, Some(BalanceCategory::Ingreso));

        let negative = BalanceRecord::for_difference(2, -20_000.0);
        assert_eq!(negative.category, Some(BalanceCategory::Necesidad));

        let zero = BalanceRecord::for_difference(3, 0.0);
        assert_eq!(zero.category, None);
    }

    #[test]
    fn description_is_capped_at_twenty_chars() {
        let mut record = BalanceRecord::for_difference(1, 0.0);
        record.set_description("pago arriendo departamento centro");
        assert_eq!(record.description.chars().count(), 20);
    }

    #[test]
    fn negative_amount_input_collapses_to_magnitude() {
        let mut record = BalanceRecord::for_difference(1, -100.0);
        record.set_amount(-30_000.0);
        assert_eq!(record.amount, 30_000.0);
        assert_eq!(record.signed_amount(), -30_000.0);
    }

    #[test]
    fn registration_id_format() {
        let id = BalanceRegistration::generate_id(RecordType::Expense, 1625846400123);
        assert!(id.starts_with("ex-1625846400123-"));
        let id = BalanceRegistration::generate_id(RecordType::Income, 42);
        assert!(id.starts_with("in-42-"));
    }

    #[test]
    fn category_serde_uses_accented_wire_name() {
        let json = serde_json::to_string(&BalanceCategory::Inversion).unwrap();
        assert_eq!(json, "\"Inversión\"");
        let back: BalanceCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BalanceCategory::Inversion);

        let json = serde_json::to_string(&BalanceCategory::Necesidad).unwrap();
        assert_eq!(json, "\"Necesidad\"");
    }

    #[test]
    fn form_validation_absent_key_means_valid() {
        let mut errors = HashMap::new();
        errors.insert("email".to_string(), "Correo inválido".to_string());
        let validation = FormValidation::new(errors);
        assert!(!validation.is_valid());
        assert!(validation.error_for("email").is_some());
        assert!(validation.error_for("password").is_none());
    }

    #[test]
    fn form_validation_flag_tracks_error_map() {
        assert!(FormValidation::default().is_valid());
        assert!(FormValidation::new(HashMap::new()).is_valid());

        let mut errors = HashMap::new();
        errors.insert("age".to_string(), "La edad es obligatoria".to_string());
        let validation = FormValidation::new(errors);
        assert!(!validation.is_valid());
        assert_eq!(validation.errors().len(), 1);
    }
}
