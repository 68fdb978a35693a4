//! # Domain Module
//!
//! Contains all business logic for the saldo tracker core.
//!
//! This module encapsulates the rules that make the tracker trustworthy: a
//! declared "current amount" must be reconciled against the last stored
//! balance, the gap must be explained with categorized line items whose
//! signed sum matches exactly, and the monthly dashboard splits must be
//! re-derivable from the transaction history alone. It operates
//! independently of any UI framework or storage backend.
//!
//! ## Module Organization
//!
//! - **validation**: pure field predicates and form-level aggregators
//! - **currency**: locale-aware peso formatting and live-input parsing
//! - **dates**: defensive, total date parsing
//! - **reconciliation**: the explanatory-record session and its validator
//! - **statistics_service**: balance folding and monthly stats derivation
//! - **registration_service**: the two-step registration workflow
//! - **commands**: internal command and result types used by the services
//!
//! ## Business Rules
//!
//! - A record's type is always derived from its category; `Ingreso` is the
//!   only income category
//! - Record amounts are non-negative magnitudes; the sign lives in the type
//! - The signed sum of a session's records must match the required
//!   difference within 0.01
//! - A session holds at most five records; adding past the cap is a no-op
//! - Monthly percentages are 0 when income is 0, never NaN or infinite
//! - Batch submission is sequential and non-atomic: a mid-batch failure
//!   aborts the rest without rolling back what already committed

pub mod commands;
pub mod currency;
pub mod dates;
pub mod reconciliation;
pub mod registration_service;
pub mod statistics_service;
pub mod validation;

pub use commands::*;
pub use reconciliation::*;
pub use registration_service::*;
pub use statistics_service::*;
