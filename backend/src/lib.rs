//! Core engine of the saldo personal-finance tracker.
//!
//! This crate holds the balance reconciliation and category-distribution
//! logic: input validation, currency and date normalization, the
//! reconciliation session and validator, monthly statistics derivation, and
//! the two-step registration workflow. Authentication and remote persistence
//! are external collaborators reached only through the traits in
//! [`storage`]; frontends consume the services in [`domain`] together with
//! the DTOs from the `shared` crate.

pub mod domain;
pub mod storage;
