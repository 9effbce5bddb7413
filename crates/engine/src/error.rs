//! The module contains the errors the ledger can throw.
//!
//! Every error is raised at write time: the read paths (balances,
//! monthly allocation) are total over a ledger that passed these checks.
//!
//! - [`KeyNotFound`] thrown when a referenced entity does not exist.
//! - [`InvalidSplit`] thrown when splits would exceed the transaction amount.
//! - [`CurrencyMismatch`] thrown when money in two currencies is combined.
//!
//!  [`KeyNotFound`]: LedgerError::KeyNotFound
//!  [`InvalidSplit`]: LedgerError::InvalidSplit
//!  [`CurrencyMismatch`]: LedgerError::CurrencyMismatch
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("\"{0}\" is archived")]
    Archived(String),
}
