//! Errors raised by the identity claim service.
//!
//! [`IdentityError`] follows the failure taxonomy of the service:
//!
//! - validation ([`InvalidPhone`], [`InvalidCode`], [`InvalidInput`]): bad
//!   input rejected before any side effect;
//! - authorization ([`Unauthorized`]);
//! - provider outcomes ([`Verification`]);
//! - consistency ([`LinkingFailed`]): a merge or link transaction was rolled
//!   back, nothing was changed;
//! - storage ([`Database`]).
//!
//!  [`InvalidPhone`]: IdentityError::InvalidPhone
//!  [`InvalidCode`]: IdentityError::InvalidCode
//!  [`InvalidInput`]: IdentityError::InvalidInput
//!  [`Unauthorized`]: IdentityError::Unauthorized
//!  [`Verification`]: IdentityError::Verification
//!  [`LinkingFailed`]: IdentityError::LinkingFailed
//!  [`Database`]: IdentityError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Outcome of a rejected call to the verification provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Wrong or expired code; the user may try again.
    #[error("incorrect_code")]
    IncorrectCode,
    /// The provider locked this code; a new one must be requested.
    #[error("too_many_attempts")]
    TooManyAttempts,
    /// The provider refused the phone number itself.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    /// Network failure or provider outage.
    #[error("transient_provider_failure: {0}")]
    Transient(String),
    /// No provider credentials were configured.
    #[error("verification service not configured")]
    NotConfigured,
}

impl VerificationError {
    /// Whether retrying the same call can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("Invalid verification code: {0}")]
    InvalidCode(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("Linking failed")]
    LinkingFailed,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for IdentityError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidPhone(a), Self::InvalidPhone(b)) => a == b,
            (Self::InvalidCode(a), Self::InvalidCode(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Unauthorized, Self::Unauthorized) => true,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Verification(a), Self::Verification(b)) => a == b,
            (Self::LinkingFailed, Self::LinkingFailed) => true,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
