//! Identity claim service.
//!
//! Ledger rows shared with someone who has no account are recorded against
//! the [`PhoneHash`] of their number. Once a profile verifies that number
//! the service attaches those rows to it, merging a duplicate profile that
//! already bears the same hash when needed.

pub use error::{IdentityError, VerificationError};
pub use ops::{
    ClaimReport, IdentityService, IdentityServiceBuilder, MaterializeReport, TransferCounts,
    VerifyOutcome,
};
pub use phone::{OneTimeCode, PhoneHash, PhoneNumber};
pub use profiles::PhoneStatus;
pub use verification::{
    HttpProviderConfig, HttpVerificationProvider, Unconfigured, VerificationProvider,
};

mod error;
mod ops;
mod phone;
pub mod profiles;
pub mod settlement_participants;
pub mod shared_reminders;
pub mod subscription_participants;
pub mod subscription_subscribers;
pub mod subscriptions;
pub mod transaction_participants;
mod verification;

type ResultIdentity<T> = Result<T, IdentityError>;
