//! Stable identifiers for ledger entities.
//!
//! Every relationship in the ledger is a foreign key holding one of these
//! ids; the [`Ledger`](crate::Ledger) resolves them through its indexes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

ledger_id!(
    /// Identifier of a [`Person`](crate::Person).
    PersonId
);
ledger_id!(
    /// Identifier of a [`FinancialTransaction`](crate::FinancialTransaction).
    TransactionId
);
ledger_id!(
    /// Identifier of a [`TransactionSplit`](crate::TransactionSplit).
    SplitId
);
ledger_id!(
    /// Identifier of a [`Settlement`](crate::Settlement).
    SettlementId
);
ledger_id!(
    /// Identifier of a [`Subscription`](crate::Subscription).
    SubscriptionId
);
