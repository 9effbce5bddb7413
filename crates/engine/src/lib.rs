//! Ledger reconciliation engine.
//!
//! Turns recorded monetary events (transactions with splits, settlements,
//! subscription shares) into a "who owes whom, in which currency" answer.
//!
//! Entities live in a [`Ledger`]; the balance engine ([`balance`],
//! [`people_you_owe`], [`summary`]) and the subscription allocator
//! ([`monthly_equivalent`], [`user_monthly_share`]) are pure functions over
//! a ledger snapshot. The engine never formats amounts: callers receive
//! decimals bucketed by currency code and render them however they like.

pub use allocation::{
    DAYS_PER_MONTH, ParticipantCost, WEEKS_PER_MONTH, monthly_equivalent, roster_monthly_total,
    share_monthly_cost, subscription_monthly_breakdown, user_monthly_share,
};
pub use balances::{
    BalanceSummary, PersonBalance, balance, pairwise_balances, people_who_owe_you, people_you_owe,
    summary,
};
pub use contacts::{Clock, ContactsCache, SystemClock};
pub use currency::CurrencyCode;
pub use error::LedgerError;
pub use ids::{PersonId, SettlementId, SplitId, SubscriptionId, TransactionId};
pub use ledger::{Ledger, Removal};
pub use money::{CurrencyBalance, Money};
pub use people::Person;
pub use settlements::Settlement;
pub use subscriptions::{BillingCycle, Subscription, SubscriptionNew, SubscriptionShare};
pub use transactions::{FinancialTransaction, SplitNew, TransactionNew, TransactionSplit};

mod allocation;
mod balances;
mod contacts;
mod currency;
mod error;
mod ids;
mod ledger;
mod money;
mod people;
mod settlements;
mod subscriptions;
mod transactions;

pub type ResultLedger<T> = Result<T, LedgerError>;
