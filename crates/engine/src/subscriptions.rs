//! Recurring shared costs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, Money, PersonId, SubscriptionId};

/// How often a subscription bills.
///
/// `Custom` carries the cycle length in days as entered by the user; the
/// allocator clamps anything below one day to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "cycle", rename_all = "camelCase")]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Yearly,
    Custom {
        #[serde(rename = "customCycleDays")]
        days: i32,
    },
}

/// A subscriber's per-cycle share of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionShare {
    pub person: PersonId,
    pub amount: Decimal,
}

/// A recurring cost, optionally shared with an ordered set of subscribers.
///
/// Subscriber shares never sum above `cost`; the remainder belongs to the
/// owner, the same way an unsplit transaction remainder belongs to the
/// payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub owner: PersonId,
    #[serde(flatten)]
    pub cycle: BillingCycle,
    pub cost: Money,
    pub is_shared: bool,
    pub is_active: bool,
    pub is_archived: bool,
    pub subscribers: Vec<SubscriptionShare>,
}

impl Subscription {
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.cost.currency
    }

    /// Only active, non-archived subscriptions contribute to any total.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.is_active && !self.is_archived
    }

    /// Sum of the subscriber shares.
    #[must_use]
    pub fn assigned(&self) -> Decimal {
        self.subscribers
            .iter()
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.amount))
    }

    /// Part of the per-cycle cost no subscriber carries.
    #[must_use]
    pub fn owner_remainder(&self) -> Decimal {
        if !self.is_shared {
            return self.cost.amount;
        }
        self.cost.amount.saturating_sub(self.assigned())
    }

    #[must_use]
    pub fn share_of(&self, person: PersonId) -> Option<Decimal> {
        self.subscribers
            .iter()
            .find(|s| s.person == person)
            .map(|s| s.amount)
    }
}

/// Input for [`Ledger::add_subscription`](crate::Ledger::add_subscription).
#[derive(Clone, Debug)]
pub struct SubscriptionNew {
    pub name: String,
    pub owner: PersonId,
    pub cycle: BillingCycle,
    pub cost: Money,
    pub is_shared: bool,
    pub subscribers: Vec<SubscriptionShare>,
}
