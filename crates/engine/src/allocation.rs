//! Subscription cost allocator.
//!
//! Converts per-cycle amounts into a monthly equivalent using fixed
//! calendar averages. The constants are part of the contract: changing
//! them changes every total shown to users.
//!
//! The conversion is applied once per participant share and the results are
//! summed, never the other way round.

use rust_decimal::Decimal;

use crate::{BillingCycle, CurrencyBalance, Ledger, Money, PersonId, Subscription};

/// Weeks per month (4.33).
pub const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);
/// Days per month (30.44).
pub const DAYS_PER_MONTH: Decimal = Decimal::from_parts(3044, 0, 0, false, 2);
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Monthly equivalent of an amount billed every `cycle`.
///
/// `Custom` cycles shorter than one day are clamped to one day. Results
/// saturate at the `Decimal` bounds instead of overflowing.
///
/// ```rust
/// use engine::{BillingCycle, monthly_equivalent};
/// use rust_decimal::Decimal;
///
/// assert_eq!(
///     monthly_equivalent(BillingCycle::Yearly, Decimal::from(1200)),
///     Decimal::from(100)
/// );
/// ```
#[must_use]
pub fn monthly_equivalent(cycle: BillingCycle, amount: Decimal) -> Decimal {
    match cycle {
        BillingCycle::Weekly => amount.saturating_mul(WEEKS_PER_MONTH),
        BillingCycle::Monthly => amount,
        BillingCycle::Yearly => amount / MONTHS_PER_YEAR,
        BillingCycle::Custom { days } => {
            let days = Decimal::from(days.max(1));
            amount.saturating_mul(DAYS_PER_MONTH / days)
        }
    }
}

/// One participant's monthly cost on a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticipantCost {
    pub person: PersonId,
    pub monthly: Money,
}

/// Monthly cost of `person`'s share of one subscription.
///
/// The owner carries the unassigned remainder; for a personal subscription
/// that is the whole cost. Returns `None` when `person` does not take part.
#[must_use]
pub fn share_monthly_cost(subscription: &Subscription, person: PersonId) -> Option<Money> {
    let mut monthly = Decimal::ZERO;
    let mut participates = false;

    if subscription.is_shared
        && let Some(share) = subscription.share_of(person)
    {
        monthly = monthly.saturating_add(monthly_equivalent(subscription.cycle, share));
        participates = true;
    }
    if subscription.owner == person {
        monthly = monthly.saturating_add(monthly_equivalent(
            subscription.cycle,
            subscription.owner_remainder(),
        ));
        participates = true;
    }

    participates.then(|| Money::new(monthly, subscription.currency()))
}

/// Per-participant monthly costs of a subscription, owner first.
///
/// The owner row is omitted when the subscribers carry the full cost and
/// the owner holds no share of their own.
#[must_use]
pub fn subscription_monthly_breakdown(subscription: &Subscription) -> Vec<ParticipantCost> {
    let mut rows = Vec::new();
    let owner_has_share = subscription.is_shared && subscription.share_of(subscription.owner).is_some();
    if !subscription.owner_remainder().is_zero() || owner_has_share {
        if let Some(monthly) = share_monthly_cost(subscription, subscription.owner) {
            rows.push(ParticipantCost {
                person: subscription.owner,
                monthly,
            });
        }
    }
    if subscription.is_shared {
        for share in &subscription.subscribers {
            if share.person == subscription.owner {
                continue;
            }
            rows.push(ParticipantCost {
                person: share.person,
                monthly: Money::new(
                    monthly_equivalent(subscription.cycle, share.amount),
                    subscription.currency(),
                ),
            });
        }
    }
    rows
}

/// Total monthly cost of every billable subscription, per currency.
///
/// Archived and inactive subscriptions are excluded.
#[must_use]
pub fn roster_monthly_total<'a, I>(subscriptions: I) -> CurrencyBalance
where
    I: IntoIterator<Item = &'a Subscription>,
{
    subscriptions
        .into_iter()
        .filter(|s| s.is_billable())
        .flat_map(subscription_monthly_breakdown)
        .map(|row| row.monthly)
        .collect()
}

/// The current user's monthly share across every billable subscription
/// they own or subscribe to.
#[must_use]
pub fn user_monthly_share(ledger: &Ledger, current_user: PersonId) -> CurrencyBalance {
    ledger
        .subscriptions_of(current_user)
        .filter(|s| s.is_billable())
        .filter_map(|s| share_monthly_cost(s, current_user))
        .collect()
}
