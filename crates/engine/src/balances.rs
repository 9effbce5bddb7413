//! The balance engine.
//!
//! Every function here is a pure fold over a [`Ledger`] snapshot: nothing is
//! cached and nothing is mutated, so callers recompute on every refresh.
//!
//! Sign convention: a negative bucket means the subject owes, a positive
//! bucket means the subject is owed.

use rust_decimal::Decimal;

use crate::{CurrencyBalance, Ledger, Money, PersonId};

/// Net position of `subject`, bucketed by currency.
///
/// With `against = Some(counterpart)` only debts between the two are
/// considered (the settle-up view); with `None` the whole group counts.
///
/// - A split owed by the subject on someone else's transaction: subtract.
/// - A split owed by someone else on a transaction the subject paid: add.
/// - A settlement the subject sent: add. A settlement received: subtract.
///
/// Splits the payer owes on their own transaction net to zero and are
/// skipped. A person without records gets an empty balance.
#[must_use]
pub fn balance(ledger: &Ledger, subject: PersonId, against: Option<PersonId>) -> CurrencyBalance {
    let counterpart_matches = |other: PersonId| other != subject && against.is_none_or(|c| c == other);
    let mut balance = CurrencyBalance::new();

    for split in ledger.splits_owed_by(subject) {
        let Ok(tx) = ledger.transaction(split.transaction_id) else {
            continue;
        };
        if counterpart_matches(tx.payer) {
            balance.sub(Money::new(split.amount, tx.currency()));
        }
    }

    for tx in ledger.transactions_paid_by(subject) {
        for split in ledger.splits_of(tx.id) {
            if counterpart_matches(split.owed_by) {
                balance.add(Money::new(split.amount, tx.currency()));
            }
        }
    }

    for settlement in ledger.settlements_sent_by(subject) {
        if counterpart_matches(settlement.receiver) {
            balance.add(settlement.amount);
        }
    }

    for settlement in ledger.settlements_received_by(subject) {
        if counterpart_matches(settlement.sender) {
            balance.sub(settlement.amount);
        }
    }

    balance
}

/// A counterpart and the pairwise balance of the current user against them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonBalance {
    pub person: PersonId,
    pub balance: CurrencyBalance,
}

/// Pairwise balance of `current_user` against every other live person.
///
/// Counterparts with nothing outstanding are left out.
#[must_use]
pub fn pairwise_balances(ledger: &Ledger, current_user: PersonId) -> Vec<PersonBalance> {
    ledger
        .people()
        .filter(|p| p.id != current_user)
        .map(|p| PersonBalance {
            person: p.id,
            balance: balance(ledger, current_user, Some(p.id)),
        })
        .filter(|pb| !pb.balance.is_zero())
        .collect()
}

fn ranked(mut rows: Vec<(PersonBalance, Decimal)>) -> Vec<PersonBalance> {
    rows.sort_by(|(a, a_key), (b, b_key)| {
        b_key
            .cmp(a_key)
            .then_with(|| a.person.cmp(&b.person))
    });
    rows.into_iter().map(|(pb, _)| pb).collect()
}

/// People the current user owes, largest debt first.
///
/// Each row carries only the negative buckets of the pairwise balance.
/// Ranking uses the absolute sum of those buckets across currencies; the
/// current user and anyone without a negative bucket are excluded.
#[must_use]
pub fn people_you_owe(ledger: &Ledger, current_user: PersonId) -> Vec<PersonBalance> {
    let rows = pairwise_balances(ledger, current_user)
        .into_iter()
        .filter(|pb| pb.balance.has_negative())
        .map(|pb| {
            let key = pb.balance.negative_total().abs();
            (
                PersonBalance {
                    person: pb.person,
                    balance: pb.balance.negative_part(),
                },
                key,
            )
        })
        .collect();
    ranked(rows)
}

/// People who owe the current user, largest credit first.
#[must_use]
pub fn people_who_owe_you(ledger: &Ledger, current_user: PersonId) -> Vec<PersonBalance> {
    let rows = pairwise_balances(ledger, current_user)
        .into_iter()
        .filter(|pb| pb.balance.has_positive())
        .map(|pb| {
            let key = pb.balance.positive_total();
            (
                PersonBalance {
                    person: pb.person,
                    balance: pb.balance.positive_part(),
                },
                key,
            )
        })
        .collect();
    ranked(rows)
}

/// Dashboard totals for the current user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceSummary {
    /// What the user owes, as positive amounts per currency.
    pub you_owe: CurrencyBalance,
    /// What others owe the user, per currency.
    pub owed_to_you: CurrencyBalance,
    /// Net of the two.
    pub net: CurrencyBalance,
}

/// Totals across every pairwise balance of `current_user`.
///
/// Owing and being owed are summed separately per counterpart first, so
/// owing Bob 10 CHF and being owed 10 CHF by Carol shows up on both sides
/// instead of cancelling out.
#[must_use]
pub fn summary(ledger: &Ledger, current_user: PersonId) -> BalanceSummary {
    let mut out = BalanceSummary::default();
    for pb in pairwise_balances(ledger, current_user) {
        out.you_owe.merge(&pb.balance.negative_part().negated());
        out.owed_to_you.merge(&pb.balance.positive_part());
        out.net.merge(&pb.balance);
    }
    out
}
