//! Arena storage for ledger entities.
//!
//! Entities live in flat tables keyed by id and reference each other through
//! id fields only. The "traverse to related entities" questions the balance
//! engine asks (which splits does Bob owe, which transactions did Alice pay)
//! are answered by secondary indexes maintained on every write, so nothing
//! ever chases pointers and ownership stays with the [`Ledger`].
//!
//! Writes validate the entity invariants up front and leave the ledger
//! untouched on error. Entities that other records reference are archived or
//! tombstoned instead of removed.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    FinancialTransaction, LedgerError, Money, Person, PersonId, ResultLedger,
    Settlement, SettlementId, SplitId, Subscription, SubscriptionId, SubscriptionNew,
    SubscriptionShare, TransactionId, TransactionNew, TransactionSplit,
};

/// Outcome of [`Ledger::remove_person`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// Nothing referenced the person, the record is gone.
    Deleted,
    /// The person is still referenced and was tombstoned.
    Tombstoned,
}

#[derive(Clone, Debug, Default)]
pub struct Ledger {
    people: HashMap<PersonId, Person>,
    transactions: HashMap<TransactionId, FinancialTransaction>,
    splits: HashMap<SplitId, TransactionSplit>,
    settlements: HashMap<SettlementId, Settlement>,
    subscriptions: HashMap<SubscriptionId, Subscription>,

    // Secondary indexes, insertion ordered.
    splits_by_transaction: HashMap<TransactionId, Vec<SplitId>>,
    splits_by_person: HashMap<PersonId, Vec<SplitId>>,
    paid_by: HashMap<PersonId, Vec<TransactionId>>,
    sent_by: HashMap<PersonId, Vec<SettlementId>>,
    received_by: HashMap<PersonId, Vec<SettlementId>>,
    subscriptions_by_person: HashMap<PersonId, Vec<SubscriptionId>>,
}

fn push_index<K: std::hash::Hash + Eq, V: PartialEq>(map: &mut HashMap<K, Vec<V>>, key: K, v: V) {
    let entries = map.entry(key).or_default();
    if !entries.contains(&v) {
        entries.push(v);
    }
}

fn drop_index<K: std::hash::Hash + Eq, V: PartialEq>(map: &mut HashMap<K, Vec<V>>, key: &K, v: &V) {
    if let Some(entries) = map.get_mut(key) {
        entries.retain(|e| e != v);
        if entries.is_empty() {
            map.remove(key);
        }
    }
}

fn ensure_positive(amount: Decimal, label: &str) -> ResultLedger<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "{label} amount must be > 0"
        )));
    }
    Ok(())
}

fn ensure_non_negative(amount: Decimal, label: &str) -> ResultLedger<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::InvalidAmount(format!(
            "{label} amount must be >= 0"
        )));
    }
    Ok(())
}

/// Sum that reports overflow instead of panicking. An overflowing total is
/// larger than any amount it could be checked against.
fn checked_total<I: IntoIterator<Item = Decimal>>(amounts: I) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

fn splits_exceed(total: Option<Decimal>, tx_amount: Decimal) -> ResultLedger<()> {
    match total {
        Some(total) if total <= tx_amount => Ok(()),
        Some(total) => Err(LedgerError::InvalidSplit(format!(
            "splits total {total} exceeds transaction amount {tx_amount}"
        ))),
        None => Err(LedgerError::InvalidSplit(format!(
            "splits total overflows transaction amount {tx_amount}"
        ))),
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── lookups ─────────────────────────────────────────────────────────

    pub fn person(&self, id: PersonId) -> ResultLedger<&Person> {
        self.people
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("person {id}")))
    }

    pub fn transaction(&self, id: TransactionId) -> ResultLedger<&FinancialTransaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("transaction {id}")))
    }

    pub fn split(&self, id: SplitId) -> ResultLedger<&TransactionSplit> {
        self.splits
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("split {id}")))
    }

    pub fn settlement(&self, id: SettlementId) -> ResultLedger<&Settlement> {
        self.settlements
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("settlement {id}")))
    }

    pub fn subscription(&self, id: SubscriptionId) -> ResultLedger<&Subscription> {
        self.subscriptions
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("subscription {id}")))
    }

    fn live_person(&self, id: PersonId) -> ResultLedger<&Person> {
        let person = self.person(id)?;
        if person.deleted {
            return Err(LedgerError::Archived(format!("person {id}")));
        }
        Ok(person)
    }

    /// Every non-tombstoned person.
    pub fn people(&self) -> impl Iterator<Item = &Person> + '_ {
        self.people.values().filter(|p| !p.deleted)
    }

    /// Every subscription, archived ones included.
    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> + '_ {
        self.subscriptions.values()
    }

    // ── indexed queries ─────────────────────────────────────────────────

    /// Splits owed by `person` on live transactions.
    pub fn splits_owed_by(&self, person: PersonId) -> impl Iterator<Item = &TransactionSplit> + '_ {
        self.splits_by_person
            .get(&person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.splits.get(id))
            .filter(|split| {
                self.transactions
                    .get(&split.transaction_id)
                    .is_some_and(|tx| !tx.archived)
            })
    }

    /// Live transactions paid by `person`.
    pub fn transactions_paid_by(
        &self,
        person: PersonId,
    ) -> impl Iterator<Item = &FinancialTransaction> + '_ {
        self.paid_by
            .get(&person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.transactions.get(id))
            .filter(|tx| !tx.archived)
    }

    /// Splits recorded against a transaction, in insertion order.
    pub fn splits_of(&self, transaction: TransactionId) -> impl Iterator<Item = &TransactionSplit> + '_ {
        self.splits_by_transaction
            .get(&transaction)
            .into_iter()
            .flatten()
            .filter_map(|id| self.splits.get(id))
    }

    pub fn settlements_sent_by(&self, person: PersonId) -> impl Iterator<Item = &Settlement> + '_ {
        self.sent_by
            .get(&person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.settlements.get(id))
            .filter(|s| !s.archived)
    }

    pub fn settlements_received_by(
        &self,
        person: PersonId,
    ) -> impl Iterator<Item = &Settlement> + '_ {
        self.received_by
            .get(&person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.settlements.get(id))
            .filter(|s| !s.archived)
    }

    /// Subscriptions `person` owns or subscribes to, archived ones included.
    pub fn subscriptions_of(&self, person: PersonId) -> impl Iterator<Item = &Subscription> + '_ {
        self.subscriptions_by_person
            .get(&person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.subscriptions.get(id))
    }

    fn is_referenced(&self, person: PersonId) -> bool {
        self.splits_by_person.contains_key(&person)
            || self.paid_by.contains_key(&person)
            || self.sent_by.contains_key(&person)
            || self.received_by.contains_key(&person)
            || self.subscriptions_by_person.contains_key(&person)
    }

    // ── people ──────────────────────────────────────────────────────────

    pub fn add_person(&mut self, person: Person) -> ResultLedger<PersonId> {
        if self.people.contains_key(&person.id) {
            return Err(LedgerError::ExistingKey(format!("person {}", person.id)));
        }
        let mut person = person;
        person.name = normalize_required_name(&person.name, "person")?;
        let id = person.id;
        self.people.insert(id, person);
        Ok(id)
    }

    /// Marks the person as claimed by a verified account.
    pub fn link_profile(&mut self, person: PersonId, profile_id: Uuid) -> ResultLedger<()> {
        self.live_person(person)?;
        if let Some(p) = self.people.get_mut(&person) {
            p.linked_profile_id = Some(profile_id);
            p.is_on_swiss_coin = Some(true);
        }
        Ok(())
    }

    /// Removes a person, or tombstones them when ledger records still point
    /// at them.
    pub fn remove_person(&mut self, person: PersonId) -> ResultLedger<Removal> {
        self.person(person)?;
        if self.is_referenced(person) {
            if let Some(p) = self.people.get_mut(&person) {
                p.deleted = true;
            }
            tracing::debug!("person {person} still referenced, tombstoned");
            return Ok(Removal::Tombstoned);
        }
        self.people.remove(&person);
        Ok(Removal::Deleted)
    }

    // ── transactions ────────────────────────────────────────────────────

    /// Records a transaction together with its splits.
    ///
    /// Fails when the payer or a split participant is unknown or
    /// tombstoned, when a split is negative, or when the splits add up to
    /// more than the transaction amount.
    pub fn record_transaction(&mut self, new: TransactionNew) -> ResultLedger<TransactionId> {
        ensure_positive(new.amount.amount, "transaction")?;
        self.live_person(new.payer)?;

        for split in &new.splits {
            ensure_non_negative(split.amount, "split")?;
            self.live_person(split.owed_by)?;
        }
        splits_exceed(
            checked_total(new.splits.iter().map(|s| s.amount)),
            new.amount.amount,
        )?;

        let tx = FinancialTransaction {
            id: TransactionId::new(),
            amount: new.amount,
            date: new.date,
            payer: new.payer,
            description: new.description.trim().to_string(),
            category: new
                .category
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            archived: false,
        };
        let tx_id = tx.id;
        push_index(&mut self.paid_by, tx.payer, tx_id);
        self.transactions.insert(tx_id, tx);

        for split in new.splits {
            self.insert_split(tx_id, split.owed_by, split.amount);
        }
        Ok(tx_id)
    }

    fn insert_split(&mut self, tx_id: TransactionId, owed_by: PersonId, amount: Decimal) -> SplitId {
        let split = TransactionSplit {
            id: SplitId::new(),
            transaction_id: tx_id,
            owed_by,
            amount,
        };
        let id = split.id;
        push_index(&mut self.splits_by_transaction, tx_id, id);
        push_index(&mut self.splits_by_person, owed_by, id);
        self.splits.insert(id, split);
        id
    }

    fn split_total_with(
        &self,
        tx_id: TransactionId,
        skip: Option<SplitId>,
        amount: Decimal,
    ) -> Option<Decimal> {
        checked_total(
            self.splits_of(tx_id)
                .filter(|s| Some(s.id) != skip)
                .map(|s| s.amount)
                .chain(std::iter::once(amount)),
        )
    }

    /// Adds a split to an existing transaction.
    pub fn add_split(
        &mut self,
        tx_id: TransactionId,
        owed_by: PersonId,
        amount: Decimal,
    ) -> ResultLedger<SplitId> {
        ensure_non_negative(amount, "split")?;
        let tx_amount = self.transaction(tx_id)?.amount.amount;
        self.live_person(owed_by)?;
        splits_exceed(self.split_total_with(tx_id, None, amount), tx_amount)?;
        Ok(self.insert_split(tx_id, owed_by, amount))
    }

    /// Changes the amount of a split.
    pub fn update_split(&mut self, split_id: SplitId, amount: Decimal) -> ResultLedger<()> {
        ensure_non_negative(amount, "split")?;
        let tx_id = self.split(split_id)?.transaction_id;
        let tx_amount = self.transaction(tx_id)?.amount.amount;
        splits_exceed(self.split_total_with(tx_id, Some(split_id), amount), tx_amount)?;
        if let Some(split) = self.splits.get_mut(&split_id) {
            split.amount = amount;
        }
        Ok(())
    }

    /// Deletes a split; its amount falls back to the payer.
    pub fn remove_split(&mut self, split_id: SplitId) -> ResultLedger<()> {
        let split = self.split(split_id)?.clone();
        drop_index(&mut self.splits_by_transaction, &split.transaction_id, &split_id);
        drop_index(&mut self.splits_by_person, &split.owed_by, &split_id);
        self.splits.remove(&split_id);
        Ok(())
    }

    pub fn archive_transaction(&mut self, tx_id: TransactionId) -> ResultLedger<()> {
        self.transaction(tx_id)?;
        if let Some(tx) = self.transactions.get_mut(&tx_id) {
            tx.archived = true;
        }
        Ok(())
    }

    // ── settlements ─────────────────────────────────────────────────────

    /// Records a payment from `sender` to `receiver`.
    pub fn settle(
        &mut self,
        sender: PersonId,
        receiver: PersonId,
        amount: Money,
        date: chrono::DateTime<chrono::Utc>,
    ) -> ResultLedger<SettlementId> {
        if sender == receiver {
            return Err(LedgerError::InvalidSettlement(
                "sender and receiver must differ".to_string(),
            ));
        }
        ensure_positive(amount.amount, "settlement")?;
        self.live_person(sender)?;
        self.live_person(receiver)?;

        let settlement = Settlement {
            id: SettlementId::new(),
            sender,
            receiver,
            amount,
            date,
            archived: false,
        };
        let id = settlement.id;
        push_index(&mut self.sent_by, sender, id);
        push_index(&mut self.received_by, receiver, id);
        self.settlements.insert(id, settlement);
        Ok(id)
    }

    pub fn archive_settlement(&mut self, id: SettlementId) -> ResultLedger<()> {
        self.settlement(id)?;
        if let Some(s) = self.settlements.get_mut(&id) {
            s.archived = true;
        }
        Ok(())
    }

    // ── subscriptions ───────────────────────────────────────────────────

    fn validate_shares(
        &self,
        is_shared: bool,
        cost: Decimal,
        shares: &[SubscriptionShare],
    ) -> ResultLedger<()> {
        if !is_shared && !shares.is_empty() {
            return Err(LedgerError::InvalidSubscription(
                "a personal subscription has no subscribers".to_string(),
            ));
        }
        for (i, share) in shares.iter().enumerate() {
            ensure_non_negative(share.amount, "share")?;
            self.live_person(share.person)?;
            if shares[..i].iter().any(|s| s.person == share.person) {
                return Err(LedgerError::InvalidSubscription(format!(
                    "person {} subscribed twice",
                    share.person
                )));
            }
        }
        match checked_total(shares.iter().map(|s| s.amount)) {
            Some(total) if total <= cost => Ok(()),
            Some(total) => Err(LedgerError::InvalidSubscription(format!(
                "shares total {total} exceeds cost {cost}"
            ))),
            None => Err(LedgerError::InvalidSubscription(format!(
                "shares total overflows cost {cost}"
            ))),
        }
    }

    pub fn add_subscription(&mut self, new: SubscriptionNew) -> ResultLedger<SubscriptionId> {
        let name = normalize_required_name(&new.name, "subscription")?;
        ensure_positive(new.cost.amount, "subscription")?;
        self.live_person(new.owner)?;
        self.validate_shares(new.is_shared, new.cost.amount, &new.subscribers)?;

        let subscription = Subscription {
            id: SubscriptionId::new(),
            name,
            owner: new.owner,
            cycle: new.cycle,
            cost: new.cost,
            is_shared: new.is_shared,
            is_active: true,
            is_archived: false,
            subscribers: new.subscribers,
        };
        let id = subscription.id;
        push_index(&mut self.subscriptions_by_person, subscription.owner, id);
        for share in &subscription.subscribers {
            push_index(&mut self.subscriptions_by_person, share.person, id);
        }
        self.subscriptions.insert(id, subscription);
        Ok(id)
    }

    /// Adds a subscriber or changes their per-cycle share.
    pub fn set_subscriber_share(
        &mut self,
        id: SubscriptionId,
        person: PersonId,
        amount: Decimal,
    ) -> ResultLedger<()> {
        let subscription = self.subscription(id)?;
        let mut shares = subscription.subscribers.clone();
        match shares.iter_mut().find(|s| s.person == person) {
            Some(share) => share.amount = amount,
            None => shares.push(SubscriptionShare { person, amount }),
        }
        self.validate_shares(subscription.is_shared, subscription.cost.amount, &shares)?;

        push_index(&mut self.subscriptions_by_person, person, id);
        if let Some(s) = self.subscriptions.get_mut(&id) {
            s.subscribers = shares;
        }
        Ok(())
    }

    pub fn remove_subscriber(&mut self, id: SubscriptionId, person: PersonId) -> ResultLedger<()> {
        let owner = self.subscription(id)?.owner;
        if let Some(s) = self.subscriptions.get_mut(&id) {
            s.subscribers.retain(|share| share.person != person);
        }
        if person != owner {
            drop_index(&mut self.subscriptions_by_person, &person, &id);
        }
        Ok(())
    }

    pub fn set_subscription_active(&mut self, id: SubscriptionId, active: bool) -> ResultLedger<()> {
        self.subscription(id)?;
        if let Some(s) = self.subscriptions.get_mut(&id) {
            s.is_active = active;
        }
        Ok(())
    }

    pub fn archive_subscription(&mut self, id: SubscriptionId) -> ResultLedger<()> {
        self.subscription(id)?;
        if let Some(s) = self.subscriptions.get_mut(&id) {
            s.is_archived = true;
        }
        Ok(())
    }
}
