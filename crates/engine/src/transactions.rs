//! Spending events and the shares people owe on them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, Money, PersonId, SplitId, TransactionId};

/// One spending event paid by a single person in a single currency.
///
/// The splits recorded against it never sum above `amount`. Anything left
/// unsplit is the payer's own share.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: TransactionId,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub payer: PersonId,
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl FinancialTransaction {
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.amount.currency
    }
}

/// One person's share of a transaction.
///
/// The amount is non-negative and implicitly in the parent transaction's
/// currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSplit {
    pub id: SplitId,
    pub transaction_id: TransactionId,
    pub owed_by: PersonId,
    pub amount: Decimal,
}

/// Input for a split when recording a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitNew {
    pub owed_by: PersonId,
    pub amount: Decimal,
}

impl SplitNew {
    #[must_use]
    pub const fn new(owed_by: PersonId, amount: Decimal) -> Self {
        Self { owed_by, amount }
    }
}

/// Input for [`Ledger::record_transaction`](crate::Ledger::record_transaction).
#[derive(Clone, Debug)]
pub struct TransactionNew {
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub payer: PersonId,
    pub description: String,
    pub category: Option<String>,
    pub splits: Vec<SplitNew>,
}
