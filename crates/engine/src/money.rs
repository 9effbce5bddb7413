use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CurrencyCode, LedgerError, ResultLedger};

/// A signed amount in a single currency.
///
/// Arithmetic is only defined between identical currency codes. Combining
/// two currencies is not a conversion: it goes through [`CurrencyBalance`],
/// which keeps one bucket per code.
///
/// # Examples
///
/// ```rust
/// use engine::{CurrencyCode, Money};
/// use rust_decimal::Decimal;
///
/// let a = Money::new(Decimal::new(1050, 2), CurrencyCode::CHF);
/// let b = Money::new(Decimal::new(450, 2), CurrencyCode::CHF);
/// assert_eq!(a.checked_add(b).unwrap().amount, Decimal::new(15, 0));
///
/// let eur = Money::new(Decimal::ONE, CurrencyCode::EUR);
/// assert!(a.checked_add(eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    #[serde(rename = "currencyCode")]
    pub currency: CurrencyCode,
}

impl Money {
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    fn ensure_same_currency(&self, other: &Money) -> ResultLedger<()> {
        if self.currency != other.currency {
            return Err(LedgerError::CurrencyMismatch(format!(
                "cannot combine {} with {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, rhs: Money) -> ResultLedger<Money> {
        self.ensure_same_currency(&rhs)?;
        let amount = self
            .amount
            .checked_add(rhs.amount)
            .ok_or_else(|| LedgerError::InvalidAmount("amount too large".to_string()))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Subtracts two amounts of the same currency.
    pub fn checked_sub(self, rhs: Money) -> ResultLedger<Money> {
        self.ensure_same_currency(&rhs)?;
        let amount = self
            .amount
            .checked_sub(rhs.amount)
            .ok_or_else(|| LedgerError::InvalidAmount("amount too large".to_string()))?;
        Ok(Money::new(amount, self.currency))
    }
}

/// Net position bucketed by currency code.
///
/// Positive buckets mean "is owed", negative buckets mean "owes". A bucket
/// is created the first time its currency is seen and stays in the map even
/// when it nets to zero; every read goes through the pruned view, so a
/// balance whose buckets all cancel out compares equal to
/// `CurrencyBalance::default()`. Serialization goes through the pruned view
/// as well.
///
/// Bucket arithmetic saturates at the `Decimal` bounds.
#[derive(Clone, Debug, Default)]
pub struct CurrencyBalance {
    buckets: BTreeMap<CurrencyCode, Decimal>,
}

impl CurrencyBalance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signed amount to the bucket of its currency.
    pub fn add(&mut self, money: Money) {
        let bucket = self.buckets.entry(money.currency).or_default();
        *bucket = bucket.saturating_add(money.amount);
    }

    /// Subtracts an amount from the bucket of its currency.
    pub fn sub(&mut self, money: Money) {
        let bucket = self.buckets.entry(money.currency).or_default();
        *bucket = bucket.saturating_sub(money.amount);
    }

    /// Folds another balance into this one, bucket by bucket.
    pub fn merge(&mut self, other: &CurrencyBalance) {
        for (currency, amount) in &other.buckets {
            let bucket = self.buckets.entry(*currency).or_default();
            *bucket = bucket.saturating_add(*amount);
        }
    }

    /// Amount held in `currency`, zero when absent.
    #[must_use]
    pub fn get(&self, currency: CurrencyCode) -> Decimal {
        self.buckets.get(&currency).copied().unwrap_or_default()
    }

    /// Non-zero buckets in currency-code order.
    pub fn iter(&self) -> impl Iterator<Item = Money> + '_ {
        self.buckets
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(currency, amount)| Money::new(*amount, *currency))
    }

    /// Pruned copy of the buckets.
    #[must_use]
    pub fn non_zero(&self) -> BTreeMap<CurrencyCode, Decimal> {
        self.iter().map(|m| (m.currency, m.amount)).collect()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.buckets.values().all(Decimal::is_zero)
    }

    /// `true` when at least one bucket is below zero (the person owes).
    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.iter().any(|m| m.is_negative())
    }

    /// `true` when at least one bucket is above zero (the person is owed).
    #[must_use]
    pub fn has_positive(&self) -> bool {
        self.iter().any(|m| !m.is_negative())
    }

    /// Sum of the negative buckets, as a non-positive number.
    ///
    /// Adding amounts across currencies is only meaningful for ranking,
    /// never for display.
    #[must_use]
    pub fn negative_total(&self) -> Decimal {
        self.iter()
            .filter(Money::is_negative)
            .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.amount))
    }

    /// Sum of the positive buckets. Same caveat as [`negative_total`].
    ///
    /// [`negative_total`]: CurrencyBalance::negative_total
    #[must_use]
    pub fn positive_total(&self) -> Decimal {
        self.iter()
            .filter(|m| !m.is_negative())
            .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.amount))
    }

    /// Only the negative buckets.
    #[must_use]
    pub fn negative_part(&self) -> CurrencyBalance {
        self.iter().filter(Money::is_negative).collect()
    }

    /// Only the positive buckets.
    #[must_use]
    pub fn positive_part(&self) -> CurrencyBalance {
        self.iter().filter(|m| !m.is_negative()).collect()
    }

    /// The same position seen from the counterpart.
    #[must_use]
    pub fn negated(&self) -> CurrencyBalance {
        Self {
            buckets: self
                .buckets
                .iter()
                .map(|(currency, amount)| (*currency, -*amount))
                .collect(),
        }
    }
}

impl PartialEq for CurrencyBalance {
    fn eq(&self, other: &Self) -> bool {
        self.non_zero() == other.non_zero()
    }
}

impl Eq for CurrencyBalance {}

impl Serialize for CurrencyBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.non_zero().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurrencyBalance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<CurrencyCode, Decimal>::deserialize(deserializer).map(|buckets| Self { buckets })
    }
}

impl FromIterator<Money> for CurrencyBalance {
    fn from_iter<I: IntoIterator<Item = Money>>(iter: I) -> Self {
        let mut balance = CurrencyBalance::new();
        for money in iter {
            balance.add(money);
        }
        balance
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn buckets_by_currency_without_conversion() {
        let mut balance = CurrencyBalance::new();
        balance.add(Money::new(dec!(10), CurrencyCode::CHF));
        balance.add(Money::new(dec!(-4), CurrencyCode::EUR));
        balance.add(Money::new(dec!(2.5), CurrencyCode::CHF));

        assert_eq!(balance.get(CurrencyCode::CHF), dec!(12.5));
        assert_eq!(balance.get(CurrencyCode::EUR), dec!(-4));
        assert_eq!(balance.get(CurrencyCode::USD), Decimal::ZERO);
        assert!(balance.has_negative());
        assert!(balance.has_positive());
    }

    #[test]
    fn zero_buckets_are_kept_but_pruned_on_read() {
        let mut balance = CurrencyBalance::new();
        balance.add(Money::new(dec!(30), CurrencyCode::CHF));
        balance.sub(Money::new(dec!(30), CurrencyCode::CHF));

        assert_eq!(balance.buckets.len(), 1);
        assert!(balance.is_zero());
        assert_eq!(balance.iter().count(), 0);
        assert_eq!(balance, CurrencyBalance::default());
    }

    #[test]
    fn serializes_only_non_zero_buckets() {
        let mut balance = CurrencyBalance::new();
        balance.add(Money::new(dec!(30), CurrencyCode::CHF));
        balance.sub(Money::new(dec!(30), CurrencyCode::CHF));
        balance.add(Money::new(dec!(-4.5), CurrencyCode::EUR));

        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json, serde_json::json!({ "EUR": "-4.5" }));

        let back: CurrencyBalance = serde_json::from_value(json).unwrap();
        assert_eq!(back, balance);
    }

    #[test]
    fn bucket_arithmetic_saturates() {
        let mut balance = CurrencyBalance::new();
        balance.add(Money::new(Decimal::MAX, CurrencyCode::CHF));
        balance.add(Money::new(Decimal::MAX, CurrencyCode::CHF));
        assert_eq!(balance.get(CurrencyCode::CHF), Decimal::MAX);
    }

    #[test]
    fn money_refuses_cross_currency_arithmetic() {
        let chf = Money::new(dec!(1), CurrencyCode::CHF);
        let eur = Money::new(dec!(1), CurrencyCode::EUR);
        assert!(matches!(
            chf.checked_add(eur),
            Err(LedgerError::CurrencyMismatch(_))
        ));
        assert_eq!(
            chf.checked_sub(chf).unwrap(),
            Money::zero(CurrencyCode::CHF)
        );
    }

    #[test]
    fn totals_split_by_sign() {
        let balance: CurrencyBalance = [
            Money::new(dec!(-5), CurrencyCode::CHF),
            Money::new(dec!(-7), CurrencyCode::EUR),
            Money::new(dec!(3), CurrencyCode::USD),
        ]
        .into_iter()
        .collect();

        assert_eq!(balance.negative_total(), dec!(-12));
        assert_eq!(balance.positive_total(), dec!(3));
        assert_eq!(balance.negated().get(CurrencyCode::USD), dec!(-3));
        assert_eq!(balance.negative_part().iter().count(), 2);
    }
}
