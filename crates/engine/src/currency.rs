use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// ISO-4217 currency code attached to every monetary value in the ledger.
///
/// The ledger never converts between currencies, so the code is only ever
/// compared for equality and used as a bucket key. Validation is structural:
/// three ASCII letters, stored upper-case (`chf` and ` CHF ` both become
/// `CHF`).
///
/// ```rust
/// use engine::CurrencyCode;
///
/// let chf = CurrencyCode::try_from("chf").unwrap();
/// assert_eq!(chf.code(), "CHF");
/// assert!(CurrencyCode::try_from("CHFX").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const CHF: CurrencyCode = CurrencyCode(*b"CHF");
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    /// Canonical upper-case code.
    #[must_use]
    pub fn code(&self) -> &str {
        // The constructor only admits ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("XXX")
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(LedgerError::InvalidCurrency(format!(
                "not an ISO-4217 code: {trimmed}"
            )));
        }
        let mut code = [0u8; 3];
        for (slot, byte) in code.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(CurrencyCode::try_from(" eur ").unwrap(), CurrencyCode::EUR);
    }

    #[test]
    fn rejects_non_letters() {
        assert!(CurrencyCode::try_from("12A").is_err());
        assert!(CurrencyCode::try_from("").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&CurrencyCode::CHF).unwrap();
        assert_eq!(json, "\"CHF\"");
        let back: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(back, CurrencyCode::USD);
    }
}
