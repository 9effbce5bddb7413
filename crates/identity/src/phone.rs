//! Phone numbers, their one-way hash and one-time codes.
//!
//! Ledger rows recorded against someone who has no account yet carry the
//! [`PhoneHash`] of the number the payer typed in, never the number itself.
//! The hash is the lowercase hex SHA-256 of the E.164 form, so the same
//! number always lands on the same rows regardless of how it was typed.

use sha2::{Digest, Sha256};

use crate::{IdentityError, ResultIdentity};

/// A phone number in E.164 form (`+` followed by 8 to 15 digits).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes user input: spaces, dashes, dots and parentheses are
    /// dropped, the rest must be a valid E.164 number.
    pub fn parse(input: &str) -> ResultIdentity<Self> {
        let compact: String = input
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let Some(digits) = compact.strip_prefix('+') else {
            return Err(IdentityError::InvalidPhone(
                "phone must start with +country code".to_string(),
            ));
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdentityError::InvalidPhone(
                "phone must contain only digits".to_string(),
            ));
        }
        if !(8..=15).contains(&digits.len()) || digits.starts_with('0') {
            return Err(IdentityError::InvalidPhone(
                "phone is not a valid E.164 number".to_string(),
            ));
        }
        Ok(Self(compact))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn hash(&self) -> PhoneHash {
        PhoneHash::of(self)
    }
}

impl core::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-way identifier derived from a [`PhoneNumber`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhoneHash(String);

impl PhoneHash {
    #[must_use]
    pub fn of(phone: &PhoneNumber) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(phone.as_str().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wraps a hash read back from storage.
    #[must_use]
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PhoneHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A six-digit one-time verification code.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    pub fn parse(input: &str) -> ResultIdentity<Self> {
        let code = input.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdentityError::InvalidCode(
                "code must be 6 digits".to_string(),
            ));
        }
        Ok(Self(code.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are secrets; keep them out of logs.
impl core::fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OneTimeCode(******)")
    }
}
