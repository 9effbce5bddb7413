//! The module contains the `Person` struct.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PersonId;

/// A human participant of the ledger.
///
/// A person starts "local-only": a name and maybe a phone number typed in by
/// the user. Once the phone number is verified against a real account the
/// person becomes "claimed" and carries the `linked_profile_id`.
///
/// People referenced by ledger records are never removed; they get
/// `deleted` set instead and disappear from rosters while their history keeps
/// counting in balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub phone_number: Option<String>,
    pub is_on_swiss_coin: Option<bool>,
    pub linked_profile_id: Option<Uuid>,
    #[serde(default)]
    pub deleted: bool,
}

impl Person {
    pub fn new(name: impl Into<String>, phone_number: Option<String>) -> Self {
        Self {
            id: PersonId::new(),
            name: name.into(),
            phone_number,
            is_on_swiss_coin: None,
            linked_profile_id: None,
            deleted: false,
        }
    }

    /// `true` once the phone number was verified against an account.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.linked_profile_id.is_some()
    }
}
