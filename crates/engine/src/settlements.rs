use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, PersonId, SettlementId};

/// A direct payment from `sender` to `receiver` that pays down a debt.
///
/// Stored once; it shows up as "sent" in the sender's history and as
/// "received" in the receiver's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: SettlementId,
    pub sender: PersonId,
    pub receiver: PersonId,
    pub amount: Money,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
}
