use serde::{Deserialize, Serialize};

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of successful requests that return nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub mod profile {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileNew {
        pub display_name: String,
    }

    /// Returned once, on registration: the token authenticates every other
    /// request as `Authorization: Bearer <api_token>`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileCreated {
        pub id: String,
        pub display_name: String,
        pub api_token: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Profile {
        pub id: String,
        pub display_name: String,
        pub phone: Option<String>,
        /// `unverified`, `verifying`, `verified`.
        pub phone_status: String,
    }
}

pub mod phone {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PhoneSendCode {
        /// E.164 number, formatting characters allowed.
        pub phone: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PhoneVerify {
        pub phone: String,
        /// Six-digit one-time code.
        pub code: String,
    }

    /// Ledger rows moved onto the caller, per table.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DataTransferred {
        pub transactions: u64,
        pub settlements: u64,
        pub subscriptions: u64,
        pub reminders: u64,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "action", rename_all = "snake_case")]
    pub enum PhoneVerifyAction {
        PhoneVerified {
            #[serde(default)]
            claimed: DataTransferred,
        },
        AccountsMerged {
            merged_profile_name: String,
            data_transferred: DataTransferred,
        },
    }

    /// `{ "success": true, "action": "phone_verified" | "accounts_merged", ... }`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PhoneVerified {
        pub success: bool,
        #[serde(flatten)]
        pub action: PhoneVerifyAction,
    }
}

pub mod ledger {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ClaimPending {
        pub claimed_transactions: u64,
        pub claimed_settlements: u64,
        pub claimed_subscriptions: u64,
        pub claimed_reminders: u64,
        pub transaction_ids: Vec<String>,
        pub settlement_ids: Vec<String>,
        pub subscription_ids: Vec<String>,
        pub reminder_ids: Vec<String>,
    }
}

pub mod subscription {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaterializeShares {
        #[serde(default)]
        pub subscription_ids: Vec<String>,
    }

    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SharesMaterialized {
        pub processed: u64,
        pub participants_created: u64,
    }
}

#[cfg(test)]
mod tests {
    use super::phone::*;
    use serde_json::json;

    #[test]
    fn verify_response_shapes() {
        let merged = PhoneVerified {
            success: true,
            action: PhoneVerifyAction::AccountsMerged {
                merged_profile_name: "Alice".to_string(),
                data_transferred: DataTransferred {
                    transactions: 2,
                    ..DataTransferred::default()
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({
                "success": true,
                "action": "accounts_merged",
                "merged_profile_name": "Alice",
                "data_transferred": {
                    "transactions": 2,
                    "settlements": 0,
                    "subscriptions": 0,
                    "reminders": 0
                }
            })
        );

        let verified: PhoneVerified =
            serde_json::from_value(json!({ "success": true, "action": "phone_verified" }))
                .unwrap();
        assert_eq!(
            verified.action,
            PhoneVerifyAction::PhoneVerified {
                claimed: DataTransferred::default()
            }
        );
    }
}
