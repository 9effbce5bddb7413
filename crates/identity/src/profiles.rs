//! Profiles table.
//!
//! A profile is a registered account. It bears at most one verified phone
//! hash; a profile absorbed by a merge is kept as a tombstone
//! (`deleted = true`, `merged_into` set) with its phone cleared.

use sea_orm::entity::prelude::*;

use crate::IdentityError;

/// Verification state of a profile's phone number.
///
/// `Unverified → Verifying → Verified`; the profile absorbed by a merge
/// ends in `Merged`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhoneStatus {
    Unverified,
    Verifying,
    Verified,
    Merged,
}

impl PhoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::Merged => "merged",
        }
    }
}

impl TryFrom<&str> for PhoneStatus {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "unverified" => Ok(Self::Unverified),
            "verifying" => Ok(Self::Verifying),
            "verified" => Ok(Self::Verified),
            "merged" => Ok(Self::Merged),
            other => Err(IdentityError::InvalidInput(format!(
                "invalid phone status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub display_name: String,
    #[sea_orm(unique)]
    pub api_token: String,
    pub phone: Option<String>,
    #[sea_orm(unique)]
    pub phone_hash: Option<String>,
    pub pending_phone: Option<String>,
    pub phone_status: String,
    pub deleted: bool,
    pub merged_into: Option<String>,
    pub merged_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn phone_status(&self) -> Result<PhoneStatus, IdentityError> {
        PhoneStatus::try_from(self.phone_status.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
