//! Payment reminders sent to another person.
//!
//! The recipient is addressed by phone hash; `to_profile_id` is filled in
//! once that phone belongs to an account.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shared_reminders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_by: String,
    pub to_phone_hash: Option<String>,
    pub to_profile_id: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub message: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
