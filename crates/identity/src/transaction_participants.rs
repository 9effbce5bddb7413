//! One row per person taking part in a shared transaction.
//!
//! Rows for people without an account carry only `phone_hash`; `profile_id`
//! stays `NULL` until the phone is claimed.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub phone_hash: Option<String>,
    pub profile_id: Option<String>,
    pub display_name: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
