//! Server-side subscription records and their non-member subscribers.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_profile_id: String,
    pub name: String,
    /// `weekly`, `monthly`, `yearly` or `custom`.
    pub cycle: String,
    pub custom_cycle_days: Option<i32>,
    pub cost_minor: i64,
    pub currency: String,
    pub is_shared: bool,
    pub is_active: bool,
    pub is_archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscription_subscribers::Entity")]
    Subscribers,
}

impl Related<super::subscription_subscribers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscribers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
