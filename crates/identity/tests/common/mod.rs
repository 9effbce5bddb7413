#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait};
use tempfile::TempDir;
use uuid::Uuid;

use identity::{
    IdentityService, OneTimeCode, PhoneNumber, VerificationError, VerificationProvider, profiles,
    settlement_participants, shared_reminders, subscription_participants,
    subscription_subscribers, subscriptions, transaction_participants,
};
use migration::MigratorTrait;

pub const PHONE: &str = "+41 79 123 45 67";
pub const CODE: &str = "123456";

/// In-process provider answering from a script; unscripted calls approve.
#[derive(Default)]
pub struct ScriptedProvider {
    sends: Mutex<VecDeque<Result<(), VerificationError>>>,
    checks: Mutex<VecDeque<Result<(), VerificationError>>>,
    pub send_calls: AtomicUsize,
    pub check_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_check(&self, outcome: Result<(), VerificationError>) {
        self.checks.lock().unwrap().push_back(outcome);
    }

    pub fn script_send(&self, outcome: Result<(), VerificationError>) {
        self.sends.lock().unwrap().push_back(outcome);
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerificationProvider for ScriptedProvider {
    async fn send_code(&self, _phone: &PhoneNumber) -> Result<(), VerificationError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sends.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn check_code(
        &self,
        _phone: &PhoneNumber,
        _code: &OneTimeCode,
    ) -> Result<(), VerificationError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.checks.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub async fn service_with_db(
    provider: Arc<ScriptedProvider>,
) -> (IdentityService, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let service = IdentityService::builder()
        .database(db.clone())
        .provider(provider)
        .max_retries(2)
        .retry_backoff(Duration::ZERO)
        .build()
        .unwrap();
    (service, db)
}

/// Same as [`service_with_db`] on an SQLite file, so several pooled
/// connections share one database. The directory lives as long as the
/// returned guard.
pub async fn service_with_file_db(
    provider: Arc<ScriptedProvider>,
) -> (IdentityService, DatabaseConnection, TempDir) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("swisscoin.db").display());
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let service = IdentityService::builder()
        .database(db.clone())
        .provider(provider)
        .max_retries(0)
        .retry_backoff(Duration::ZERO)
        .build()
        .unwrap();
    (service, db, dir)
}

pub fn phone_hash(phone: &str) -> String {
    PhoneNumber::parse(phone).unwrap().hash().to_string()
}

pub async fn profile(db: &DatabaseConnection, id: &str) -> profiles::Model {
    profiles::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

pub async fn seed_transaction_row(
    db: &DatabaseConnection,
    hash: &str,
    owner: Option<&str>,
) -> String {
    let id = Uuid::new_v4().to_string();
    transaction_participants::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        transaction_id: ActiveValue::Set(Uuid::new_v4().to_string()),
        phone_hash: ActiveValue::Set(Some(hash.to_string())),
        profile_id: ActiveValue::Set(owner.map(str::to_string)),
        display_name: ActiveValue::Set("Bob".to_string()),
        amount_minor: ActiveValue::Set(3000),
        currency: ActiveValue::Set("CHF".to_string()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn seed_settlement_row(
    db: &DatabaseConnection,
    hash: &str,
    owner: Option<&str>,
) -> String {
    let id = Uuid::new_v4().to_string();
    settlement_participants::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        settlement_id: ActiveValue::Set(Uuid::new_v4().to_string()),
        role: ActiveValue::Set("receiver".to_string()),
        phone_hash: ActiveValue::Set(Some(hash.to_string())),
        profile_id: ActiveValue::Set(owner.map(str::to_string)),
        amount_minor: ActiveValue::Set(1500),
        currency: ActiveValue::Set("CHF".to_string()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn seed_subscription(
    db: &DatabaseConnection,
    owner_profile_id: &str,
    is_shared: bool,
) -> String {
    let id = Uuid::new_v4().to_string();
    subscriptions::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        owner_profile_id: ActiveValue::Set(owner_profile_id.to_string()),
        name: ActiveValue::Set("Streaming".to_string()),
        cycle: ActiveValue::Set("monthly".to_string()),
        custom_cycle_days: ActiveValue::Set(None),
        cost_minor: ActiveValue::Set(3000),
        currency: ActiveValue::Set("CHF".to_string()),
        is_shared: ActiveValue::Set(is_shared),
        is_active: ActiveValue::Set(true),
        is_archived: ActiveValue::Set(false),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn seed_subscriber(
    db: &DatabaseConnection,
    subscription_id: &str,
    name: &str,
    hash: Option<&str>,
    share_minor: i64,
) {
    subscription_subscribers::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        subscription_id: ActiveValue::Set(subscription_id.to_string()),
        display_name: ActiveValue::Set(name.to_string()),
        phone_hash: ActiveValue::Set(hash.map(str::to_string)),
        share_minor: ActiveValue::Set(share_minor),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn seed_subscription_row(
    db: &DatabaseConnection,
    subscription_id: &str,
    hash: &str,
    owner: Option<&str>,
) -> String {
    let id = Uuid::new_v4().to_string();
    subscription_participants::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        subscription_id: ActiveValue::Set(subscription_id.to_string()),
        phone_hash: ActiveValue::Set(Some(hash.to_string())),
        profile_id: ActiveValue::Set(owner.map(str::to_string)),
        display_name: ActiveValue::Set("Bob".to_string()),
        share_minor: ActiveValue::Set(1000),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn seed_reminder(
    db: &DatabaseConnection,
    created_by: &str,
    hash: &str,
    owner: Option<&str>,
) -> String {
    let id = Uuid::new_v4().to_string();
    shared_reminders::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        created_by: ActiveValue::Set(created_by.to_string()),
        to_phone_hash: ActiveValue::Set(Some(hash.to_string())),
        to_profile_id: ActiveValue::Set(owner.map(str::to_string)),
        amount_minor: ActiveValue::Set(1500),
        currency: ActiveValue::Set("CHF".to_string()),
        message: ActiveValue::Set(Some("dinner".to_string())),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn transaction_owner(db: &DatabaseConnection, id: &str) -> Option<String> {
    transaction_participants::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .profile_id
}

pub async fn settlement_owner(db: &DatabaseConnection, id: &str) -> Option<String> {
    settlement_participants::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .profile_id
}

pub async fn subscription_owner(db: &DatabaseConnection, id: &str) -> Option<String> {
    subscription_participants::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .profile_id
}

pub async fn reminder_owner(db: &DatabaseConnection, id: &str) -> Option<String> {
    shared_reminders::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .to_profile_id
}
