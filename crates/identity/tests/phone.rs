mod common;

use common::*;
use identity::{IdentityError, IdentityService, TransferCounts, VerificationError, VerifyOutcome};
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database};

#[tokio::test]
async fn incorrect_code_keeps_profile_verifying() {
    let provider = ScriptedProvider::approving();
    provider.script_check(Err(VerificationError::IncorrectCode));
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();
    let row = seed_transaction_row(&db, &phone_hash(PHONE), None).await;

    let err = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap_err();
    assert_eq!(
        err,
        IdentityError::Verification(VerificationError::IncorrectCode)
    );
    assert_eq!(provider.checks(), 1);

    let stored = profile(&db, &bob.id).await;
    assert_eq!(stored.phone_status, "verifying");
    assert_eq!(stored.pending_phone.as_deref(), Some("+41791234567"));
    assert_eq!(stored.phone_hash, None);
    assert_eq!(transaction_owner(&db, &row).await, None);
}

#[tokio::test]
async fn too_many_attempts_is_not_retried() {
    let provider = ScriptedProvider::approving();
    provider.script_check(Err(VerificationError::TooManyAttempts));
    let (service, _db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();

    let err = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap_err();
    assert_eq!(
        err,
        IdentityError::Verification(VerificationError::TooManyAttempts)
    );
    assert_eq!(provider.checks(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let provider = ScriptedProvider::approving();
    provider.script_check(Err(VerificationError::Transient("timeout".to_string())));
    provider.script_check(Err(VerificationError::Transient("503".to_string())));
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();

    let outcome = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::PhoneVerified { .. }));
    assert_eq!(provider.checks(), 3);
    assert_eq!(profile(&db, &bob.id).await.phone_status, "verified");
}

#[tokio::test]
async fn transient_failures_surface_after_retries() {
    let provider = ScriptedProvider::approving();
    for _ in 0..3 {
        provider.script_check(Err(VerificationError::Transient("down".to_string())));
    }
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();

    let err = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap_err();
    assert_eq!(
        err,
        IdentityError::Verification(VerificationError::Transient("down".to_string()))
    );
    assert_eq!(provider.checks(), 3);
    assert_eq!(profile(&db, &bob.id).await.phone_status, "verifying");
}

#[tokio::test]
async fn malformed_input_is_rejected_before_the_provider() {
    let provider = ScriptedProvider::approving();
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();

    let err = service.verify_phone(&bob.id, "079 123 45 67", CODE).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidPhone(_)));
    let err = service.verify_phone(&bob.id, PHONE, "12ab56").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCode(_)));

    assert_eq!(provider.checks(), 0);
    assert_eq!(profile(&db, &bob.id).await.phone_status, "unverified");
}

#[tokio::test]
async fn unconfigured_provider_rejects_verification() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let service = IdentityService::builder()
        .database(db.clone())
        .build()
        .unwrap();
    let bob = service.create_profile("Bob").await.unwrap();

    let err = service.request_code(&bob.id, PHONE).await.unwrap_err();
    assert_eq!(err, IdentityError::Verification(VerificationError::NotConfigured));
    let err = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap_err();
    assert_eq!(err, IdentityError::Verification(VerificationError::NotConfigured));
}

#[tokio::test]
async fn request_code_moves_profile_to_verifying() {
    let provider = ScriptedProvider::approving();
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();

    service.request_code(&bob.id, PHONE).await.unwrap();

    let stored = profile(&db, &bob.id).await;
    assert_eq!(stored.phone_status, "verifying");
    assert_eq!(stored.pending_phone.as_deref(), Some("+41791234567"));
    assert_eq!(provider.send_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_recipient_leaves_profile_unverified() {
    let provider = ScriptedProvider::approving();
    provider.script_send(Err(VerificationError::InvalidRecipient(
        "landline".to_string(),
    )));
    let (service, db) = service_with_db(provider).await;
    let bob = service.create_profile("Bob").await.unwrap();

    let err = service.request_code(&bob.id, PHONE).await.unwrap_err();
    assert!(matches!(
        err,
        IdentityError::Verification(VerificationError::InvalidRecipient(_))
    ));
    assert_eq!(profile(&db, &bob.id).await.phone_status, "unverified");
}

#[tokio::test]
async fn token_resolves_live_profiles_only() {
    let (service, _db) = service_with_db(ScriptedProvider::approving()).await;
    let bob = service.create_profile("  Bob ").await.unwrap();
    assert_eq!(bob.display_name, "Bob");

    let found = service.profile_by_token(&bob.api_token).await.unwrap();
    assert_eq!(found.id, bob.id);
    assert_eq!(
        service.profile_by_token("nope").await.unwrap_err(),
        IdentityError::Unauthorized
    );
    assert_eq!(
        service.profile_by_token("").await.unwrap_err(),
        IdentityError::Unauthorized
    );
    assert!(matches!(
        service.create_profile("   ").await.unwrap_err(),
        IdentityError::InvalidInput(_)
    ));
}

/// Alice verified the phone on an old account; Bob verifies the same phone.
/// Returns (service, db, alice_id, bob_id, [tx_owned, tx_pending, settlement, share, reminder]).
async fn duplicate_accounts() -> (
    IdentityService,
    sea_orm::DatabaseConnection,
    String,
    String,
    [String; 5],
) {
    let (service, db) = service_with_db(ScriptedProvider::approving()).await;
    let old = service.create_profile("Alice (old phone)").await.unwrap();
    let new = service.create_profile("Alice").await.unwrap();
    let friend = service.create_profile("Carol").await.unwrap();
    service.verify_phone(&old.id, PHONE, CODE).await.unwrap();

    let hash = phone_hash(PHONE);
    let tx_owned = seed_transaction_row(&db, &hash, Some(&old.id)).await;
    let tx_pending = seed_transaction_row(&db, &hash, None).await;
    let settlement = seed_settlement_row(&db, &hash, Some(&old.id)).await;
    let subscription = seed_subscription(&db, &friend.id, true).await;
    let share = seed_subscription_row(&db, &subscription, &hash, Some(&old.id)).await;
    let reminder = seed_reminder(&db, &friend.id, &hash, Some(&old.id)).await;

    (
        service,
        db,
        old.id,
        new.id,
        [tx_owned, tx_pending, settlement, share, reminder],
    )
}

#[tokio::test]
async fn verifying_a_taken_phone_merges_accounts() {
    let (service, db, old_id, new_id, rows) = duplicate_accounts().await;
    let [tx_owned, tx_pending, settlement, share, reminder] = rows;

    let outcome = service.verify_phone(&new_id, PHONE, CODE).await.unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::AccountsMerged {
            merged_profile_name: "Alice (old phone)".to_string(),
            data_transferred: TransferCounts {
                transactions: 2,
                settlements: 1,
                subscriptions: 1,
                reminders: 1,
            },
        }
    );

    for owner in [
        transaction_owner(&db, &tx_owned).await,
        transaction_owner(&db, &tx_pending).await,
        settlement_owner(&db, &settlement).await,
        subscription_owner(&db, &share).await,
        reminder_owner(&db, &reminder).await,
    ] {
        assert_eq!(owner.as_deref(), Some(new_id.as_str()));
    }

    let absorbed = profile(&db, &old_id).await;
    assert!(absorbed.deleted);
    assert_eq!(absorbed.merged_into.as_deref(), Some(new_id.as_str()));
    assert!(absorbed.merged_at.is_some());
    assert_eq!(absorbed.phone_hash, None);
    assert_eq!(absorbed.phone_status, "merged");

    let survivor = profile(&db, &new_id).await;
    assert_eq!(survivor.phone_status, "verified");
    assert_eq!(survivor.phone_hash, Some(phone_hash(PHONE)));

    // The tombstone can no longer authenticate.
    assert_eq!(
        service.profile_by_token(&absorbed.api_token).await.unwrap_err(),
        IdentityError::Unauthorized
    );
}

#[tokio::test]
async fn failed_merge_changes_nothing() {
    let (service, db, old_id, new_id, rows) = duplicate_accounts().await;
    let [tx_owned, tx_pending, settlement, share, _reminder] = rows;

    // The last table of the merge is gone: its reassignment fails.
    db.execute_unprepared("DROP TABLE shared_reminders")
        .await
        .unwrap();

    let err = service.verify_phone(&new_id, PHONE, CODE).await.unwrap_err();
    assert_eq!(err, IdentityError::LinkingFailed);

    assert_eq!(transaction_owner(&db, &tx_owned).await.as_deref(), Some(old_id.as_str()));
    assert_eq!(transaction_owner(&db, &tx_pending).await, None);
    assert_eq!(settlement_owner(&db, &settlement).await.as_deref(), Some(old_id.as_str()));
    assert_eq!(subscription_owner(&db, &share).await.as_deref(), Some(old_id.as_str()));

    let absorbed = profile(&db, &old_id).await;
    assert!(!absorbed.deleted);
    assert_eq!(absorbed.merged_into, None);
    assert_eq!(absorbed.phone_hash, Some(phone_hash(PHONE)));
    assert_eq!(absorbed.phone_status, "verified");

    let requester = profile(&db, &new_id).await;
    assert_eq!(requester.phone_status, "verifying");
    assert_eq!(requester.phone_hash, None);
}

#[tokio::test]
async fn reverifying_own_phone_does_not_merge() {
    let (service, db) = service_with_db(ScriptedProvider::approving()).await;
    let bob = service.create_profile("Bob").await.unwrap();
    service.verify_phone(&bob.id, PHONE, CODE).await.unwrap();

    let outcome = service.verify_phone(&bob.id, PHONE, CODE).await.unwrap();
    let VerifyOutcome::PhoneVerified { claimed } = outcome else {
        panic!("expected phone_verified, got {outcome:?}");
    };
    assert!(claimed.is_empty());
    assert!(!profile(&db, &bob.id).await.deleted);
}

#[tokio::test]
async fn verified_profile_stays_verified_while_changing_number() {
    let provider = ScriptedProvider::approving();
    let (service, db) = service_with_db(provider.clone()).await;
    let bob = service.create_profile("Bob").await.unwrap();
    service.verify_phone(&bob.id, PHONE, CODE).await.unwrap();

    let new_number = "+41 78 555 12 12";
    service.request_code(&bob.id, new_number).await.unwrap();
    let stored = profile(&db, &bob.id).await;
    assert_eq!(stored.phone_status, "verified");
    assert_eq!(stored.pending_phone.as_deref(), Some("+41785551212"));

    provider.script_check(Err(VerificationError::IncorrectCode));
    let err = service
        .verify_phone(&bob.id, new_number, CODE)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        IdentityError::Verification(VerificationError::IncorrectCode)
    );

    let stored = profile(&db, &bob.id).await;
    assert_eq!(stored.phone_status, "verified");
    assert_eq!(stored.phone.as_deref(), Some("+41791234567"));
    assert_eq!(stored.phone_hash, Some(phone_hash(PHONE)));
    assert_eq!(stored.pending_phone.as_deref(), Some("+41785551212"));
}
