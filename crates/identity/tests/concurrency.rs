mod common;

use std::collections::BTreeSet;

use common::*;
use identity::{VerifyOutcome, profiles};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_verifications_leave_one_holder() {
    let (service, db, _dir) = service_with_file_db(ScriptedProvider::approving()).await;
    let alice = service.create_profile("Alice").await.unwrap();
    let bob = service.create_profile("Bob").await.unwrap();
    let hash = phone_hash(PHONE);

    let tx_a = seed_transaction_row(&db, &hash, None).await;
    let tx_b = seed_transaction_row(&db, &hash, None).await;
    let settlement = seed_settlement_row(&db, &hash, None).await;
    let reminder = seed_reminder(&db, &alice.id, &hash, None).await;

    let (first, second) = tokio::join!(
        service.verify_phone(&alice.id, PHONE, CODE),
        service.verify_phone(&bob.id, PHONE, CODE),
    );
    let outcomes: Vec<VerifyOutcome> = [first, second].into_iter().filter_map(Result::ok).collect();
    assert!(!outcomes.is_empty());
    let merges = outcomes
        .iter()
        .filter(|o| matches!(o, VerifyOutcome::AccountsMerged { .. }))
        .count();
    assert_eq!(merges, outcomes.len() - 1);

    let holders = profiles::Entity::find()
        .filter(profiles::Column::PhoneHash.eq(hash.as_str()))
        .filter(profiles::Column::Deleted.eq(false))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(holders.len(), 1);
    let holder = holders[0].id.clone();
    assert_eq!(holders[0].phone_status, "verified");

    for row in [&tx_a, &tx_b] {
        assert_eq!(transaction_owner(&db, row).await, Some(holder.clone()));
    }
    assert_eq!(settlement_owner(&db, &settlement).await, Some(holder.clone()));
    assert_eq!(reminder_owner(&db, &reminder).await, Some(holder));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_claims_never_overlap() {
    let (service, db, _dir) = service_with_file_db(ScriptedProvider::approving()).await;
    let bob = service.create_profile("Bob").await.unwrap();
    service.verify_phone(&bob.id, PHONE, CODE).await.unwrap();
    let hash = phone_hash(PHONE);

    let mut pending = BTreeSet::new();
    for _ in 0..6 {
        pending.insert(seed_transaction_row(&db, &hash, None).await);
    }

    let (first, second) = tokio::join!(
        service.claim_pending_ledger(&bob.id),
        service.claim_pending_ledger(&bob.id),
    );
    let reports: Vec<_> = [first, second].into_iter().filter_map(Result::ok).collect();
    assert!(!reports.is_empty());

    let mut claimed = BTreeSet::new();
    for report in &reports {
        for id in &report.transaction_ids {
            assert!(claimed.insert(id.clone()), "{id} claimed twice");
        }
    }
    // A claim that lost the race is rolled back, so the winner holds every row.
    assert_eq!(claimed, pending);
    for row in &pending {
        assert_eq!(transaction_owner(&db, row).await, Some(bob.id.clone()));
    }
}
