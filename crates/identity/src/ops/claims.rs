use sea_orm::{Condition, DatabaseTransaction, QueryFilter, QuerySelect, prelude::*, sea_query::Expr};

use crate::{
    PhoneHash, ResultIdentity, settlement_participants, shared_reminders,
    subscription_participants, transaction_participants,
};

use super::IdentityService;

/// Rows attached to a profile by a claim, per ledger table.
///
/// Ids are the ids of the claimed rows (participant rows, or reminders).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimReport {
    pub transaction_ids: Vec<String>,
    pub settlement_ids: Vec<String>,
    pub subscription_ids: Vec<String>,
    pub reminder_ids: Vec<String>,
}

impl ClaimReport {
    #[must_use]
    pub fn counts(&self) -> TransferCounts {
        TransferCounts {
            transactions: self.transaction_ids.len() as u64,
            settlements: self.settlement_ids.len() as u64,
            subscriptions: self.subscription_ids.len() as u64,
            reminders: self.reminder_ids.len() as u64,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }
}

/// Number of ledger rows moved, per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferCounts {
    pub transactions: u64,
    pub settlements: u64,
    pub subscriptions: u64,
    pub reminders: u64,
}

impl TransferCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.transactions + self.settlements + self.subscriptions + self.reminders
    }
}

/// Generates the claim and merge-reassign methods for one ledger table.
///
/// Every update is guarded on the owner column: a claim only touches rows
/// whose owner is `NULL`, a reassign only rows that are unowned or owned by
/// the absorbed profile.
macro_rules! impl_ledger_claims {
    ($claim_fn:ident, $reassign_fn:ident, $entity:path, $id_col:expr, $hash_col:expr, $owner_col:expr) => {
        async fn $claim_fn(
            &self,
            db: &DatabaseTransaction,
            hash: &PhoneHash,
            profile_id: &str,
        ) -> ResultIdentity<Vec<String>> {
            let candidates: Vec<String> = <$entity>::find()
                .select_only()
                .column($id_col)
                .filter($hash_col.eq(hash.as_str()))
                .filter($owner_col.is_null())
                .into_tuple()
                .all(db)
                .await?;
            if candidates.is_empty() {
                return Ok(candidates);
            }

            let updated = <$entity>::update_many()
                .col_expr($owner_col, Expr::value(profile_id))
                .filter($id_col.is_in(candidates.clone()))
                .filter($owner_col.is_null())
                .exec(db)
                .await?;
            if updated.rows_affected == candidates.len() as u64 {
                return Ok(candidates);
            }

            // Someone else claimed part of the candidates in between.
            <$entity>::find()
                .select_only()
                .column($id_col)
                .filter($id_col.is_in(candidates))
                .filter($owner_col.eq(profile_id))
                .into_tuple()
                .all(db)
                .await
                .map_err(Into::into)
        }

        async fn $reassign_fn(
            &self,
            db: &DatabaseTransaction,
            hash: &PhoneHash,
            absorbed_id: &str,
            survivor_id: &str,
        ) -> ResultIdentity<u64> {
            let updated = <$entity>::update_many()
                .col_expr($owner_col, Expr::value(survivor_id))
                .filter($hash_col.eq(hash.as_str()))
                .filter(
                    Condition::any()
                        .add($owner_col.is_null())
                        .add($owner_col.eq(absorbed_id)),
                )
                .exec(db)
                .await?;
            Ok(updated.rows_affected)
        }
    };
}

impl IdentityService {
    impl_ledger_claims!(
        claim_transaction_rows,
        reassign_transaction_rows,
        transaction_participants::Entity,
        transaction_participants::Column::Id,
        transaction_participants::Column::PhoneHash,
        transaction_participants::Column::ProfileId
    );

    impl_ledger_claims!(
        claim_settlement_rows,
        reassign_settlement_rows,
        settlement_participants::Entity,
        settlement_participants::Column::Id,
        settlement_participants::Column::PhoneHash,
        settlement_participants::Column::ProfileId
    );

    impl_ledger_claims!(
        claim_subscription_rows,
        reassign_subscription_rows,
        subscription_participants::Entity,
        subscription_participants::Column::Id,
        subscription_participants::Column::PhoneHash,
        subscription_participants::Column::ProfileId
    );

    impl_ledger_claims!(
        claim_reminder_rows,
        reassign_reminder_rows,
        shared_reminders::Entity,
        shared_reminders::Column::Id,
        shared_reminders::Column::ToPhoneHash,
        shared_reminders::Column::ToProfileId
    );

    /// Attaches every pending ledger row recorded against the caller's
    /// verified phone to the caller.
    ///
    /// Returns an empty report when the caller has no verified phone yet.
    /// Calling it again claims nothing new.
    pub async fn claim_pending_ledger(&self, profile_id: &str) -> ResultIdentity<ClaimReport> {
        let profile_id = profile_id.to_string();
        let report = self
            .with_tx(|service, db_tx| {
                Box::pin(async move {
                    let profile = service
                        .require_live_profile(db_tx, profile_id.as_str())
                        .await?;
                    let Some(hash) = profile.phone_hash.map(PhoneHash::from_stored) else {
                        return Ok(ClaimReport::default());
                    };
                    service
                        .claim_all(db_tx, &hash, profile_id.as_str())
                        .await
                })
            })
            .await?;

        if !report.is_empty() {
            let counts = report.counts();
            tracing::info!(
                transactions = counts.transactions,
                settlements = counts.settlements,
                subscriptions = counts.subscriptions,
                reminders = counts.reminders,
                "claimed pending ledger rows"
            );
        }
        Ok(report)
    }

    pub(super) async fn claim_all(
        &self,
        db: &DatabaseTransaction,
        hash: &PhoneHash,
        profile_id: &str,
    ) -> ResultIdentity<ClaimReport> {
        Ok(ClaimReport {
            transaction_ids: self.claim_transaction_rows(db, hash, profile_id).await?,
            settlement_ids: self.claim_settlement_rows(db, hash, profile_id).await?,
            subscription_ids: self.claim_subscription_rows(db, hash, profile_id).await?,
            reminder_ids: self.claim_reminder_rows(db, hash, profile_id).await?,
        })
    }

    /// Moves every row recorded against `hash` from the absorbed profile
    /// (or from nobody) to the survivor.
    pub(super) async fn reassign_all(
        &self,
        db: &DatabaseTransaction,
        hash: &PhoneHash,
        absorbed_id: &str,
        survivor_id: &str,
    ) -> ResultIdentity<TransferCounts> {
        Ok(TransferCounts {
            transactions: self
                .reassign_transaction_rows(db, hash, absorbed_id, survivor_id)
                .await?,
            settlements: self
                .reassign_settlement_rows(db, hash, absorbed_id, survivor_id)
                .await?,
            subscriptions: self
                .reassign_subscription_rows(db, hash, absorbed_id, survivor_id)
                .await?,
            reminders: self
                .reassign_reminder_rows(db, hash, absorbed_id, survivor_id)
                .await?,
        })
    }
}
