use std::collections::HashSet;

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    IdentityError, PhoneHash, ResultIdentity, subscription_participants,
    subscription_subscribers, subscriptions,
};

use super::IdentityService;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Subscriptions handled without error.
    pub processed: u64,
    pub participants_created: u64,
}

impl IdentityService {
    /// Creates the missing `subscription_participants` rows of the caller's
    /// shared subscriptions, one transaction per subscription.
    ///
    /// A subscription that cannot be processed (unknown, not owned by the
    /// caller, storage failure) is logged and skipped; the rest of the batch
    /// still runs. Malformed ids are ignored.
    pub async fn materialize_subscription_shares(
        &self,
        caller_id: &str,
        subscription_ids: &[String],
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();
        let mut seen = HashSet::new();

        for raw_id in subscription_ids {
            let Ok(subscription_id) = Uuid::parse_str(raw_id.trim()) else {
                tracing::warn!(subscription_id = %raw_id, "skipping malformed subscription id");
                continue;
            };
            if !seen.insert(subscription_id) {
                continue;
            }

            let caller = caller_id.to_string();
            let result = self
                .with_tx(|service, db_tx| {
                    Box::pin(async move {
                        service
                            .materialize_one(db_tx, caller.as_str(), subscription_id)
                            .await
                    })
                })
                .await;

            match result {
                Ok(created) => {
                    report.processed += 1;
                    report.participants_created += created;
                }
                Err(err) => {
                    tracing::warn!(%subscription_id, "materializing subscription failed: {err}");
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            created = report.participants_created,
            "subscription shares materialized"
        );
        report
    }

    async fn materialize_one(
        &self,
        db: &DatabaseTransaction,
        caller_id: &str,
        subscription_id: Uuid,
    ) -> ResultIdentity<u64> {
        let subscription = subscriptions::Entity::find_by_id(subscription_id.to_string())
            .filter(subscriptions::Column::OwnerProfileId.eq(caller_id))
            .one(db)
            .await?
            .ok_or_else(|| IdentityError::KeyNotFound("subscription not exists".to_string()))?;
        if !subscription.is_shared || subscription.is_archived {
            return Ok(0);
        }

        let subscribers = subscription
            .find_related(subscription_subscribers::Entity)
            .all(db)
            .await?;
        let mut materialized: HashSet<String> = subscription_participants::Entity::find()
            .filter(subscription_participants::Column::SubscriptionId.eq(subscription.id.as_str()))
            .all(db)
            .await?
            .into_iter()
            .filter_map(|row| row.phone_hash)
            .collect();

        let mut created = 0;
        for subscriber in subscribers {
            let Some(hash) = subscriber.phone_hash else {
                continue;
            };
            if !materialized.insert(hash.clone()) {
                continue;
            }

            let hash = PhoneHash::from_stored(hash);
            let owner = self.live_profile_by_hash(db, &hash, None).await?;
            let row = subscription_participants::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                subscription_id: ActiveValue::Set(subscription.id.clone()),
                phone_hash: ActiveValue::Set(Some(hash.to_string())),
                profile_id: ActiveValue::Set(owner.map(|profile| profile.id)),
                display_name: ActiveValue::Set(subscriber.display_name),
                share_minor: ActiveValue::Set(subscriber.share_minor),
            };
            row.insert(db).await?;
            created += 1;
        }
        Ok(created)
    }
}
