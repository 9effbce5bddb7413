use std::future::Future;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, IntoActiveModel, prelude::*};

use crate::{
    IdentityError, OneTimeCode, PhoneHash, PhoneNumber, PhoneStatus, ResultIdentity,
    VerificationError, profiles,
};

use super::{ClaimReport, IdentityService, TransferCounts};

/// Result of a successful phone verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The phone was attached to the caller; pending rows were claimed.
    PhoneVerified { claimed: ClaimReport },
    /// Another profile already bore the phone and was absorbed by the
    /// caller.
    AccountsMerged {
        merged_profile_name: String,
        data_transferred: TransferCounts,
    },
}

impl IdentityService {
    /// Asks the provider to send a code to `phone` and moves the profile to
    /// `verifying`, unless it already holds a verified phone.
    pub async fn request_code(&self, profile_id: &str, phone: &str) -> ResultIdentity<()> {
        let phone = PhoneNumber::parse(phone)?;
        let profile = self
            .require_live_profile(&self.database, profile_id)
            .await?;

        self.with_provider_retry("send_code", || self.provider.send_code(&phone))
            .await?;
        self.mark_verifying(profile, &phone).await?;
        tracing::info!(profile_id, "verification code sent");
        Ok(())
    }

    /// Checks `code` for `phone` and, when approved, links the phone to the
    /// profile.
    ///
    /// If another live profile already bears the phone, it is merged into
    /// the caller: its ledger rows move to the caller and it becomes a
    /// tombstone. Linking and merging run in one transaction; on failure
    /// nothing changes and the profile keeps its pre-link status.
    pub async fn verify_phone(
        &self,
        profile_id: &str,
        phone: &str,
        code: &str,
    ) -> ResultIdentity<VerifyOutcome> {
        let phone = PhoneNumber::parse(phone)?;
        let code = OneTimeCode::parse(code)?;
        let profile = self
            .require_live_profile(&self.database, profile_id)
            .await?;
        self.mark_verifying(profile, &phone).await?;

        if let Err(err) = self
            .with_provider_retry("check_code", || self.provider.check_code(&phone, &code))
            .await
        {
            tracing::info!(profile_id, "phone verification rejected: {err}");
            return Err(err.into());
        }

        let survivor_id = profile_id.to_string();
        let outcome = self
            .with_tx(|service, db_tx| {
                Box::pin(async move { service.link_phone(db_tx, survivor_id.as_str(), &phone).await })
            })
            .await
            .map_err(|err| {
                tracing::error!(profile_id, "linking phone failed: {err}");
                IdentityError::LinkingFailed
            })?;

        match &outcome {
            VerifyOutcome::PhoneVerified { claimed } => {
                tracing::info!(profile_id, claimed = claimed.counts().total(), "phone verified");
            }
            VerifyOutcome::AccountsMerged {
                data_transferred, ..
            } => {
                tracing::info!(
                    profile_id,
                    transferred = data_transferred.total(),
                    "accounts merged"
                );
            }
        }
        Ok(outcome)
    }

    async fn link_phone(
        &self,
        db: &DatabaseTransaction,
        survivor_id: &str,
        phone: &PhoneNumber,
    ) -> ResultIdentity<VerifyOutcome> {
        let survivor = self.require_live_profile(db, survivor_id).await?;
        let hash = phone.hash();

        let Some(absorbed) = self
            .live_profile_by_hash(db, &hash, Some(survivor_id))
            .await?
        else {
            self.attach_phone(db, survivor, phone, &hash).await?;
            let claimed = self.claim_all(db, &hash, survivor_id).await?;
            return Ok(VerifyOutcome::PhoneVerified { claimed });
        };

        let data_transferred = self
            .reassign_all(db, &hash, absorbed.id.as_str(), survivor_id)
            .await?;
        let merged_profile_name = absorbed.display_name.clone();
        self.tombstone(db, absorbed, survivor_id).await?;
        self.attach_phone(db, survivor, phone, &hash).await?;

        Ok(VerifyOutcome::AccountsMerged {
            merged_profile_name,
            data_transferred,
        })
    }

    async fn attach_phone(
        &self,
        db: &DatabaseTransaction,
        profile: profiles::Model,
        phone: &PhoneNumber,
        hash: &PhoneHash,
    ) -> ResultIdentity<()> {
        let mut active = profile.into_active_model();
        active.phone = ActiveValue::Set(Some(phone.to_string()));
        active.phone_hash = ActiveValue::Set(Some(hash.to_string()));
        active.pending_phone = ActiveValue::Set(None);
        active.phone_status = ActiveValue::Set(PhoneStatus::Verified.as_str().to_string());
        active.update(db).await?;
        Ok(())
    }

    /// Marks the absorbed profile as merged. Its phone is cleared so the
    /// survivor can take the hash.
    async fn tombstone(
        &self,
        db: &DatabaseTransaction,
        absorbed: profiles::Model,
        survivor_id: &str,
    ) -> ResultIdentity<()> {
        let mut active = absorbed.into_active_model();
        active.deleted = ActiveValue::Set(true);
        active.merged_into = ActiveValue::Set(Some(survivor_id.to_string()));
        active.merged_at = ActiveValue::Set(Some(Utc::now()));
        active.phone = ActiveValue::Set(None);
        active.phone_hash = ActiveValue::Set(None);
        active.pending_phone = ActiveValue::Set(None);
        active.phone_status = ActiveValue::Set(PhoneStatus::Merged.as_str().to_string());
        active.update(db).await?;
        Ok(())
    }

    /// Records `phone` as the pending number. A profile that already holds
    /// a verified phone keeps its `verified` status until a new number is
    /// linked.
    async fn mark_verifying(
        &self,
        profile: profiles::Model,
        phone: &PhoneNumber,
    ) -> ResultIdentity<()> {
        let keeps_verified =
            profile.phone_hash.is_some() && profile.phone_status()? == PhoneStatus::Verified;
        let mut active = profile.into_active_model();
        active.pending_phone = ActiveValue::Set(Some(phone.to_string()));
        if !keeps_verified {
            active.phone_status = ActiveValue::Set(PhoneStatus::Verifying.as_str().to_string());
        }
        active.update(&self.database).await?;
        Ok(())
    }

    /// Runs a provider call, retrying transient failures with a linear
    /// backoff.
    async fn with_provider_retry<F, Fut>(
        &self,
        call_name: &str,
        mut call: F,
    ) -> Result<(), VerificationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), VerificationError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, "{call_name} failed, retrying: {err}");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                result => return result,
            }
        }
    }
}
