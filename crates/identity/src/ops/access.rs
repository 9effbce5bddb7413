use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{IdentityError, PhoneHash, PhoneStatus, ResultIdentity, profiles};

use super::{IdentityService, normalize_required_name};

impl IdentityService {
    /// Registers a new profile and returns it, api token included.
    pub async fn create_profile(&self, display_name: &str) -> ResultIdentity<profiles::Model> {
        let display_name = normalize_required_name(display_name, "profile")?;
        let profile = profiles::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            display_name: ActiveValue::Set(display_name),
            api_token: ActiveValue::Set(Uuid::new_v4().simple().to_string()),
            phone: ActiveValue::Set(None),
            phone_hash: ActiveValue::Set(None),
            pending_phone: ActiveValue::Set(None),
            phone_status: ActiveValue::Set(PhoneStatus::Unverified.as_str().to_string()),
            deleted: ActiveValue::Set(false),
            merged_into: ActiveValue::Set(None),
            merged_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = profile.insert(&self.database).await?;
        tracing::info!(profile_id = %model.id, "profile created");
        Ok(model)
    }

    /// Resolves a bearer token to a live profile.
    pub async fn profile_by_token(&self, token: &str) -> ResultIdentity<profiles::Model> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::Unauthorized);
        }
        profiles::Entity::find()
            .filter(profiles::Column::ApiToken.eq(token))
            .filter(profiles::Column::Deleted.eq(false))
            .one(&self.database)
            .await?
            .ok_or(IdentityError::Unauthorized)
    }

    /// Returns a profile by id, tombstones included.
    pub async fn profile(&self, profile_id: &str) -> ResultIdentity<profiles::Model> {
        profiles::Entity::find_by_id(profile_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| IdentityError::KeyNotFound("profile not exists".to_string()))
    }

    pub(super) async fn require_live_profile<C: ConnectionTrait>(
        &self,
        db: &C,
        profile_id: &str,
    ) -> ResultIdentity<profiles::Model> {
        profiles::Entity::find_by_id(profile_id.to_string())
            .filter(profiles::Column::Deleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| IdentityError::KeyNotFound("profile not exists".to_string()))
    }

    /// The live profile bearing `hash`, other than `excluding`.
    pub(super) async fn live_profile_by_hash<C: ConnectionTrait>(
        &self,
        db: &C,
        hash: &PhoneHash,
        excluding: Option<&str>,
    ) -> ResultIdentity<Option<profiles::Model>> {
        let mut query = profiles::Entity::find()
            .filter(profiles::Column::PhoneHash.eq(hash.as_str()))
            .filter(profiles::Column::Deleted.eq(false));
        if let Some(excluding) = excluding {
            query = query.filter(profiles::Column::Id.ne(excluding));
        }
        query.one(db).await.map_err(Into::into)
    }
}
