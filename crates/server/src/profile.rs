//! Profile registration and lookup.

use api_types::profile::{Profile, ProfileCreated, ProfileNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use identity::profiles;

use crate::{ServerError, server::ServerState};

/// Registers a profile and returns its bearer token.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<ProfileNew>,
) -> Result<(StatusCode, Json<ProfileCreated>), ServerError> {
    let profile = state.identity.create_profile(&payload.display_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProfileCreated {
            id: profile.id,
            display_name: profile.display_name,
            api_token: profile.api_token,
        }),
    ))
}

/// The authenticated caller.
pub async fn me(Extension(profile): Extension<profiles::Model>) -> Json<Profile> {
    Json(Profile {
        id: profile.id,
        display_name: profile.display_name,
        phone: profile.phone,
        phone_status: profile.phone_status,
    })
}
