//! Phone verification endpoints

use api_types::{
    Ack,
    phone::{DataTransferred, PhoneSendCode, PhoneVerified, PhoneVerify, PhoneVerifyAction},
};
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use identity::{TransferCounts, VerifyOutcome, profiles};

use crate::{ServerError, server::ServerState};

pub(crate) fn data_transferred(counts: TransferCounts) -> DataTransferred {
    DataTransferred {
        transactions: counts.transactions,
        settlements: counts.settlements,
        subscriptions: counts.subscriptions,
        reminders: counts.reminders,
    }
}

/// Handle requests for sending a one-time code to a phone
pub async fn send_code(
    Extension(profile): Extension<profiles::Model>,
    State(state): State<ServerState>,
    payload: Result<Json<PhoneSendCode>, JsonRejection>,
) -> Result<Json<Ack>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::Generic(err.body_text()))?;
    state
        .identity
        .request_code(&profile.id, &payload.phone)
        .await?;

    Ok(Json(Ack::ok()))
}

/// Handle requests for verifying a phone with its one-time code
pub async fn verify(
    Extension(profile): Extension<profiles::Model>,
    State(state): State<ServerState>,
    payload: Result<Json<PhoneVerify>, JsonRejection>,
) -> Result<Json<PhoneVerified>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::Generic(err.body_text()))?;
    let outcome = state
        .identity
        .verify_phone(&profile.id, &payload.phone, &payload.code)
        .await?;

    let action = match outcome {
        VerifyOutcome::PhoneVerified { claimed } => PhoneVerifyAction::PhoneVerified {
            claimed: data_transferred(claimed.counts()),
        },
        VerifyOutcome::AccountsMerged {
            merged_profile_name,
            data_transferred: counts,
        } => PhoneVerifyAction::AccountsMerged {
            merged_profile_name,
            data_transferred: data_transferred(counts),
        },
    };

    Ok(Json(PhoneVerified {
        success: true,
        action,
    }))
}
