use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use identity::{IdentityError, VerificationError};

pub use server::{ServerState, app, run_with_listener};

mod ledger;
mod phone;
mod profile;
mod server;
mod subscriptions;

#[derive(Debug)]
pub enum ServerError {
    Identity(IdentityError),
    Unauthorized,
    Generic(String),
}

fn status_for_verification_error(err: &VerificationError) -> StatusCode {
    match err {
        VerificationError::IncorrectCode | VerificationError::InvalidRecipient(_) => {
            StatusCode::BAD_REQUEST
        }
        VerificationError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
        VerificationError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        VerificationError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_identity_error(err: &IdentityError) -> StatusCode {
    match err {
        IdentityError::InvalidPhone(_)
        | IdentityError::InvalidCode(_)
        | IdentityError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        IdentityError::Unauthorized => StatusCode::UNAUTHORIZED,
        IdentityError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        IdentityError::Verification(err) => status_for_verification_error(err),
        IdentityError::LinkingFailed | IdentityError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_identity_error(err: IdentityError) -> String {
    match err {
        IdentityError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        IdentityError::Verification(VerificationError::Transient(detail)) => {
            tracing::warn!("verification provider unavailable: {detail}");
            "transient_provider_failure".to_string()
        }
        IdentityError::Verification(VerificationError::NotConfigured) => {
            tracing::error!("phone verification requested but no provider is configured");
            "verification service not configured".to_string()
        }
        IdentityError::LinkingFailed => "linking failed".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Identity(err) => (
                status_for_identity_error(&err),
                message_for_identity_error(err),
            ),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorResponse::new(error))).into_response()
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: IdentityError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(
            status_of(IdentityError::InvalidPhone("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(IdentityError::InvalidCode("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(VerificationError::IncorrectCode.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn provider_rate_limit_maps_to_429() {
        assert_eq!(
            status_of(VerificationError::TooManyAttempts.into()),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn provider_outage_maps_to_503() {
        assert_eq!(
            status_of(VerificationError::Transient("timeout".to_string()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn misconfiguration_and_linking_map_to_500() {
        assert_eq!(
            status_of(VerificationError::NotConfigured.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(IdentityError::LinkingFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn database_errors_are_hidden() {
        let err = IdentityError::Database(sea_orm::DbErr::Custom("secret table".to_string()));
        assert_eq!(message_for_identity_error(err), "internal server error");
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(status_of(IdentityError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServerError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
