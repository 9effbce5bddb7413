use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use identity::{IdentityError, IdentityService};

use std::sync::Arc;

use crate::{ServerError, ledger, phone, profile, subscriptions};

#[derive(Clone)]
pub struct ServerState {
    pub identity: Arc<IdentityService>,
}

/// Resolves `Authorization: Bearer <api_token>` to a live profile and hands
/// it to the handler as an extension.
async fn auth(
    State(state): State<ServerState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Ok(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized);
    };

    let profile = match state.identity.profile_by_token(bearer.token()).await {
        Ok(profile) => profile,
        Err(IdentityError::Unauthorized) => return Err(ServerError::Unauthorized),
        Err(err) => return Err(err.into()),
    };

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/me", get(profile::me))
        .route("/phone/send-code", post(phone::send_code))
        .route("/phone/verify", post(phone::verify))
        .route("/ledger/claim-pending", post(ledger::claim_pending))
        .route(
            "/subscriptions/materialize-shares",
            post(subscriptions::materialize_shares),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/profiles", post(profile::register))
        .with_state(state)
}

/// Builds the router around `identity`.
pub fn app(identity: IdentityService) -> Router {
    router(ServerState {
        identity: Arc::new(identity),
    })
}

pub async fn run_with_listener(
    identity: IdentityService,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(identity)).await
}
