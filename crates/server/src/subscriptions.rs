use api_types::subscription::{MaterializeShares, SharesMaterialized};
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection};
use identity::profiles;

use crate::server::ServerState;

/// Handle requests for materializing subscriber shares.
///
/// A missing or malformed body is an empty batch.
pub async fn materialize_shares(
    Extension(profile): Extension<profiles::Model>,
    State(state): State<ServerState>,
    payload: Result<Json<MaterializeShares>, JsonRejection>,
) -> Json<SharesMaterialized> {
    let ids = payload
        .map(|Json(payload)| payload.subscription_ids)
        .unwrap_or_default();
    if ids.is_empty() {
        return Json(SharesMaterialized::default());
    }

    let report = state
        .identity
        .materialize_subscription_shares(&profile.id, &ids)
        .await;

    Json(SharesMaterialized {
        processed: report.processed,
        participants_created: report.participants_created,
    })
}
