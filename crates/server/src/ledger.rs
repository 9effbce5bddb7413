use api_types::ledger::ClaimPending;
use axum::{Extension, Json, extract::State};
use identity::profiles;

use crate::{ServerError, server::ServerState};

/// Handle requests for claiming ledger rows recorded against the caller's
/// phone
pub async fn claim_pending(
    Extension(profile): Extension<profiles::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ClaimPending>, ServerError> {
    let report = state.identity.claim_pending_ledger(&profile.id).await?;
    let counts = report.counts();

    Ok(Json(ClaimPending {
        claimed_transactions: counts.transactions,
        claimed_settlements: counts.settlements,
        claimed_subscriptions: counts.subscriptions,
        claimed_reminders: counts.reminders,
        transaction_ids: report.transaction_ids,
        settlement_ids: report.settlement_ids,
        subscription_ids: report.subscription_ids,
        reminder_ids: report.reminder_ids,
    }))
}
