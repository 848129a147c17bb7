use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::error::{ReconcileError, msg};
use crate::models::WebhookEnvelope;
use crate::reconcile::Outcome;

pub const HOTTOK_HEADER: &str = "x-hotmart-hottok";

/// Constant-time comparison of the shared webhook token.
fn hottok_matches(expected: &str, provided: &str) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Purchase webhook. 200 for ignored or reconciled events, 500 when
/// reconciliation fails so the platform redelivers.
pub async fn handle_hotmart_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Some(expected) = &state.config.webhook_hottok {
        let provided = headers
            .get(HOTTOK_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !hottok_matches(expected, provided) {
            tracing::warn!("Rejected webhook with invalid hottok");
            return (StatusCode::UNAUTHORIZED, msg::INVALID_HOTTOK);
        }
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!("Failed to parse webhook body: {}", e);
            return (StatusCode::BAD_REQUEST, msg::INVALID_JSON);
        }
    };

    match state.pipeline.handle(envelope).await {
        Ok(Outcome::Ignored { .. }) => (StatusCode::OK, msg::EVENT_IGNORED),
        Ok(Outcome::Reconciled { .. }) => (StatusCode::OK, msg::WEBHOOK_PROCESSED),
        Err(ReconcileError::InvalidPayload(e)) => {
            tracing::warn!("Purchase payload did not match the expected shape: {}", e);
            (StatusCode::BAD_REQUEST, msg::INVALID_PURCHASE)
        }
        Err(e) => {
            tracing::error!("Error processing webhook: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, msg::WEBHOOK_FAILED)
        }
    }
}
