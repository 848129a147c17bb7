use axum::{extract::State, http::StatusCode, response::Redirect};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{Result, msg};
use crate::extractors::Query;
use crate::oauth;

/// Start the authorization handshake: issue a one-time state and send the
/// operator to the provider's consent page.
pub async fn authorize(State(state): State<AppState>) -> Result<Redirect> {
    let conn = state.db.get()?;
    let issued = queries::create_oauth_state(&conn)?;

    tracing::info!("Issued OAuth state, redirecting to provider authorization page");
    Ok(Redirect::temporary(&oauth::authorization_url(
        &state.config.oauth,
        &issued.state,
    )))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Provider redirect target: check the state, exchange the code, and store
/// the resulting credential.
///
/// Only the most recently issued, unexpired state is accepted (401 otherwise).
/// State is checked before the code.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<(StatusCode, &'static str)> {
    let latest = {
        let conn = state.db.get()?;
        queries::get_latest_oauth_state(&conn)?
    };
    let state_matches = match (&latest, &query.state) {
        (Some(issued), Some(received)) => {
            issued.state == *received
                && !issued.is_expired(Utc::now().timestamp(), state.config.oauth.state_ttl_secs)
        }
        _ => false,
    };
    if !state_matches {
        tracing::warn!("OAuth callback with unknown, stale or missing state");
        return Ok((StatusCode::UNAUTHORIZED, msg::INVALID_STATE));
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Ok((StatusCode::BAD_REQUEST, msg::MISSING_CODE));
    };

    let credentials = state.pipeline.credentials();
    let grant = match credentials.token_client().exchange_code(code).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!("Error exchanging authorization code: {}", e);
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, msg::TOKEN_EXCHANGE_FAILED));
        }
    };
    // Without a refresh token the credential would strand on first expiry.
    if grant.refresh_token.as_deref().is_none_or(str::is_empty) {
        tracing::error!("Authorization code exchange returned no refresh token");
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, msg::TOKEN_EXCHANGE_FAILED));
    }

    let stored = credentials.store().write(&grant)?;
    let conn = state.db.get()?;
    queries::clear_oauth_states(&conn)?;

    tracing::info!(
        provider = %stored.provider,
        version = stored.version,
        expires_at = stored.expires_at,
        "Stored OAuth credential"
    );
    Ok((StatusCode::OK, msg::TOKENS_STORED))
}
