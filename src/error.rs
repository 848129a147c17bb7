use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Response bodies shared by handlers.
pub mod msg {
    pub const EVENT_IGNORED: &str = "Event ignored";
    pub const WEBHOOK_PROCESSED: &str = "Webhook processed successfully";
    pub const WEBHOOK_FAILED: &str = "Error processing webhook";
    pub const INVALID_JSON: &str = "Invalid JSON";
    pub const INVALID_PURCHASE: &str = "Invalid purchase payload";
    pub const INVALID_HOTTOK: &str = "Invalid webhook token";
    pub const INVALID_STATE: &str = "Invalid state";
    pub const MISSING_CODE: &str = "Missing authorization code";
    pub const TOKENS_STORED: &str = "Tokens received and stored successfully";
    pub const TOKEN_EXCHANGE_FAILED: &str = "Error during OAuth token exchange";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Reconcile(e) => {
                tracing::error!("Reconciliation error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of an outbound HTTP call (token endpoint or accounting API).
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// HTTP status returned by the upstream, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Everything that can stop a purchase event from becoming a sale.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("invalid purchase payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// No credential was ever stored; the authorization handshake must be run.
    #[error("no OAuth credential stored for provider {0}")]
    CredentialUnavailable(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] UpstreamError),

    /// Another writer replaced the credential but it is still not usable.
    #[error("credential for provider {0} changed concurrently and is still expired")]
    RefreshConflict(String),

    #[error("accounting API call failed: {0}")]
    UpstreamApi(#[from] UpstreamError),

    #[error("credential storage error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("credential storage pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
