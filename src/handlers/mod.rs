pub mod public;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// Every route the service exposes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(public::router())
        .merge(webhooks::router())
}
