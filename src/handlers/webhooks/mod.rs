pub mod hotmart;

pub use hotmart::handle_hotmart_webhook;

use axum::{Router, routing::post};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/hotmart", post(handle_hotmart_webhook))
}
