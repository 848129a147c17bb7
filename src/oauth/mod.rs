//! OAuth2 credential lifecycle for the accounting provider: the token
//! endpoint client, the persisted credential slot, and the manager that keeps
//! the access token fresh.

mod manager;
mod store;
mod token_client;

pub use manager::CredentialManager;
pub use store::CredentialStore;
pub use token_client::TokenClient;

use crate::config::OAuthConfig;

/// URL the operator is redirected to in order to authorize the integration.
pub fn authorization_url(config: &OAuthConfig, state: &str) -> String {
    let separator = if config.authorize_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        config.authorize_url,
        separator,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(state),
    )
}
