use reqwest::Client;

use crate::config::OAuthConfig;
use crate::error::UpstreamError;
use crate::models::TokenGrant;

/// Client for the provider's OAuth2 token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl TokenClient {
    pub fn new(config: &OAuthConfig, client: Client) -> Self {
        Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// `grant_type=authorization_code`: trade the callback code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, UpstreamError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request_token(&params).await
    }

    /// `grant_type=refresh_token`. Providers rotate the refresh token, so the
    /// one passed in is spent once this succeeds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, UpstreamError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request_token(&params).await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenGrant, UpstreamError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                endpoint: self.token_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                endpoint: self.token_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|source| UpstreamError::Decode {
                endpoint: self.token_url.clone(),
                source,
            })
    }
}
