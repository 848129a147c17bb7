use serde::Deserialize;

/// OAuth2 credential for the accounting provider.
///
/// There is exactly one row per provider. `version` starts at 1 and is bumped
/// on every write so refreshes can be applied with compare-and-swap.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) after which the access token is unusable
    pub expires_at: i64,
    pub version: i64,
    pub updated_at: i64,
}

impl Credential {
    /// True when the access token is still usable `margin_secs` from `now`.
    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs < self.expires_at
    }

    /// The credential that results from applying `grant` at `now`.
    ///
    /// The version is advanced; a grant without a refresh token keeps the
    /// current one.
    pub fn rotated(&self, grant: TokenGrant, now: i64) -> Credential {
        Credential {
            provider: self.provider.clone(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.unwrap_or_else(|| self.refresh_token.clone()),
            expires_at: now + grant.expires_in,
            version: self.version + 1,
            updated_at: now,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("version", &self.version)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Token endpoint response for both `authorization_code` and `refresh_token` grants.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
