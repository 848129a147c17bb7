use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_AUTHORIZE_URL: &str = "https://api.contaazul.com/auth/authorize";
const DEFAULT_TOKEN_URL: &str = "https://api.contaazul.com/oauth2/token";
const DEFAULT_ACCOUNTING_API_URL: &str = "https://api.contaazul.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// OAuth2 client registration with the accounting provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Key of the single credential slot (e.g. "contaazul")
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
    /// How long an issued `state` value stays acceptable
    pub state_ttl_secs: i64,
    /// Tokens expiring within this many seconds are refreshed early
    pub expiry_margin_secs: i64,
    /// How long one process may hold the cross-process refresh lease
    pub refresh_lease_secs: u64,
}

/// Address used when the buyer's own address is absent, foreign, or invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAddress {
    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct AccountingConfig {
    pub api_base_url: String,
    /// ISO 4217 code of the bookkeeping currency
    pub home_currency: String,
    /// ISO 3166 alpha-2 code plus accepted spellings of the home country
    pub home_country_aliases: Vec<String>,
    pub home_financial_account_id: String,
    pub foreign_financial_account_id: String,
    pub default_address: DefaultAddress,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub oauth: OAuthConfig,
    pub accounting: AccountingConfig,
    /// Shared secret expected in `X-HOTMART-HOTTOK`; verification is off when unset
    pub webhook_hottok: Option<String>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = or_default("HOST", "127.0.0.1");
        let port: u16 = parse_or("PORT", 3000)?;

        let oauth = OAuthConfig {
            provider: or_default("OAUTH_PROVIDER", "contaazul"),
            client_id: required("OAUTH_CLIENT_ID")?,
            client_secret: required("OAUTH_CLIENT_SECRET")?,
            redirect_uri: required("OAUTH_REDIRECT_URI")?,
            scope: or_default("OAUTH_SCOPE", "sales"),
            authorize_url: or_default("OAUTH_AUTHORIZE_URL", DEFAULT_AUTHORIZE_URL),
            token_url: or_default("OAUTH_TOKEN_URL", DEFAULT_TOKEN_URL),
            state_ttl_secs: parse_or("OAUTH_STATE_TTL_SECS", 600)?,
            expiry_margin_secs: parse_or("TOKEN_EXPIRY_MARGIN_SECS", 30)?,
            refresh_lease_secs: parse_or("TOKEN_REFRESH_LEASE_SECS", 30)?,
        };

        let accounting = AccountingConfig {
            api_base_url: or_default("ACCOUNTING_API_URL", DEFAULT_ACCOUNTING_API_URL),
            home_currency: or_default("HOME_CURRENCY", "BRL").to_uppercase(),
            home_country_aliases: vec![
                "BR".to_string(),
                "BRA".to_string(),
                "BRASIL".to_string(),
                "BRAZIL".to_string(),
            ],
            home_financial_account_id: required("HOME_FINANCIAL_ACCOUNT_ID")?,
            foreign_financial_account_id: required("FOREIGN_FINANCIAL_ACCOUNT_ID")?,
            default_address: DefaultAddress {
                zip_code: required("DEFAULT_ZIPCODE")?,
                street: required("DEFAULT_STREET")?,
                number: required("DEFAULT_NUMBER")?,
                neighborhood: required("DEFAULT_NEIGHBORHOOD")?,
                city: required("DEFAULT_CITY")?,
                state: required("DEFAULT_STATE")?,
            },
            request_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 15)?),
        };

        Ok(Self {
            host,
            port,
            database_path: or_default("DATABASE_PATH", "ledgerbridge.db"),
            oauth,
            accounting,
            webhook_hottok: env::var("HOTMART_HOTTOK").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
