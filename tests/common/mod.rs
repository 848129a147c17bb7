//! Test utilities and fixtures for Ledgerbridge integration tests

#![allow(dead_code)]

use axum::Router;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

pub use ledgerbridge::config::{AccountingConfig, Config, DefaultAddress, OAuthConfig};
pub use ledgerbridge::db::{AppState, DbPool, create_pool, init_db, queries};
pub use ledgerbridge::models::*;

pub const PROVIDER: &str = "contaazul";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const HOME_ACCOUNT: &str = "acct-brl";
pub const FOREIGN_ACCOUNT: &str = "acct-foreign";
pub const HOTTOK: &str = "test-hottok";

/// A file-backed database in a temp dir. Every pooled connection sees the
/// same data, which `:memory:` would not give us.
pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("ledgerbridge-test.db");
    let pool = create_pool(path.to_str().expect("temp path is utf-8"))
        .expect("Failed to create pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    TestDb { pool, _dir: dir }
}

pub fn test_default_address() -> DefaultAddress {
    DefaultAddress {
        zip_code: "01310100".to_string(),
        street: "Avenida Paulista".to_string(),
        number: "1000".to_string(),
        neighborhood: "Bela Vista".to_string(),
        city: "Sao Paulo".to_string(),
        state: "SP".to_string(),
    }
}

/// Config whose token endpoint and accounting API both point at `server`.
pub fn test_config(server: &MockServer) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: String::new(),
        oauth: OAuthConfig {
            provider: PROVIDER.to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:3000/oauth/callback".to_string(),
            scope: "sales".to_string(),
            authorize_url: "https://auth.example.com/authorize".to_string(),
            token_url: format!("{}{}", server.uri(), TOKEN_PATH),
            state_ttl_secs: 600,
            expiry_margin_secs: 30,
            refresh_lease_secs: 30,
        },
        accounting: AccountingConfig {
            api_base_url: server.uri(),
            home_currency: "BRL".to_string(),
            home_country_aliases: vec![
                "BR".to_string(),
                "BRA".to_string(),
                "BRASIL".to_string(),
                "BRAZIL".to_string(),
            ],
            home_financial_account_id: HOME_ACCOUNT.to_string(),
            foreign_financial_account_id: FOREIGN_ACCOUNT.to_string(),
            default_address: test_default_address(),
            request_timeout: Duration::from_secs(5),
        },
        webhook_hottok: None,
    }
}

/// Full application state backed by a temp database and `server`.
pub fn create_test_app_state(server: &MockServer, db: &TestDb) -> AppState {
    ledgerbridge::build_state(test_config(server), db.pool.clone())
}

pub fn create_test_app_state_with_hottok(server: &MockServer, db: &TestDb) -> AppState {
    let mut config = test_config(server);
    config.webhook_hottok = Some(HOTTOK.to_string());
    ledgerbridge::build_state(config, db.pool.clone())
}

pub fn app(state: AppState) -> Router {
    ledgerbridge::handlers::router().with_state(state)
}

/// Store a credential the way the handshake does; a negative `expires_in`
/// seeds one that is already expired.
pub fn seed_credential(db: &TestDb, access: &str, refresh: &str, expires_in: i64) -> Credential {
    let conn = db.pool.get().unwrap();
    let grant = TokenGrant {
        access_token: access.to_string(),
        refresh_token: Some(refresh.to_string()),
        expires_in,
    };
    queries::upsert_credential(&conn, PROVIDER, &grant).unwrap()
}

pub fn stored_credential(db: &TestDb) -> Option<Credential> {
    let conn = db.pool.get().unwrap();
    queries::get_credential(&conn, PROVIDER).unwrap()
}

pub fn token_response(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": expires_in,
        "token_type": "Bearer"
    })
}

/// Order date used by purchase fixtures (2023-11-14T22:13:20Z).
pub const ORDER_DATE_MS: i64 = 1_700_000_000_000;

/// A completed domestic PIX purchase by a buyer with a valid CPF.
pub fn purchase_data() -> Value {
    json!({
        "product": { "id": 4242, "name": "Curso de Rust" },
        "buyer": {
            "name": "Maria Silva",
            "email": "maria@example.com",
            "document": "529.982.247-25",
            "checkout_phone": "+55 (11) 98765-4321",
            "address": {
                "zipcode": "04538-133",
                "address": "Avenida Brigadeiro Faria Lima",
                "number": "3477",
                "neighborhood": "Itaim Bibi",
                "city": "Sao Paulo",
                "state": "SP",
                "country": "Brasil",
                "country_iso": "BR"
            }
        },
        "purchase": {
            "transaction": "HP123456789",
            "order_date": ORDER_DATE_MS,
            "price": { "value": 197.0, "currency_value": "BRL" },
            "original_offer_price": { "value": 197.0, "currency_value": "BRL" },
            "payment": { "type": "PIX" }
        }
    })
}

pub fn webhook_body(event: &str, data: Value) -> Value {
    json!({
        "id": "evt-1",
        "event": event,
        "version": "2.0.0",
        "data": data
    })
}

pub fn purchase_event(data: Value) -> PurchaseEvent {
    serde_json::from_value(data).expect("fixture is a valid purchase event")
}
