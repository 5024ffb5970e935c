//! Environment-driven runtime configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address, `CRM_ADDR` (default `127.0.0.1:8080`).
    pub addr: String,
    /// SQLite database path, `CRM_DATABASE` (default `crm.sqlite`).
    pub database_path: String,
    /// JWT signing secret, `CRM_JWT_SECRET`.
    pub jwt_secret: String,
    /// Token lifetime in hours, `CRM_TOKEN_TTL_HOURS` (default 12).
    pub token_ttl_hours: u64,
    /// Password for the bootstrap admin account, `CRM_ADMIN_PASSWORD`.
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("CRM_JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("CRM_JWT_SECRET not set, falling back to the development secret");
            "dev-secret-khong-dung-cho-production".to_string()
        });

        Self {
            addr: env::var("CRM_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_path: env::var("CRM_DATABASE").unwrap_or_else(|_| "crm.sqlite".to_string()),
            jwt_secret,
            token_ttl_hours: env::var("CRM_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12),
            admin_password: env::var("CRM_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
        }
    }

    /// Fixed configuration for tests, no environment involved.
    pub fn for_tests(secret: &str) -> Self {
        Self {
            addr: "127.0.0.1:0".to_string(),
            database_path: ":memory:".to_string(),
            jwt_secret: secret.to_string(),
            token_ttl_hours: 1,
            admin_password: "admin".to_string(),
        }
    }
}
