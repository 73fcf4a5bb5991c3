//! Application configuration loaded from environment variables.
//!
//! Required:
//! - `DATABASE_URL` - MongoDB connection string
//! - `JWT_SECRET` - session token signing secret
//! - `ADMIN_EMAIL` - email whose account is seeded with the admin role
//! - `CLIENT_URL` - public URL of the storefront (redirect target, email links)
//! - `SERVER_URL` - public URL of this API (OAuth callback base)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - OAuth credentials
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM` - mail relay
//!
//! Optional:
//! - `BIND_ADDR` (default: 127.0.0.1:8080)
//! - `DATABASE_NAME` (default: second_chance)
//! - `SMTP_PORT` (default: 587)
//! - `APP_ENV` - "production" switches the session cookie to Secure

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(String),
    #[error("invalid environment variable {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub client_url: String,
    pub server_url: String,
    pub google: GoogleConfig,
    pub smtp: SmtpConfig,
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = match env::var("SMTP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidVar("SMTP_PORT".into(), e.to_string()))?,
            Err(_) => 587,
        };

        Ok(Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: require("DATABASE_URL")?,
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "second_chance".to_string()),
            jwt_secret: require("JWT_SECRET")?,
            admin_email: require("ADMIN_EMAIL")?.to_lowercase(),
            client_url: require("CLIENT_URL")?.trim_end_matches('/').to_string(),
            server_url: require("SERVER_URL")?.trim_end_matches('/').to_string(),
            google: GoogleConfig {
                client_id: require("GOOGLE_CLIENT_ID")?,
                client_secret: require("GOOGLE_CLIENT_SECRET")?,
            },
            smtp: SmtpConfig {
                host: require("SMTP_HOST")?,
                port: smtp_port,
                username: require("SMTP_USERNAME")?,
                password: require("SMTP_PASSWORD")?,
                from_address: require("EMAIL_FROM")?,
            },
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: "mongodb://localhost:27017".to_string(),
        database_name: "second_chance_test".to_string(),
        jwt_secret: "test-signing-secret".to_string(),
        admin_email: "admin@secondchance.test".to_string(),
        client_url: "http://localhost:3000".to_string(),
        server_url: "http://localhost:8080".to_string(),
        google: GoogleConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.test".to_string(),
            port: 587,
            username: "mailer@secondchance.test".to_string(),
            password: "hunter2".to_string(),
            from_address: "Second Chance Store <no-reply@secondchance.test>".to_string(),
        },
        production: false,
    }
}
