//! IMAP connection configuration

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;

/// Default per-operation timeout in seconds.
///
/// Every suspension point in [`crate::MailSession`] is bounded by
/// this so a hung read never stalls the pipeline.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// IMAP account and transport configuration.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Use implicit TLS for the connection. When false the session
    /// runs over plain TCP.
    pub tls: bool,
    /// Upper bound applied to every network operation.
    pub timeout: Duration,
}

impl ImapConfig {
    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `EMAIL_USER`
    /// - `EMAIL_PASSWORD`
    /// - `EMAIL_HOST`
    ///
    /// Optional (with defaults):
    /// - `EMAIL_TLS` (default: `true`)
    /// - `EMAIL_PORT` (default: `993` with TLS, `143` without)
    /// - `EMAIL_TIMEOUT_SECS` (default: `60`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let tls = match env::var("EMAIL_TLS") {
            Ok(v) => parse_bool(&v)
                .ok_or_else(|| Error::Config(format!("Invalid EMAIL_TLS: {v}")))?,
            Err(_) => true,
        };

        let default_port = if tls { 993 } else { 143 };
        let port = match env::var("EMAIL_PORT") {
            Ok(v) => v
                .parse()
                .map_err(|e| Error::Config(format!("Invalid EMAIL_PORT: {e}")))?,
            Err(_) => default_port,
        };

        let timeout_secs = match env::var("EMAIL_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|e| Error::Config(format!("Invalid EMAIL_TIMEOUT_SECS: {e}")))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host: env::var("EMAIL_HOST")
                .map_err(|_| Error::Config("EMAIL_HOST not set".into()))?,
            port,
            username: env::var("EMAIL_USER")
                .map_err(|_| Error::Config("EMAIL_USER not set".into()))?,
            password: env::var("EMAIL_PASSWORD")
                .map_err(|_| Error::Config("EMAIL_PASSWORD not set".into()))?,
            tls,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
