/*
 * Responsibility
 * - Environment configuration (SSO server endpoints, chain paths, timeouts)
 * - Validation of required settings (missing any -> startup failure)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which backend stores sessions. The core only needs get/put/delete by
/// session id, so this stays a deployment choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Valkey,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // SSO server base URL, e.g. https://sso.example.com/cas
    pub sso_server_prefix: Url,
    // This application's ticket-receiving endpoint as the SSO server sees it,
    // e.g. https://app.example.com/sso/callback
    pub service_callback_url: Url,
    // Where to send the browser when ticket validation fails.
    pub login_failure_url: Url,
    // Where to send the browser after local logout (usually the SSO logout).
    pub logout_url: Url,
    // Local path the filter chain routes to the ticket stage, e.g. /sso/callback
    pub ticket_callback_path: String,

    pub validation_timeout_seconds: u64,
    pub permission_refresh_seconds: u64,
    pub session_ttl_seconds: u64,
    pub request_timeout_seconds: u64,

    pub session_backend: SessionBackend,
    pub valkey_url: Option<String>,

    pub default_roles: Vec<String>,
    pub static_permissions: Vec<String>,

    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let sso_server_prefix = require_url("SSO_SERVER_PREFIX")?;
        let service_callback_url = require_url("SERVICE_CALLBACK_URL")?;
        let login_failure_url = require_url("LOGIN_FAILURE_URL")?;
        let logout_url = require_url("LOGOUT_URL")?;

        let ticket_callback_path = std::env::var("TICKET_CALLBACK_PATH")
            .map_err(|_| ConfigError::Missing("TICKET_CALLBACK_PATH"))?;
        if !ticket_callback_path.starts_with('/') {
            return Err(ConfigError::Invalid("TICKET_CALLBACK_PATH"));
        }

        let validation_timeout_seconds = seconds_or("VALIDATION_TIMEOUT_SECONDS", 5);
        let permission_refresh_seconds = seconds_or("PERMISSION_REFRESH_SECONDS", 120);
        let session_ttl_seconds = seconds_or("SESSION_TTL_SECONDS", 8 * 60 * 60);
        let request_timeout_seconds = seconds_or("REQUEST_TIMEOUT_SECONDS", 30);

        let session_backend = match std::env::var("SESSION_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            "valkey" | "redis" => SessionBackend::Valkey,
            _ => return Err(ConfigError::Invalid("SESSION_BACKEND")),
        };

        let valkey_url = std::env::var("VALKEY_URL").ok();
        if session_backend == SessionBackend::Valkey && valkey_url.is_none() {
            return Err(ConfigError::Missing("VALKEY_URL"));
        }

        let default_roles = list_or("DEFAULT_ROLES", "ROLE_USER");
        let static_permissions = list_or("STATIC_PERMISSIONS", "sys:dept:list");

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            addr,
            app_env,
            sso_server_prefix,
            service_callback_url,
            login_failure_url,
            logout_url,
            ticket_callback_path,
            validation_timeout_seconds,
            permission_refresh_seconds,
            session_ttl_seconds,
            request_timeout_seconds,
            session_backend,
            valkey_url,
            default_roles,
            static_permissions,
            cors_allowed_origins,
        })
    }
}

fn require_url(key: &'static str) -> Result<Url, ConfigError> {
    let raw = std::env::var(key).map_err(|_| ConfigError::Missing(key))?;
    Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid(key))
}

fn seconds_or(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn list_or(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
