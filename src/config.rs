/*
 * Responsibility
 * - load settings from the environment (.env is honoured)
 * - validate them up front (fail at startup, not at first request)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::region_api::DEFAULT_REGION_API_ROOT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
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

/// Where the signed-in employee's id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    File(PathBuf),
    Fixed(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub employee_api_root: Url,
    pub employee_api_token: Option<String>,
    pub region_api_root: Url,
    pub http_timeout: Duration,

    pub identity: IdentitySource,
    pub notification_capacity: usize,
}

fn parse_root(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid(key))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let employee_api_root = get("EMPLOYEE_API_ROOT")
            .ok_or(ConfigError::Missing("EMPLOYEE_API_ROOT"))
            .and_then(|raw| parse_root("EMPLOYEE_API_ROOT", &raw))?;

        let employee_api_token = get("EMPLOYEE_API_TOKEN").filter(|t| !t.trim().is_empty());

        let region_api_root = parse_root(
            "REGION_API_ROOT",
            &get("REGION_API_ROOT").unwrap_or_else(|| DEFAULT_REGION_API_ROOT.to_string()),
        )?;

        let http_timeout = get("HTTP_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        // A file (the persisted sign-in) wins over a fixed id.
        let identity = match (get("IDENTITY_FILE"), get("USER_ID")) {
            (Some(path), _) if !path.trim().is_empty() => IdentitySource::File(path.into()),
            (_, Some(id)) if !id.trim().is_empty() => IdentitySource::Fixed(id.trim().to_string()),
            _ => return Err(ConfigError::Missing("IDENTITY_FILE or USER_ID")),
        };

        let notification_capacity = get("NOTIFICATION_CAPACITY")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(50);

        Ok(Self {
            addr,
            app_env,
            employee_api_root,
            employee_api_token,
            region_api_root,
            http_timeout,
            identity,
            notification_capacity,
        })
    }
}
