//! Application configuration
//!
//! Layered the usual way: built-in defaults, then an optional `config.toml`
//! in the working directory, then environment variables. Environment
//! variables are read without a prefix (`CORS_ORIGINS`, `AUTH_TOKEN`,
//! `RATE_LIMIT_POINTS`, ...) and map one-to-one onto the fields below.

use std::{collections::HashMap, fmt, time::Duration};

use config::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Application environment (development or production)
///
/// Development enables pretty-printed JSON on request (`?pretty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Production environment
    Production,
}

impl Environment {
    /// Check if running in production
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl TryFrom<String> for LogFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid log format: {value}. Use 'text' or 'json'")),
        }
    }
}

/// Raw allowed-origins setting, as found in the environment or config file
///
/// Environment variables always arrive as text (comma list or a JSON array
/// literal); a TOML file may also give a real list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CorsOrigins {
    List(Vec<String>),
    Text(String),
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application environment (`APP_ENV`)
    #[serde(default)]
    pub app_env: Environment,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log format: "json" for structured JSON logs, "text" for human-readable
    #[serde(default)]
    pub log_format: LogFormat,

    /// Value of the `X-Powered-By` response header
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Request-wide timeout in seconds (unset = no timeout)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Allowed CORS origins (unset = any origin, without credentials)
    #[serde(default)]
    pub cors_origins: Option<CorsOrigins>,

    /// Bearer secret for the protected path prefix
    ///
    /// When unset, every request under the prefix is rejected.
    #[serde(default)]
    pub auth_token: Option<SecretString>,

    /// Path prefix guarded by the bearer gate
    #[serde(default = "default_auth_path_prefix")]
    pub auth_path_prefix: String,

    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,

    /// Requests allowed per window per client
    #[serde(default = "default_rate_limit_points")]
    pub rate_limit_points: u32,

    /// Rate limit window length in seconds
    #[serde(default = "default_rate_limit_duration")]
    pub rate_limit_duration: u64,

    /// How often expired rate limit buckets are swept, in seconds (0 = never)
    #[serde(default = "default_rate_limit_sweep")]
    pub rate_limit_sweep_secs: u64,
}

const fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_server_name() -> String {
    "API Starter".to_string()
}

const fn default_shutdown_timeout() -> u64 {
    30
}

fn default_auth_path_prefix() -> String {
    "/api/v1/auth".to_string()
}

const fn default_rate_limit_points() -> u32 {
    100
}

const fn default_rate_limit_duration() -> u64 {
    60
}

const fn default_rate_limit_sweep() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_env: Environment::default(),
            host: default_host(),
            port: default_port(),
            log_format: LogFormat::default(),
            server_name: default_server_name(),
            request_timeout_secs: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
            cors_origins: None,
            auth_token: None,
            auth_path_prefix: default_auth_path_prefix(),
            rate_limit_enabled: true,
            rate_limit_points: default_rate_limit_points(),
            rate_limit_duration: default_rate_limit_duration(),
            rate_limit_sweep_secs: default_rate_limit_sweep(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` (optional) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an explicit set of environment variables
    ///
    /// Used by tests and tooling that must not read the real process environment.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default().source(Some(vars)))
            .build()?
            .try_deserialize()
    }

    /// The configured bearer secret, if one is set and non-empty
    #[must_use]
    pub fn auth_token(&self) -> Option<&SecretString> {
        self.auth_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())
    }

    /// Rate limit window as a duration
    #[must_use]
    pub const fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_duration)
    }

    /// Request timeout as a duration, if configured
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Socket address string to bind to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> AppConfig {
        let map = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_env_map(map).unwrap()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = from_vars(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit_points, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.auth_path_prefix, "/api/v1/auth");
        assert!(config.cors_origins.is_none());
        assert!(config.auth_token().is_none());
        assert_eq!(config.app_env, Environment::Development);
    }

    #[test]
    fn environment_variables_override_defaults() {
        let config = from_vars(&[
            ("RATE_LIMIT_POINTS", "5"),
            ("RATE_LIMIT_DURATION", "10"),
            ("PORT", "8080"),
            ("APP_ENV", "Production"),
            ("LOG_FORMAT", "json"),
        ]);
        assert_eq!(config.rate_limit_points, 5);
        assert_eq!(config.rate_limit_duration, 10);
        assert_eq!(config.port, 8080);
        assert!(config.app_env.is_production());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn cors_origins_arrive_as_text() {
        let config = from_vars(&[("CORS_ORIGINS", "https://a.com, https://b.com")]);
        assert_eq!(
            config.cors_origins,
            Some(CorsOrigins::Text("https://a.com, https://b.com".to_string()))
        );
    }

    #[test]
    fn auth_token_is_read_as_secret() {
        let config = from_vars(&[("AUTH_TOKEN", "s3cret")]);
        let token = config.auth_token().unwrap();
        assert_eq!(token.expose_secret(), "s3cret");
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn empty_auth_token_counts_as_unset() {
        let config = from_vars(&[("AUTH_TOKEN", "")]);
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn zero_timeout_disables_timeout() {
        let config = from_vars(&[("REQUEST_TIMEOUT_SECS", "0")]);
        assert!(config.request_timeout().is_none());

        let config = from_vars(&[("REQUEST_TIMEOUT_SECS", "15")]);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn invalid_environment_name_is_an_error() {
        let map = HashMap::from([("APP_ENV".to_string(), "staging".to_string())]);
        assert!(AppConfig::from_env_map(map).is_err());
    }

    #[test]
    fn environment_parsing_accepts_short_names() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn toml_list_of_origins_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "cors_origins = [\"https://a.com\", \"https://b.com\"]\n",
        )
        .unwrap();

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            config.cors_origins,
            Some(CorsOrigins::List(vec![
                "https://a.com".to_string(),
                "https://b.com".to_string()
            ]))
        );
    }
}
