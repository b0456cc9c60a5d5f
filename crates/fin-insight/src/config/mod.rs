use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://fin-pltform.onrender.com";
pub const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub inference: InferenceConfig,
    pub identity: IdentityConfig,
    pub presentation: PresentationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout = match env::var("INFERENCE_TIMEOUT_SECS") {
            Ok(raw) if !raw.trim().is_empty() => Some(Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout { value: raw.clone() })?,
            )),
            _ => None,
        };

        let inference = InferenceConfig {
            base_url: env::var("INFERENCE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_BASE_URL.to_string()),
            loan_path: env::var("LOAN_PREDICT_PATH").unwrap_or_else(|_| "/predict".to_string()),
            segment_path: env::var("SEGMENT_PATH").unwrap_or_else(|_| "/segment".to_string()),
            timeout,
        };

        let backend = IdentityBackend::parse(
            &env::var("IDENTITY_BACKEND").unwrap_or_else(|_| "memory".to_string()),
        )?;
        let api_key = env::var("FIREBASE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
        if backend == IdentityBackend::Firebase && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        let identity = IdentityConfig {
            backend,
            api_key,
            auth_url: env::var("FIREBASE_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_FIREBASE_AUTH_URL.to_string()),
        };

        let presentation = PresentationConfig {
            catalog_path: env::var("SEGMENT_CATALOG_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            inference,
            identity,
            presentation,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the two remote models live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub base_url: String,
    pub loan_path: String,
    pub segment_path: String,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl InferenceConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            loan_path: "/predict".to_string(),
            segment_path: "/segment".to_string(),
            timeout: None,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_INFERENCE_BASE_URL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Memory,
    Firebase,
}

impl IdentityBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "firebase" => Ok(Self::Firebase),
            _ => Err(ConfigError::UnknownIdentityBackend {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub backend: IdentityBackend,
    pub api_key: Option<SecretString>,
    pub auth_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct PresentationConfig {
    /// JSON segment catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { value: String },
    UnknownIdentityBackend { value: String },
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "INFERENCE_TIMEOUT_SECS must be a whole number of seconds (got '{value}')"
            ),
            ConfigError::UnknownIdentityBackend { value } => write!(
                f,
                "IDENTITY_BACKEND must be 'memory' or 'firebase' (got '{value}')"
            ),
            ConfigError::MissingApiKey => {
                write!(f, "FIREBASE_API_KEY is required when IDENTITY_BACKEND=firebase")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "INFERENCE_BASE_URL",
            "LOAN_PREDICT_PATH",
            "SEGMENT_PATH",
            "INFERENCE_TIMEOUT_SECS",
            "IDENTITY_BACKEND",
            "FIREBASE_API_KEY",
            "FIREBASE_AUTH_URL",
            "SEGMENT_CATALOG_PATH",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.inference, InferenceConfig::default());
        assert_eq!(config.identity.backend, IdentityBackend::Memory);
        assert!(config.presentation.catalog_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn firebase_backend_requires_api_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("IDENTITY_BACKEND", "firebase");
        let err = AppConfig::load().expect_err("api key is mandatory");
        assert!(matches!(err, ConfigError::MissingApiKey));

        env::set_var("FIREBASE_API_KEY", "test-key");
        let config = AppConfig::load().expect("config loads with key");
        assert_eq!(config.identity.backend, IdentityBackend::Firebase);
        assert!(config.identity.api_key.is_some());
        reset_env();
    }

    #[test]
    fn timeout_is_optional_but_validated() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("INFERENCE_TIMEOUT_SECS", "45");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.inference.timeout, Some(Duration::from_secs(45)));

        env::set_var("INFERENCE_TIMEOUT_SECS", "soon");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        reset_env();
    }
}
