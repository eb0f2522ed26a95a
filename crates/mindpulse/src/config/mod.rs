use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_GENERATOR_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
const DEFAULT_GENERATOR_MODEL: &str = "google/gemini-2.5-flash";

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
    pub generator: GeneratorConfig,
    pub nudges: NudgeConfig,
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

        let endpoint = env::var("GENERATOR_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_GENERATOR_ENDPOINT.to_string());
        let api_key = env::var("GENERATOR_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let model =
            env::var("GENERATOR_MODEL").unwrap_or_else(|_| DEFAULT_GENERATOR_MODEL.to_string());
        let timeout_secs = env::var("GENERATOR_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidGeneratorTimeout)?;

        let unread_cap = env::var("NUDGE_UNREAD_CAP")
            .unwrap_or_else(|_| NudgeConfig::DEFAULT_UNREAD_CAP.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidUnreadCap)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            generator: GeneratorConfig {
                endpoint,
                api_key,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
            nudges: NudgeConfig { unread_cap },
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

/// Connection settings for the chat-completions endpoint that phrases nudges and replies.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Limits applied by the nudge batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeConfig {
    pub unread_cap: usize,
}

impl NudgeConfig {
    pub const DEFAULT_UNREAD_CAP: usize = 5;
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            unread_cap: Self::DEFAULT_UNREAD_CAP,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidGeneratorTimeout,
    InvalidUnreadCap,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidGeneratorTimeout => {
                write!(f, "GENERATOR_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidUnreadCap => {
                write!(f, "NUDGE_UNREAD_CAP must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidGeneratorTimeout
            | ConfigError::InvalidUnreadCap => None,
        }
    }
}
