use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    /// JSON dataset snapshot seeding the in-memory store; the demo data when unset.
    pub dataset_path: Option<PathBuf>,
    pub geocoder: GeocoderConfig,
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
        let dataset_path = optional_var("APP_DATASET_PATH").map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            dataset_path,
            geocoder: GeocoderConfig::load()?,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSeconds { variable: name }),
        None => Ok(default),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderProvider {
    Nominatim,
    Google,
    /// Built-in address table, no network access.
    Static,
}

impl GeocoderProvider {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nominatim" | "osm" => Ok(Self::Nominatim),
            "google" => Ok(Self::Google),
            "static" | "offline" => Ok(Self::Static),
            _ => Err(ConfigError::UnknownGeocoder {
                value: value.to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Nominatim => "nominatim",
            Self::Google => "google",
            Self::Static => "static",
        }
    }
}

/// Which geocoding backend to call and how.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
    /// `None` disables caching.
    pub cache_ttl: Option<Duration>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::Nominatim,
            api_key: None,
            base_url: None,
            user_agent: "open-advocacy-platform".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: None,
        }
    }
}

impl GeocoderConfig {
    fn load() -> Result<Self, ConfigError> {
        let provider = match optional_var("GEOCODER_PROVIDER") {
            Some(value) => GeocoderProvider::parse(&value)?,
            None => GeocoderProvider::Nominatim,
        };
        let api_key = optional_var("GEOCODER_API_KEY");
        if provider == GeocoderProvider::Google && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        let timeout = seconds_var("GEOCODER_TIMEOUT_SECS", 10)?;
        if timeout == 0 {
            return Err(ConfigError::InvalidSeconds {
                variable: "GEOCODER_TIMEOUT_SECS",
            });
        }
        let cache_ttl = seconds_var("GEOCODER_CACHE_TTL_SECS", 0)?;

        Ok(Self {
            provider,
            api_key,
            base_url: optional_var("GEOCODER_BASE_URL"),
            user_agent: optional_var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|| "open-advocacy-platform".to_string()),
            timeout: Duration::from_secs(timeout),
            cache_ttl: (cache_ttl > 0).then(|| Duration::from_secs(cache_ttl)),
        })
    }

    /// Offline configuration used by the demo and tests.
    pub fn offline() -> Self {
        Self {
            provider: GeocoderProvider::Static,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownGeocoder { value: String },
    MissingApiKey,
    InvalidSeconds { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownGeocoder { value } => write!(
                f,
                "GEOCODER_PROVIDER '{}' is not one of nominatim, google, static",
                value
            ),
            ConfigError::MissingApiKey => {
                write!(f, "GEOCODER_API_KEY is required for the google geocoder")
            }
            ConfigError::InvalidSeconds { variable } => {
                write!(f, "{variable} must be a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::UnknownGeocoder { .. }
            | ConfigError::MissingApiKey
            | ConfigError::InvalidSeconds { .. } => None,
        }
    }
}
