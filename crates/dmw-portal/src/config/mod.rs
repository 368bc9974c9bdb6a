use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::direct_hire::control_number::parse_control_number;

/// Files larger than this are rejected before they reach document storage.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

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

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub documents: DocumentPolicyConfig,
    pub salary: SalaryConfig,
    pub control_numbers: ControlNumberConfig,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        let max_upload_bytes = match env::var("APP_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidUploadLimit(raw))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let usd_rates = match env::var("APP_USD_RATES") {
            Ok(raw) => parse_rates(&raw)?,
            Err(_) => BTreeMap::new(),
        };

        let last_issued = match env::var("APP_LAST_CONTROL_NUMBER") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => match parse_control_number(&raw) {
                Some(_) => Some(raw.trim().to_string()),
                None => return Err(ConfigError::InvalidControlNumber(raw)),
            },
            Err(_) => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            documents: DocumentPolicyConfig { max_upload_bytes },
            salary: SalaryConfig { usd_rates },
            control_numbers: ControlNumberConfig { last_issued },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Upload limits applied by the document tracker and the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPolicyConfig {
    pub max_upload_bytes: u64,
}

impl Default for DocumentPolicyConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Overrides for the USD exchange table, keyed by ISO currency code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalaryConfig {
    pub usd_rates: BTreeMap<String, f64>,
}

/// Where control numbering picks up after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlNumberConfig {
    /// Most recently issued control number, if numbering should continue from it.
    pub last_issued: Option<String>,
}

fn parse_rates(raw: &str) -> Result<BTreeMap<String, f64>, ConfigError> {
    let mut rates = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (code, rate) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidRate(pair.to_string()))?;
        let rate = rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| ConfigError::InvalidRate(pair.to_string()))?;
        rates.insert(code.trim().to_ascii_uppercase(), rate);
    }
    Ok(rates)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidUploadLimit(String),
    InvalidRate(String),
    InvalidControlNumber(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty', found '{value}'")
            }
            ConfigError::InvalidUploadLimit(value) => {
                write!(f, "APP_MAX_UPLOAD_BYTES must be a positive integer, found '{value}'")
            }
            ConfigError::InvalidRate(value) => {
                write!(f, "APP_USD_RATES entry '{value}' must look like CODE=RATE")
            }
            ConfigError::InvalidControlNumber(value) => write!(
                f,
                "APP_LAST_CONTROL_NUMBER must look like DHPSW-ROIVA-YYYY-MMDD-DDD-YYY, found '{value}'"
            ),
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
