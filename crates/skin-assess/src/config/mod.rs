use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_HOSTED_ENDPOINT: &str = "http://127.0.0.1:54321/functions/v1/analyze-face";
const DEFAULT_COMPLETIONS_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_SALES_PAGE_URL: &str = "https://example.com/reversal-protocol";

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

/// Which remote producer the orchestrator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Hosted analysis function that already returns an assessment payload.
    Hosted,
    /// Direct call to a vision chat-completions endpoint with a user-supplied credential.
    Direct,
}

impl AnalysisMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hosted" | "function" => Ok(Self::Hosted),
            "direct" | "vision" => Ok(Self::Direct),
            other => Err(ConfigError::InvalidAnalysisMode(other.to_string())),
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Self::Hosted => DEFAULT_HOSTED_ENDPOINT,
            Self::Direct => DEFAULT_COMPLETIONS_ENDPOINT,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub analysis: AnalysisConfig,
    pub funnel: FunnelConfig,
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

        let mode = match env::var("APP_ANALYSIS_MODE") {
            Ok(raw) => AnalysisMode::parse(&raw)?,
            Err(_) => AnalysisMode::Hosted,
        };
        let endpoint = env::var("APP_ANALYSIS_ENDPOINT")
            .unwrap_or_else(|_| mode.default_endpoint().to_string());
        let api_key = env::var("APP_ANALYSIS_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if mode == AnalysisMode::Direct && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        let model = env::var("APP_ANALYSIS_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let timeout_secs = positive_number("APP_ANALYSIS_TIMEOUT_SECS", 45)?;

        let sales_page_url =
            env::var("APP_SALES_PAGE_URL").unwrap_or_else(|_| DEFAULT_SALES_PAGE_URL.to_string());
        let session_idle_minutes = positive_number("APP_SESSION_IDLE_MINUTES", 60)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analysis: AnalysisConfig {
                mode,
                endpoint,
                api_key,
                model,
                timeout_secs,
            },
            funnel: FunnelConfig {
                sales_page_url,
                session_idle_minutes,
            },
        })
    }
}

fn positive_number(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::NotPositive(var))?,
        Err(_) => default,
    };
    if value == 0 {
        return Err(ConfigError::NotPositive(var));
    }
    Ok(value)
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
}

/// Remote analysis endpoint settings.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Funnel page settings.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub sales_page_url: String,
    pub session_idle_minutes: u64,
}

impl FunnelConfig {
    /// Idle window after which a session's handoff data is discarded, capped at a year.
    pub fn session_idle_timeout(&self) -> chrono::Duration {
        const MAX_IDLE_MINUTES: i64 = 60 * 24 * 365;
        let minutes = i64::try_from(self.session_idle_minutes)
            .unwrap_or(MAX_IDLE_MINUTES)
            .min(MAX_IDLE_MINUTES);
        chrono::Duration::minutes(minutes)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAnalysisMode(String),
    MissingApiKey,
    NotPositive(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAnalysisMode(value) => write!(
                f,
                "APP_ANALYSIS_MODE must be 'hosted' or 'direct' (got '{}')",
                value
            ),
            ConfigError::MissingApiKey => {
                write!(f, "APP_ANALYSIS_API_KEY is required when APP_ANALYSIS_MODE=direct")
            }
            ConfigError::NotPositive(var) => write!(f, "{} must be a positive integer", var),
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
