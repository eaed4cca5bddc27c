use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
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
    pub messaging: MessagingConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            messaging: MessagingConfig::load()?,
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
}

/// Connection settings for the WhatsApp gateway.
///
/// The gateway authenticates with a static API key plus a session identifier;
/// one session maps to one connected WhatsApp account, so pacing is applied
/// per session.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub base_url: String,
    pub api_key: String,
    pub session_id: String,
    pub send_delay: Duration,
    pub request_timeout: Duration,
}

impl MessagingConfig {
    fn load() -> Result<Self, ConfigError> {
        let base_url =
            env::var("WHATSAPP_API_BASE").unwrap_or_else(|_| "http://127.0.0.1:8787".to_string());
        let api_key = env::var("WHATSAPP_API_KEY").unwrap_or_default();
        let session_id = env::var("WHATSAPP_SESSION_ID").unwrap_or_else(|_| "default".to_string());
        let send_delay = duration_ms_var("WHATSAPP_SEND_DELAY_MS", 1_500)?;
        let request_timeout = duration_ms_var("WHATSAPP_REQUEST_TIMEOUT_MS", 10_000)?;

        Ok(Self {
            base_url,
            api_key,
            session_id,
            send_delay,
            request_timeout,
        })
    }
}

fn duration_ms_var(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let millis = match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDuration { name })?,
        Err(_) => default_ms,
    };
    Ok(Duration::from_millis(millis))
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDuration { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { name } => {
                write!(f, "{name} must be a whole number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDuration { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("WHATSAPP_API_BASE");
        env::remove_var("WHATSAPP_API_KEY");
        env::remove_var("WHATSAPP_SESSION_ID");
        env::remove_var("WHATSAPP_SEND_DELAY_MS");
        env::remove_var("WHATSAPP_REQUEST_TIMEOUT_MS");
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
        assert_eq!(config.messaging.session_id, "default");
        assert_eq!(config.messaging.send_delay, Duration::from_millis(1_500));
        assert_eq!(
            config.messaging.request_timeout,
            Duration::from_millis(10_000)
        );
    }

    #[test]
    fn messaging_overrides_are_applied() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WHATSAPP_API_BASE", "https://wa.example.com");
        env::set_var("WHATSAPP_SEND_DELAY_MS", "250");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.messaging.base_url, "https://wa.example.com");
        assert_eq!(config.messaging.send_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WHATSAPP_SEND_DELAY_MS", "soon");
        let err = AppConfig::load().expect_err("non-numeric delay rejected");
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));
    }
}
