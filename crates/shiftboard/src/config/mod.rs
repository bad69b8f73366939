//! Environment-driven settings. A `.env` file is honoured when present; CLI flags may
//! override the listener afterwards.

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_FINISH_INTERVAL_SECS: u64 = 300;

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub plugins: PluginConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: read("APP_ENV")
                .map_or(AppEnvironment::Development, |raw| AppEnvironment::parse(&raw)),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
            plugins: PluginConfig::from_env(),
            scheduler: SchedulerConfig::from_env()?,
        })
    }
}

/// Non-empty value of an environment variable.
fn read(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = match read("APP_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: read("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    /// Listener address; `localhost` maps to the IPv4 loopback.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    host: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Colour the log output (`APP_LOG_ANSI`).
    pub ansi: bool,
}

impl TelemetryConfig {
    fn from_env() -> Self {
        Self {
            log_level: read("APP_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            ansi: read("APP_LOG_ANSI").is_some_and(|raw| {
                matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
            }),
        }
    }
}

/// Which installed plugins are enabled. `None` enables every installed plugin.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    pub enabled: Option<BTreeSet<String>>,
}

impl PluginConfig {
    fn from_env() -> Self {
        let enabled = read("APP_ENABLED_PLUGINS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        });
        Self { enabled }
    }
}

/// Cadence of the background job that marks elapsed participations as finished.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub finish_interval: Duration,
}

impl SchedulerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secs = match read("APP_FINISH_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidFinishInterval(raw))?,
            None => DEFAULT_FINISH_INTERVAL_SECS,
        };
        Ok(Self {
            finish_interval: Duration::from_secs(secs),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
    InvalidFinishInterval(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(raw) => {
                write!(f, "APP_PORT must be a port number, got '{raw}'")
            }
            ConfigError::InvalidHost { host, .. } => {
                write!(f, "APP_HOST must be an IP address or localhost, got '{host}'")
            }
            ConfigError::InvalidFinishInterval(raw) => write!(
                f,
                "APP_FINISH_INTERVAL_SECS must be a positive number of seconds, got '{raw}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source, .. } => Some(source),
            ConfigError::InvalidPort(_) | ConfigError::InvalidFinishInterval(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

    const VARS: [&str; 7] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "APP_LOG_ANSI",
        "APP_ENABLED_PLUGINS",
        "APP_FINISH_INTERVAL_SECS",
    ];

    /// Serializes tests touching the process environment and starts each from a clean slate.
    fn clean_env() -> MutexGuard<'static, ()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        let guard = GUARD
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for name in VARS {
            env::remove_var(name);
        }
        guard
    }

    #[test]
    fn defaults_apply_without_environment() {
        let _env = clean_env();

        let config = AppConfig::load().expect("defaults load");

        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.telemetry.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.telemetry.ansi);
        assert!(config.plugins.enabled.is_none());
        assert_eq!(config.scheduler.finish_interval, Duration::from_secs(300));
    }

    #[test]
    fn localhost_binds_the_loopback() {
        let _env = clean_env();
        env::set_var("APP_HOST", "LocalHost");
        env::set_var("APP_PORT", "8081");

        let addr = AppConfig::load()
            .expect("config loads")
            .server
            .socket_addr()
            .expect("address resolves");

        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 8081)));
    }

    #[test]
    fn unparsable_host_is_reported_when_binding() {
        let _env = clean_env();
        env::set_var("APP_HOST", "shifts.internal");

        let config = AppConfig::load().expect("host is not checked on load");

        assert!(matches!(
            config.server.socket_addr(),
            Err(ConfigError::InvalidHost { ref host, .. }) if host == "shifts.internal"
        ));
    }

    #[test]
    fn enabled_plugin_list_skips_blank_entries() {
        let _env = clean_env();
        env::set_var("APP_ENABLED_PLUGINS", " guests, ,basesignup ");

        let enabled = AppConfig::load()
            .expect("config loads")
            .plugins
            .enabled
            .expect("plugin list parsed");

        assert_eq!(
            enabled.into_iter().collect::<Vec<_>>(),
            vec!["basesignup".to_string(), "guests".to_string()]
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let _env = clean_env();
        env::set_var("APP_PORT", "70000");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPort(raw)) if raw == "70000"
        ));

        env::remove_var("APP_PORT");
        env::set_var("APP_FINISH_INTERVAL_SECS", "0");
        let error = AppConfig::load().expect_err("zero interval");
        assert!(error.to_string().contains("APP_FINISH_INTERVAL_SECS"));
    }
}
