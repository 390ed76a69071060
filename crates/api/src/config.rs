//! Application configuration loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use common::Deployment;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// How the listen port was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSource {
    /// Taken from `PORT`.
    Env,
    /// `PORT` was unset, so the deployment default applies.
    Default,
    /// `PORT` was set but this deployment always uses its default.
    Ignored(String),
    /// `PORT` was not a valid port number, so the deployment default applies.
    Invalid(String),
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DEPLOYMENT`: deployment variant (default: `local`)
/// - `HOST`: bind address (default: `0.0.0.0`)
/// - `PORT`: listen port, honoured by every variant except `local`
///   (default: the deployment's port, 4000 or 5000)
/// - `RUST_LOG`: tracing filter directive (default: `info`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `METRICS_PORT`: Prometheus exporter port (default: disabled)
///
/// Empty values are treated as unset.
#[derive(Debug, Clone)]
pub struct Config {
    pub deployment: Deployment,
    pub host: IpAddr,
    pub port: u16,
    pub port_source: PortSource,
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let deployment: Deployment = match var("DEPLOYMENT") {
            Some(raw) => raw.parse()?,
            None => Deployment::default(),
        };

        let host: IpAddr = match var("HOST") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidHost(raw))?,
            None => DEFAULT_HOST,
        };

        let (port, port_source) = resolve_port(deployment, var("PORT"));

        let log_format: LogFormat = match var("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let metrics_port = var("METRICS_PORT")
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidMetricsPort(raw))
            })
            .transpose()?;

        let config = Self {
            deployment,
            host,
            port,
            port_source,
            log_level: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format,
            metrics_port,
        };
        config.env_filter()?;
        Ok(config)
    }

    /// Default configuration for the given deployment.
    pub fn for_deployment(deployment: Deployment) -> Self {
        Self {
            deployment,
            host: DEFAULT_HOST,
            port: deployment.default_port(),
            port_source: PortSource::Default,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }

    /// Returns the socket address the API listens on.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the Prometheus exporter address, if enabled.
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_port.map(|port| SocketAddr::new(self.host, port))
    }

    /// Parses `log_level` into a tracing filter.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_level).map_err(|err| ConfigError::InvalidLogLevel {
            value: self.log_level.clone(),
            reason: err.to_string(),
        })
    }

    /// Checks constraints between fields that loading alone cannot catch.
    ///
    /// The API and the metrics exporter share `host`, so they need distinct
    /// ports. Port 0 never conflicts since the OS picks a free port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.metrics_port {
            Some(port) if port != 0 && port == self.port => {
                Err(ConfigError::MetricsPortConflict(port))
            }
            _ => Ok(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_deployment(Deployment::default())
    }
}

fn resolve_port(deployment: Deployment, raw: Option<String>) -> (u16, PortSource) {
    let default = deployment.default_port();
    match raw {
        None => (default, PortSource::Default),
        Some(raw) if !deployment.reads_port_env() => (default, PortSource::Ignored(raw)),
        Some(raw) => match raw.trim().parse::<u16>() {
            Ok(port) => (port, PortSource::Env),
            Err(_) => (default, PortSource::Invalid(raw)),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.deployment, Deployment::Local);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, 4000);
        assert_eq!(config.port_source, PortSource::Default);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.metrics_port, None);
    }

    #[test]
    fn test_empty_environment_matches_default() {
        let config = load(&[]).unwrap();
        assert_eq!(config.deployment, Deployment::Local);
        assert_eq!(config.addr(), Config::default().addr());
    }

    #[test]
    fn test_addr_formatting() {
        let config = load(&[("HOST", "127.0.0.1"), ("DEPLOYMENT", "docker"), ("PORT", "8080")])
            .unwrap();
        assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        assert_eq!(Config::default().addr().to_string(), "0.0.0.0:4000");
    }

    #[test]
    fn test_port_from_env() {
        let config = load(&[("DEPLOYMENT", "cloud-run"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.port_source, PortSource::Env);
    }

    #[test]
    fn test_port_defaults_to_5000_for_env_variants() {
        for name in ["docker", "cloud-build", "cloud-run"] {
            let config = load(&[("DEPLOYMENT", name)]).unwrap();
            assert_eq!(config.port, 5000, "{name}");
            assert_eq!(config.port_source, PortSource::Default);
        }
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let config = load(&[("DEPLOYMENT", "docker"), ("PORT", "eighty")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.port_source, PortSource::Invalid("eighty".to_string()));

        let config = load(&[("DEPLOYMENT", "docker"), ("PORT", "70000")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.port_source, PortSource::Invalid("70000".to_string()));
    }

    #[test]
    fn test_local_ignores_port() {
        let config = load(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.port_source, PortSource::Ignored("8080".to_string()));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[("DEPLOYMENT", "  "), ("PORT", ""), ("HOST", "")]).unwrap();
        assert_eq!(config.deployment, Deployment::Local);
        assert_eq!(config.port_source, PortSource::Default);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_unknown_deployment_is_error() {
        let err = load(&[("DEPLOYMENT", "heroku")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDeployment(_)));
    }

    #[test]
    fn test_invalid_host_is_error() {
        let err = load(&[("HOST", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost(ref h) if h == "localhost"));
    }

    #[test]
    fn test_log_settings() {
        let config = load(&[("RUST_LOG", "api=debug"), ("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(config.log_level, "api=debug");
        assert_eq!(config.log_format, LogFormat::Json);

        let err = load(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(_)));
    }

    #[test]
    fn test_invalid_log_level_is_error() {
        let err = load(&[("RUST_LOG", "api=verbose")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidLogLevel { ref value, .. } if value == "api=verbose"
        ));

        let config = Config {
            log_level: "api=verbose".to_string(),
            ..Config::default()
        };
        assert!(config.env_filter().is_err());
        assert!(Config::default().env_filter().is_ok());
    }

    #[test]
    fn test_validate_rejects_shared_port() {
        let config = load(&[
            ("DEPLOYMENT", "docker"),
            ("PORT", "9100"),
            ("METRICS_PORT", "9100"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MetricsPortConflict(9100)));

        let config =
            load(&[("DEPLOYMENT", "docker"), ("PORT", "0"), ("METRICS_PORT", "0")]).unwrap();
        assert!(config.validate().is_ok());

        let config = load(&[("METRICS_PORT", "9100")]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_port() {
        let config = load(&[("HOST", "127.0.0.1"), ("METRICS_PORT", "9100")]).unwrap();
        assert_eq!(config.metrics_port, Some(9100));
        assert_eq!(config.metrics_addr().unwrap().to_string(), "127.0.0.1:9100");

        let err = load(&[("METRICS_PORT", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMetricsPort(_)));
    }
}
