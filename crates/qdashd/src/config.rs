use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use clap::Parser;
use qdash_api::{HttpConfig, MAX_REQUEST_BODY_BYTES};
use qdash_core::AggregatorConfig;
use qdash_observe::{LoggerConfig, LoggerError, LoggerFormat};
use thiserror::Error;

/// qdash - backend of the task queue dashboard
///
/// Tasks live in an in-memory store that starts empty and is lost on exit.
/// It stands in until a broker-backed task store is wired in, so the task
/// endpoints answer 404 for every queue until tasks are added by code.
#[derive(Parser, Debug)]
#[command(name = "qdashd")]
#[command(author, version, about)]
pub struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "QDASH_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// Base address of the Prometheus server, e.g. http://localhost:9090
    #[arg(long, env = "PROMETHEUS_ADDR")]
    prometheus_addr: Option<String>,

    /// Reject every request that is not a GET
    #[arg(long, env = "READ_ONLY")]
    read_only: bool,

    /// Maximum size of a batch request body in bytes
    #[arg(long, default_value_t = MAX_REQUEST_BODY_BYTES, env = "QDASH_MAX_REQUEST_BODY_BYTES")]
    max_request_body_bytes: usize,

    /// Timeout of a single Prometheus query in milliseconds
    #[arg(long, default_value_t = 10_000, env = "QDASH_FETCH_TIMEOUT_MS")]
    fetch_timeout_ms: u64,

    /// Expose the dashboard's own metrics on GET /metrics
    #[arg(long, env = "ENABLE_METRICS_EXPORTER")]
    enable_metrics_exporter: bool,

    /// Log level for the dashboard crates (dependencies stay at warn), or a full EnvFilter directive
    #[arg(short, long, default_value = "info", env = "QDASH_LOG_LEVEL")]
    log_level: String,

    /// Log output format (text, json, journald)
    #[arg(long, default_value = "text", env = "QDASH_LOG_FORMAT")]
    log_format: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max request body size must be greater than zero")]
    ZeroBodyLimit,

    #[error("fetch timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid prometheus address {0:?}: expected http:// or https://")]
    InvalidBackendAddress(String),

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error(transparent)]
    Logger(#[from] LoggerError),
}

/// Runtime configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    /// `None` disables `/api/metrics` (503).
    pub prometheus_addr: Option<String>,
    pub read_only: bool,
    pub max_request_body_bytes: usize,
    pub fetch_timeout: Duration,
    pub enable_metrics_exporter: bool,
    pub logger: LoggerConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            prometheus_addr: None,
            read_only: false,
            max_request_body_bytes: MAX_REQUEST_BODY_BYTES,
            fetch_timeout: AggregatorConfig::default().fetch_timeout,
            enable_metrics_exporter: false,
            logger: LoggerConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_request_body_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(addr) = &self.prometheus_addr
            && !(addr.starts_with("http://") || addr.starts_with("https://"))
        {
            return Err(ConfigError::InvalidBackendAddress(addr.clone()));
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::from((ip, self.port)))
    }

    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            read_only: self.read_only,
            max_request_body_bytes: self.max_request_body_bytes,
        }
    }

    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl TryFrom<Args> for DashboardConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let format: LoggerFormat = args.log_format.parse()?;
        let logger = LoggerConfig::default()
            .with_format(format)
            .with_level(args.log_level);

        Ok(Self {
            host: args.host,
            port: args.port,
            prometheus_addr: args
                .prometheus_addr
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            read_only: args.read_only,
            max_request_body_bytes: args.max_request_body_bytes,
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
            enable_metrics_exporter: args.enable_metrics_exporter,
            logger,
        })
    }
}
