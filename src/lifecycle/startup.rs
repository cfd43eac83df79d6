//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble configuration from file, CLI overrides and defaults
//! - Build the backend pool (fatal on empty or malformed pool)
//! - Start background tasks (metrics)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{
    default_backends, read_config, validate_config, BackendConfig, ConfigError, ListenerConfig,
    LogFormat, ProxyConfig,
};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::DispatchError;
use crate::observability::metrics;

/// Fatal errors raised before the proxy starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backend pool error: {0}")]
    Pool(#[from] DispatchError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub backends: Vec<String>,
    pub json_logs: bool,
}

/// Build the effective configuration.
///
/// Backends given on the command line replace those in the file. Without a
/// config file and without `--backend`, the built-in default pool is used.
pub fn resolve_config(overrides: &Overrides) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &overrides.config_path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if !overrides.backends.is_empty() {
        config.backends = overrides.backends.iter().map(BackendConfig::new).collect();
    } else if overrides.config_path.is_none() {
        config.backends = default_backends();
    }
    if let Some(port) = overrides.port {
        config.listener.port = port;
    }
    if overrides.json_logs {
        config.observability.log_format = LogFormat::Json;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Bind the public listener.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Start the proxy and serve until `shutdown` is triggered.
pub async fn run(config: ProxyConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        port = config.listener.port,
        backends = config.backends.len(),
        health_checks = config.health_check.enabled,
        "Configuration loaded"
    );

    let metrics_address = if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .map_err(|e| StartupError::Metrics(e.to_string()))?;
        Some(addr)
    } else {
        None
    };

    let listener_config = config.listener.clone();
    let server = HttpServer::new(config)?;

    if let Some(addr) = metrics_address {
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let listener = bind(&listener_config).await?;
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config(&Overrides::default()).unwrap();
        assert_eq!(config.listener.port, 8009);
        assert_eq!(config.backends, default_backends());
    }

    #[test]
    fn test_cli_overrides() {
        let overrides = Overrides {
            port: Some(9100),
            backends: vec!["http://127.0.0.1:7001".into(), "http://127.0.0.1:7002".into()],
            json_logs: true,
            ..Overrides::default()
        };
        let config = resolve_config(&overrides).unwrap();
        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].address, "http://127.0.0.1:7002");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_cli_backend_rejected() {
        let overrides = Overrides {
            backends: vec!["127.0.0.1:7001".into()],
            ..Overrides::default()
        };
        assert!(matches!(resolve_config(&overrides), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_file_without_backends_is_rejected() {
        let path = std::env::temp_dir().join(format!("roundrobin-proxy-empty-{}.toml", std::process::id()));
        fs::write(&path, "[listener]\nport = 9200\n").unwrap();

        let overrides = Overrides {
            config_path: Some(path.clone()),
            ..Overrides::default()
        };
        let result = resolve_config(&overrides);
        fs::remove_file(&path).unwrap();

        match result {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![crate::config::ValidationError::NoBackends]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_pool() {
        let mut config = ProxyConfig::default();
        config.listener.host = "127.0.0.1".to_string();
        config.listener.port = 0;

        let err = run(config, &Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Pool(DispatchError::EmptyPool)));
    }
}
