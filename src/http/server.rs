//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Hand every request, whatever its path or method, to the dispatcher
//! - Start health monitoring and the admin API when enabled
//! - Graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ProxyConfig;
use crate::health::HealthMonitor;
use crate::http::client::build_upstream_client;
use crate::http::request::{self, UuidRequestId, X_REQUEST_ID};
use crate::load_balancer::{BackendPool, DispatchError, Dispatcher};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub admin_api_key: Arc<str>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
    pool: Option<BackendPool>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the configured pool is empty or contains an invalid address.
    pub fn new(config: ProxyConfig) -> Result<Self, DispatchError> {
        let pool = BackendPool::from_config(&config)?;
        let dispatcher = Arc::new(pool.dispatcher()?);
        Ok(Self::assemble(config, dispatcher, Some(pool)))
    }

    /// Create a server around an existing dispatcher.
    ///
    /// Active health checks are not started since the backends are not
    /// known to be HTTP backends.
    pub fn with_dispatcher(config: ProxyConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self::assemble(config, dispatcher, None)
    }

    fn assemble(config: ProxyConfig, dispatcher: Arc<Dispatcher>, pool: Option<BackendPool>) -> Self {
        let state = AppState {
            dispatcher,
            admin_api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id)),
            )
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        if let Some(pool) = &self.pool {
            if self.config.health_check.enabled {
                let monitor = HealthMonitor::new(
                    pool.backends().to_vec(),
                    self.config.health_check.clone(),
                    build_upstream_client(&self.config.timeouts),
                );
                tokio::spawn(monitor.run(shutdown.resubscribe()));
            }
        }

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");

            let admin = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin server failed");
                }
            });
        }

        tracing::info!(
            address = %addr,
            backends = self.state.dispatcher.len(),
            "Serving requests"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The dispatcher serving this server's requests.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.state.dispatcher
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(&request).to_string();
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    let response = match state.dispatcher.dispatch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Dispatch failed");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
