//! Web layer module
//!
//! HTTP boundary in front of the resolver.
//!
//! # Routes
//!
//! - `GET /favicon`: resolved icon bytes, `400` JSON on invalid parameters
//! - `GET /favicon/preview`: JSON with the icon as a `data:` URL and the
//!   shareable API URL for the same parameters
//! - `OPTIONS /favicon`: `200` with an empty body
//! - any other method on `/favicon`: `405` JSON
//! - `GET /health`: status and cache counters
//!
//! CORS headers permitting any origin are added to every response.

use anyhow::Result;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{config::Config, services::FaviconResolver};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{ApiResponse, handle_error};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, resolver: Arc<FaviconResolver>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = Self::create_router(AppState {
            config: Arc::new(config),
            resolver,
        });

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/favicon/preview", get(handlers::favicon::preview_favicon))
            .route(
                "/favicon",
                get(handlers::favicon::get_favicon)
                    .options(handlers::favicon::favicon_preflight)
                    .fallback(handlers::favicon::favicon_method_not_allowed),
            )
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .with_state(state)
    }

    /// Serve with a notification when the server is actually listening or fails to bind
    pub async fn serve_with_signal(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
    ) -> Result<()> {
        self.serve_with_cancellation(ready_signal, None).await
    }

    /// Serve until `cancellation_token` fires, or until SIGTERM/SIGINT without one
    pub async fn serve_with_cancellation(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
        cancellation_token: Option<tokio_util::sync::CancellationToken>,
    ) -> Result<()> {
        match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => {
                let _ = ready_signal.send(Ok(()));

                let shutdown_signal = async move {
                    match &cancellation_token {
                        Some(token) => {
                            token.cancelled().await;
                            tracing::info!(
                                "Web server received cancellation signal, shutting down gracefully"
                            );
                        }
                        None => wait_for_shutdown_signal().await,
                    }
                };

                axum::serve(listener, self.app)
                    .with_graceful_shutdown(shutdown_signal)
                    .await?;
                Ok(())
            }
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                Err(anyhow::anyhow!("{}", bind_err_msg))
            }
        }
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Received Ctrl+C, shutting down gracefully");
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<FaviconResolver>,
}
