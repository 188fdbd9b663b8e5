//! HTTP server for the daemon.
//!
//! Startup runs in three phases and any failure is fatal:
//!
//! ```text
//!   ProviderRegistry::discover_and_initialize   →  ProviderSet
//!   RouteComposer::compose(paths::namespace())  →  Router
//!   bind(host, port)                            →  serve until Ctrl-C
//! ```

use std::io::ErrorKind;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::error::StartupError;
use crate::paths;
use crate::providers::ProviderRegistry;
use crate::routes::RouteComposer;

/// Discover providers, compose the routes, bind and serve.
pub async fn run(config: DaemonConfig) -> Result<(), StartupError> {
    let providers = ProviderRegistry::with_defaults()
        .discover_and_initialize(&config)
        .await?;

    let routes = RouteComposer::compose(paths::namespace(), &providers)?;
    for mount in routes.mounts() {
        info!("  {:<12} → {}", mount.prefix, mount.handler);
    }

    let listener = bind(&config.host, config.port).await?;
    let port = listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(StartupError::Listen)?;
    info!("Daemon running on http://{}:{}", config.host, port);

    serve(listener, app_router(routes.into_router())).await
}

/// Wrap the composed routes with the transport layers.
pub fn app_router(routes: Router) -> Router {
    routes
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listening socket. An occupied port is reported as
/// [`StartupError::PortInUse`].
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, StartupError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AddrInUse => StartupError::PortInUse {
                host: host.to_string(),
                port,
            },
            _ => StartupError::Listen(e),
        })
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), StartupError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Listen)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections"),
        Err(e) => {
            warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
