//! dockyard daemon binary.
//!
//! # Environment Variables
//!
//! - `PORT`: HTTP port (default: 3000; invalid values fall back to it)
//! - `HOST`: Bind host (default: localhost)
//! - `DOCKYARD_CONFIG`: TOML config file (default: `dockyard.toml` if present)
//! - `DOCKYARD_DOCKER_SOCKET`: Docker Engine socket (default: /var/run/docker.sock)
//! - `RUST_LOG`: Tracing filter (default: "info,dockyard=debug")

use dockyard::{server, DaemonConfig, StartupError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dockyard=debug".into()),
        )
        .init();

    if let Err(e) = start().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn start() -> Result<(), StartupError> {
    let config = DaemonConfig::load()?;
    tracing::info!(
        "{} {} starting (docker socket {})",
        dockyard::SERVICE_NAME,
        dockyard::VERSION,
        config.docker_socket
    );
    server::run(config).await
}
