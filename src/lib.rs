//! # dockyard
//!
//! A single-host daemon that exposes container and image lifecycle actions
//! over HTTP, delegating the actual work to the local Docker Engine socket.
//!
//! The crate is built from three layers:
//!
//! - [`providers`]: capability providers (the Docker facade is the only one)
//!   and the registry that constructs and initializes them at startup.
//! - [`routes`]: the route namespace tree and the composer that injects
//!   providers into each route handler before mounting it.
//! - [`paths`]: the concrete route handlers served by the daemon.
//!
//! [`server`] wires them together behind an `axum` listener.

pub mod config;
pub mod error;
pub mod paths;
pub mod providers;
pub mod routes;
pub mod server;

pub use config::DaemonConfig;
pub use error::{RuntimeError, StartupError};
pub use providers::{CapabilityProvider, ContainerHelper, ProviderRegistry, ProviderSet};
pub use routes::{CompositionError, RouteComposer, RouteHandler, RouteNode};

/// Crate version reported by the service index endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by the index endpoint and startup logs.
pub const SERVICE_NAME: &str = "dockyard";
