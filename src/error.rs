//! Error taxonomy for the daemon.
//!
//! Startup-phase failures ([`StartupError`]) are fatal: the daemon never
//! serves traffic with an incomplete provider registry or route tree.
//! Request-phase failures ([`RuntimeError`]) are surfaced to the caller
//! verbatim, after being logged by the provider that observed them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::DiscoveryError;
use crate::routes::CompositionError;

/// A failure reported by (or while reaching) the container runtime.
///
/// The display form is the runtime's own message, unmodified. The variant
/// carries the classification so the HTTP layer can tell a missing container
/// from a state conflict from an unreachable socket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The runtime control socket could not be reached.
    #[error("{0}")]
    Unavailable(String),

    /// The referenced container or image does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation is invalid for the current runtime state.
    #[error("{0}")]
    Conflict(String),

    /// An image pull's progress stream ended in a terminal failure.
    #[error("{0}")]
    Transfer(String),

    /// The request was rejected before reaching the runtime.
    #[error("{0}")]
    InvalidRequest(String),

    /// Any other failure the runtime reported.
    #[error("{message}")]
    Runtime {
        status: Option<u16>,
        message: String,
    },
}

impl RuntimeError {
    /// Stable, machine-readable kind used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::Unavailable(_) => "runtime_unavailable",
            RuntimeError::NotFound(_) => "not_found",
            RuntimeError::Conflict(_) => "conflict",
            RuntimeError::Transfer(_) => "transfer_failed",
            RuntimeError::InvalidRequest(_) => "invalid_request",
            RuntimeError::Runtime { .. } => "runtime_error",
        }
    }

    /// HTTP status used when this error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RuntimeError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RuntimeError::NotFound(_) => StatusCode::NOT_FOUND,
            RuntimeError::Conflict(_) => StatusCode::CONFLICT,
            RuntimeError::Transfer(_) => StatusCode::BAD_GATEWAY,
            RuntimeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RuntimeError::Runtime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RuntimeError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Fatal errors that stop the daemon before (or while) it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("Port {port} is already in use at host {host}, please use another.")]
    PortInUse { host: String, port: u16 },

    #[error("Error starting server: {0}")]
    Listen(#[source] std::io::Error),
}
