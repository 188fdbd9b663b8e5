//! Route handlers served by the daemon, and the namespace they mount in.
//!
//! # Routes
//!
//! - `GET    /`                        Service name, version and providers
//! - `GET    /health`                  Liveness probe
//! - `POST   /containers`              Create a container (not started)
//! - `GET    /containers/:id`          Inspect a container
//! - `DELETE /containers/:id`          Remove a stopped container
//! - `POST   /containers/:id/start`    Start
//! - `POST   /containers/:id/stop`     Stop
//! - `POST   /containers/:id/restart`  Restart
//! - `GET    /containers/:id/logs`     Log snapshot (text/plain)
//! - `GET    /images`                  List images
//! - `POST   /images`                  Pull `{"image": "redis:latest"}`
//! - `DELETE /images/*reference`       Remove an image

pub mod containers;
pub mod health;
pub mod images;
pub mod index;

use axum::extract::rejection::JsonRejection;

pub use containers::Containers;
pub use health::Health;
pub use images::Images;
pub use index::ServiceIndex;

use crate::error::RuntimeError;
use crate::routes::RouteNode;

/// The daemon's route namespace.
pub fn namespace() -> RouteNode {
    RouteNode::root(vec![
        RouteNode::index(ServiceIndex::new()),
        RouteNode::leaf("health", Health::new()),
        RouteNode::group("containers", vec![RouteNode::index(Containers::new())]),
        RouteNode::group("images", vec![RouteNode::index(Images::new())]),
    ])
}

/// Report malformed request bodies with the daemon's JSON error shape.
pub(crate) fn invalid_body(rejection: JsonRejection) -> RuntimeError {
    RuntimeError::InvalidRequest(rejection.body_text())
}
