//! Route namespace and composition.
//!
//! The HTTP surface is described as a tree of [`RouteNode`]s. Groups
//! contribute a path segment, index nodes mount at their group's prefix and
//! leaf nodes mount one segment below it:
//!
//! ```text
//!   root ─┬─ Index(ServiceIndex)            →  /
//!         ├─ Leaf("health", Health)         →  /health
//!         └─ Group("containers")
//!              └─ Index(Containers)         →  /containers
//! ```
//!
//! [`RouteComposer`] walks the tree depth-first. Each handler receives the
//! [`ProviderSet`](crate::providers::ProviderSet) through
//! [`RouteHandler::inject`] before its router is built and mounted, so no
//! endpoint is reachable until its dependencies are in place.

pub mod composer;
pub mod handler;
pub mod node;

use thiserror::Error;

pub use composer::{ComposedRoutes, Mount, RouteComposer};
pub use handler::{Injected, RouteHandler};
pub use node::RouteNode;

/// Errors raised while composing the route namespace. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("invalid route segment '{segment}' under '{parent}'")]
    InvalidSegment { segment: String, parent: String },

    #[error("duplicate route prefix '{0}'")]
    DuplicatePrefix(String),

    #[error("route group '{0}' mounts no handlers")]
    EmptyGroup(String),

    #[error("route handler '{handler}' requires capability '{capability}', which is not registered")]
    MissingCapability {
        handler: String,
        capability: &'static str,
    },

    #[error("route handler '{0}' was already injected")]
    AlreadyInjected(String),

    #[error("route handler '{0}' was used before injection")]
    NotInjected(String),

    #[error("route handler '{handler}' at '{prefix}' overlaps an existing route: {reason}")]
    RouteConflict {
        prefix: String,
        handler: String,
        reason: String,
    },

    #[error("route handler '{handler}' failed: {reason}")]
    Handler { handler: String, reason: String },
}
