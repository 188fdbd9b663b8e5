//! Docker capability provider.
//!
//! ```text
//!   route handlers ──► ContainerHelper ──► dyn ContainerRuntime
//!                      (log + pass-through)       │
//!                                                 ├── DockerRuntime (bollard, unix socket)
//!                                                 └── FakeRuntime   (tests)
//! ```

pub mod engine;
pub mod helper;
pub mod runtime;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use engine::DockerRuntime;
pub use helper::ContainerHelper;
pub use runtime::{ContainerRuntime, PullStream};
pub use types::{
    ContainerHandle, ContainerSnapshot, CreateContainerRequest, ImageSummary, PullProgress,
};
