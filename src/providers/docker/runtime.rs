//! ContainerRuntime trait: the boundary to the runtime's native protocol.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::types::{
    ContainerHandle, ContainerSnapshot, CreateContainerRequest, ImageSummary, PullProgress,
};
use crate::error::RuntimeError;

/// Progress events of an accepted image pull. The stream ends when the
/// transfer is complete; an `Err` item or an event carrying `error` is a
/// terminal transfer failure.
pub type PullStream = BoxStream<'static, Result<PullProgress, RuntimeError>>;

/// Client for the container runtime control socket.
///
/// Implementations classify every failure into [`RuntimeError`] and must be
/// safe for concurrent calls from multiple in-flight requests.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Runtime version string, used as a reachability probe.
    async fn version(&self) -> Result<String, RuntimeError>;

    async fn create_container(
        &self,
        request: &CreateContainerRequest,
    ) -> Result<ContainerHandle, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn restart_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Remove a container without forcing it to stop first.
    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError>;

    /// Combined stdout and stderr captured at call time, without following.
    async fn container_logs(&self, id: &str) -> Result<Bytes, RuntimeError>;

    /// Ask the runtime to pull `reference`.
    ///
    /// Resolves once the runtime has accepted the request, returning the
    /// transfer's progress stream. Failing to get that far (socket down,
    /// unknown repository) is reported here, never through the stream.
    async fn pull_image(&self, reference: &str) -> Result<PullStream, RuntimeError>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError>;

    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError>;
}
