//! ContainerHelper: the container lifecycle facade.
//!
//! Every operation is a thin pass-through to the [`ContainerRuntime`]: no
//! caching, no retries, no per-id locking. On failure the operation logs the
//! context and returns the runtime's error unchanged.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use super::engine::DockerRuntime;
use super::runtime::{ContainerRuntime, PullStream};
use super::types::{ContainerHandle, ContainerSnapshot, CreateContainerRequest, ImageSummary};
use crate::config::DaemonConfig;
use crate::error::RuntimeError;
use crate::providers::provider::CapabilityProvider;

/// Capability provider for container and image lifecycle actions.
pub struct ContainerHelper {
    runtime: Arc<dyn ContainerRuntime>,
    runtime_version: Option<String>,
}

impl ContainerHelper {
    pub const NAME: &'static str = "docker";

    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            runtime_version: None,
        }
    }

    /// Build a helper backed by the Docker socket from `config`.
    pub fn connect(config: &DaemonConfig) -> Result<Self, RuntimeError> {
        Ok(Self::new(Arc::new(DockerRuntime::connect(config)?)))
    }

    /// Runtime version observed during initialization, if it was reachable.
    pub fn runtime_version(&self) -> Option<&str> {
        self.runtime_version.as_deref()
    }

    /// Create a container. The container is not started.
    pub async fn create_container(
        &self,
        request: &CreateContainerRequest,
    ) -> Result<ContainerHandle, RuntimeError> {
        request
            .validate()
            .inspect_err(|e| error!("Error creating container: {}", e))?;

        let handle = self
            .runtime
            .create_container(request)
            .await
            .inspect_err(|e| error!("Error creating container from {}: {}", request.image, e))?;

        info!("Created container {} from {}", handle.id, request.image);
        Ok(handle)
    }

    pub async fn start_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.runtime
            .start_container(container_id)
            .await
            .inspect_err(|e| error!("Error starting container {}: {}", container_id, e))?;
        info!("Started container {}", container_id);
        Ok(())
    }

    pub async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.runtime
            .stop_container(container_id)
            .await
            .inspect_err(|e| error!("Error stopping container {}: {}", container_id, e))?;
        info!("Stopped container {}", container_id);
        Ok(())
    }

    pub async fn restart_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.runtime
            .restart_container(container_id)
            .await
            .inspect_err(|e| error!("Error restarting container {}: {}", container_id, e))?;
        info!("Restarted container {}", container_id);
        Ok(())
    }

    /// Remove a stopped container. A running container is a conflict; it is
    /// never force-stopped.
    pub async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.runtime
            .remove_container(container_id)
            .await
            .inspect_err(|e| error!("Error removing container {}: {}", container_id, e))?;
        info!("Removed container {}", container_id);
        Ok(())
    }

    pub async fn inspect_container(
        &self,
        container_id: &str,
    ) -> Result<ContainerSnapshot, RuntimeError> {
        self.runtime
            .inspect_container(container_id)
            .await
            .inspect_err(|e| error!("Error getting container {}: {}", container_id, e))
    }

    /// Snapshot of combined stdout and stderr, decoded as (lossy) UTF-8.
    pub async fn get_container_logs(&self, container_id: &str) -> Result<String, RuntimeError> {
        let bytes = self
            .runtime
            .container_logs(container_id)
            .await
            .inspect_err(|e| error!("Error fetching container logs for {}: {}", container_id, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Pull an image and wait for the whole transfer to finish.
    pub async fn pull_image(&self, image_name: &str) -> Result<(), RuntimeError> {
        info!("Pulling image {}", image_name);

        let progress = self
            .runtime
            .pull_image(image_name)
            .await
            .inspect_err(|e| error!("Error pulling image {}: {}", image_name, e))?;

        follow_progress(image_name, progress)
            .await
            .inspect_err(|e| error!("Error pulling image {}: {}", image_name, e))?;

        info!("Pulled image {}", image_name);
        Ok(())
    }

    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
        self.runtime
            .list_images()
            .await
            .inspect_err(|e| error!("Error listing images: {}", e))
    }

    /// Remove an image. An image used by an existing container is a conflict.
    pub async fn remove_image(&self, image_name: &str) -> Result<(), RuntimeError> {
        self.runtime
            .remove_image(image_name)
            .await
            .inspect_err(|e| error!("Error removing image {}: {}", image_name, e))?;
        info!("Removed image {}", image_name);
        Ok(())
    }
}

/// Drain a pull's progress stream. Resolves only on the stream's terminal
/// event: its end (success) or a failure.
async fn follow_progress(image_name: &str, mut progress: PullStream) -> Result<(), RuntimeError> {
    while let Some(event) = progress.next().await {
        let event = event.map_err(|e| match e {
            RuntimeError::Transfer(_) => e,
            other => RuntimeError::Transfer(other.to_string()),
        })?;

        if let Some(message) = event.error {
            return Err(RuntimeError::Transfer(message));
        }

        debug!(
            "Pull {}: {} {} {}",
            image_name,
            event.id.as_deref().unwrap_or_default(),
            event.status.as_deref().unwrap_or_default(),
            event.progress.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

#[async_trait]
impl CapabilityProvider for ContainerHelper {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Probe the runtime once. An unreachable socket is not fatal: requests
    /// report it individually as `RuntimeUnavailable`.
    async fn initialize(&mut self) -> Result<(), RuntimeError> {
        match self.runtime.version().await {
            Ok(version) => {
                info!("Docker helper initialized (engine {})", version);
                self.runtime_version = Some(version);
            }
            Err(e) => {
                warn!("Docker helper initialized, runtime not reachable yet: {}", e);
            }
        }
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
