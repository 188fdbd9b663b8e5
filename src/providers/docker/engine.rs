//! Docker Engine implementation of [`ContainerRuntime`] on top of `bollard`.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{CreateImageInfo, HostConfig, PortBinding};
use bollard::Docker;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::runtime::{ContainerRuntime, PullStream};
use super::types::{
    ContainerHandle, ContainerSnapshot, CreateContainerRequest, ImageSummary, PullProgress,
};
use crate::config::DaemonConfig;
use crate::error::RuntimeError;

/// Runtime client speaking the Docker Engine API over a unix socket.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Build a client for the configured socket. No request is sent yet, so
    /// an absent daemon surfaces on the first operation, not here.
    pub fn connect(config: &DaemonConfig) -> Result<Self, RuntimeError> {
        debug!(
            "Connecting Docker client to socket {}",
            config.docker_socket
        );
        let docker = Docker::connect_with_unix(
            &config.docker_socket,
            config.docker_timeout_secs,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(classify)?;

        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn version(&self) -> Result<String, RuntimeError> {
        let version = self.docker.version().await.map_err(classify)?;
        Ok(version.version.unwrap_or_default())
    }

    async fn create_container(
        &self,
        request: &CreateContainerRequest,
    ) -> Result<ContainerHandle, RuntimeError> {
        let bindings = request.port_bindings()?;

        let exposed_ports: HashMap<String, HashMap<(), ()>> = bindings
            .keys()
            .map(|port| (port.clone(), HashMap::new()))
            .collect();
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = bindings
            .iter()
            .map(|(port, host_port)| {
                let binding = PortBinding {
                    host_ip: None,
                    host_port: host_port.map(|p| p.to_string()),
                };
                (port.clone(), Some(vec![binding]))
            })
            .collect();

        let config = Config {
            image: Some(request.image.clone()),
            cmd: (!request.command.is_empty()).then(|| request.command.clone()),
            env: (!request.env.is_empty()).then(|| request.env.clone()),
            labels: (!request.labels.is_empty())
                .then(|| request.labels.clone().into_iter().collect()),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = request.name.clone().map(|name| CreateContainerOptions {
            name,
            platform: None,
        });

        let response = self
            .docker
            .create_container(options, config)
            .await
            .map_err(classify)?;

        Ok(ContainerHandle {
            id: response.id,
            warnings: response.warnings,
        })
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(classify)
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.stop_container(id, None).await.map_err(classify)
    }

    async fn restart_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.restart_container(id, None).await.map_err(classify)
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.remove_container(id, None).await.map_err(classify)
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        let response = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(classify)?;

        let state = to_json(&response.state)?;
        let status = state
            .get("Status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let running = state
            .get("Running")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(ContainerSnapshot {
            id: response.id.clone().unwrap_or_else(|| id.to_string()),
            name: response
                .name
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: response
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            status,
            running,
            config: to_json(&response.config)?,
            network: to_json(&response.network_settings)?,
        })
    }

    async fn container_logs(&self, id: &str) -> Result<Bytes, RuntimeError> {
        let options = LogsOptions::<String> {
            follow: false,
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut log_stream = Box::pin(self.docker.logs(id, Some(options)));
        let mut buffer = BytesMut::new();
        while let Some(chunk) = log_stream.next().await {
            let output = chunk.map_err(classify)?;
            buffer.extend_from_slice(&output.into_bytes());
        }

        Ok(buffer.freeze())
    }

    async fn pull_image(&self, reference: &str) -> Result<PullStream, RuntimeError> {
        let options = CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        };

        accept_pull(self.docker.create_image(Some(options), None, None)).await
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };

        let images = self
            .docker
            .list_images(Some(options))
            .await
            .map_err(classify)?;

        Ok(images
            .into_iter()
            .map(|image| ImageSummary {
                id: image.id,
                repo_tags: image.repo_tags,
                size: image.size,
                created: image.created,
            })
            .collect())
    }

    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_image(reference, None, None)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Wait for the first event of a pull. The request is only sent on first
/// poll: whatever fails before the first event is a failure to start the
/// transfer and keeps its own class; everything after is a transfer error.
async fn accept_pull<S>(progress: S) -> Result<PullStream, RuntimeError>
where
    S: Stream<Item = Result<CreateImageInfo, BollardError>> + Send + 'static,
{
    let mut progress = progress.boxed();

    let first = match progress.next().await {
        Some(Ok(info)) => Some(Ok(progress_from(info))),
        Some(Err(err @ BollardError::DockerStreamError { .. })) => Some(Err(transfer_error(err))),
        Some(Err(err)) => return Err(classify(err)),
        None => None,
    };

    let rest = progress.map(|item| item.map(progress_from).map_err(transfer_error));
    Ok(stream::iter(first).chain(rest).boxed())
}

fn progress_from(info: CreateImageInfo) -> PullProgress {
    PullProgress {
        status: info.status,
        id: info.id,
        progress: info.progress,
        error: info.error,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, RuntimeError> {
    serde_json::to_value(value).map_err(|err| RuntimeError::Runtime {
        status: None,
        message: err.to_string(),
    })
}

fn transfer_error(err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerStreamError { error } => RuntimeError::Transfer(error),
        other => RuntimeError::Transfer(other.to_string()),
    }
}

/// Map a `bollard` failure onto the daemon's error taxonomy, keeping the
/// runtime's message.
fn classify(err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => {
            let message = if message.trim().is_empty() {
                default_message(status_code)
            } else {
                message
            };
            match status_code {
                404 => RuntimeError::NotFound(message),
                304 | 409 => RuntimeError::Conflict(message),
                400 => RuntimeError::InvalidRequest(message),
                _ => RuntimeError::Runtime {
                    status: Some(status_code),
                    message,
                },
            }
        }
        BollardError::DockerStreamError { error } => RuntimeError::Transfer(error),
        err @ (BollardError::IOError { .. }
        | BollardError::SocketNotFoundError(_)
        | BollardError::RequestTimeoutError
        | BollardError::HyperResponseError { .. }
        | BollardError::HyperLegacyError { .. }) => RuntimeError::Unavailable(err.to_string()),
        other => RuntimeError::Runtime {
            status: None,
            message: other.to_string(),
        },
    }
}

// The engine answers 304 with an empty body.
fn default_message(status_code: u16) -> String {
    match status_code {
        304 => "container is already in the requested state".to_string(),
        code => format!("container runtime returned status {code}"),
    }
}
