//! `/containers`: container lifecycle endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::invalid_body;
use crate::error::RuntimeError;
use crate::providers::docker::{ContainerHandle, ContainerSnapshot, CreateContainerRequest};
use crate::providers::{ContainerHelper, ProviderSet};
use crate::routes::{CompositionError, Injected, RouteHandler};

type Helper = State<Arc<ContainerHelper>>;

pub struct Containers {
    docker: Injected<ContainerHelper>,
}

impl Containers {
    pub fn new() -> Self {
        Self {
            docker: Injected::new("containers"),
        }
    }
}

impl Default for Containers {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteHandler for Containers {
    fn name(&self) -> &str {
        "containers"
    }

    fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError> {
        self.docker.inject(providers)
    }

    fn router(&self) -> Result<Router, CompositionError> {
        Ok(Router::new()
            .route("/", post(create_handler))
            .route("/:id", get(inspect_handler).delete(remove_handler))
            .route("/:id/start", post(start_handler))
            .route("/:id/stop", post(stop_handler))
            .route("/:id/restart", post(restart_handler))
            .route("/:id/logs", get(logs_handler))
            .with_state(self.docker.get()?))
    }
}

/// POST /containers: create, without starting.
async fn create_handler(
    State(docker): Helper,
    body: Result<Json<CreateContainerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContainerHandle>), RuntimeError> {
    let Json(request) = body.map_err(invalid_body)?;
    let handle = docker.create_container(&request).await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

async fn inspect_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<Json<ContainerSnapshot>, RuntimeError> {
    Ok(Json(docker.inspect_container(&id).await?))
}

async fn remove_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<StatusCode, RuntimeError> {
    docker.remove_container(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<StatusCode, RuntimeError> {
    docker.start_container(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stop_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<StatusCode, RuntimeError> {
    docker.stop_container(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restart_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<StatusCode, RuntimeError> {
    docker.restart_container(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /containers/:id/logs: snapshot, served as `text/plain`.
async fn logs_handler(
    State(docker): Helper,
    Path(id): Path<String>,
) -> Result<String, RuntimeError> {
    docker.get_container_logs(&id).await
}
