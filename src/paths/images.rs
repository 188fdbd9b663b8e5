//! `/images`: image pull, list and removal.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::invalid_body;
use crate::error::RuntimeError;
use crate::providers::docker::ImageSummary;
use crate::providers::{ContainerHelper, ProviderSet};
use crate::routes::{CompositionError, Injected, RouteHandler};

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub image: String,
}

pub struct Images {
    docker: Injected<ContainerHelper>,
}

impl Images {
    pub fn new() -> Self {
        Self {
            docker: Injected::new("images"),
        }
    }
}

impl Default for Images {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteHandler for Images {
    fn name(&self) -> &str {
        "images"
    }

    fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError> {
        self.docker.inject(providers)
    }

    fn router(&self) -> Result<Router, CompositionError> {
        Ok(Router::new()
            .route("/", get(list_handler).post(pull_handler))
            .route("/*reference", delete(remove_handler))
            .with_state(self.docker.get()?))
    }
}

async fn list_handler(
    State(docker): State<Arc<ContainerHelper>>,
) -> Result<Json<Vec<ImageSummary>>, RuntimeError> {
    Ok(Json(docker.list_images().await?))
}

/// POST /images: responds once the whole transfer has completed.
async fn pull_handler(
    State(docker): State<Arc<ContainerHelper>>,
    body: Result<Json<PullRequest>, JsonRejection>,
) -> Result<Json<Value>, RuntimeError> {
    let Json(request) = body.map_err(invalid_body)?;
    let image = request.image.trim();
    if image.is_empty() {
        return Err(RuntimeError::InvalidRequest(
            "image is required to pull".to_string(),
        ));
    }

    docker.pull_image(image).await?;
    Ok(Json(json!({ "image": image, "status": "pulled" })))
}

/// DELETE /images/*reference: the reference may contain `/`.
async fn remove_handler(
    State(docker): State<Arc<ContainerHelper>>,
    Path(reference): Path<String>,
) -> Result<StatusCode, RuntimeError> {
    docker
        .remove_image(reference.trim_start_matches('/'))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
