//! `GET /health`: liveness probe.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::providers::ProviderSet;
use crate::routes::{CompositionError, RouteHandler};

#[derive(Default)]
pub struct Health {
    injected: bool,
}

impl Health {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteHandler for Health {
    fn name(&self) -> &str {
        "health"
    }

    fn inject(&mut self, _providers: &ProviderSet) -> Result<(), CompositionError> {
        if self.injected {
            return Err(CompositionError::AlreadyInjected(self.name().to_string()));
        }
        self.injected = true;
        Ok(())
    }

    fn router(&self) -> Result<Router, CompositionError> {
        if !self.injected {
            return Err(CompositionError::NotInjected(self.name().to_string()));
        }
        Ok(Router::new().route("/", get(health_handler)))
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": crate::SERVICE_NAME,
    }))
}
