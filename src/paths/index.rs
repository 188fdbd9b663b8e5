//! `GET /`: service index.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::providers::ProviderSet;
use crate::routes::{CompositionError, RouteHandler};

/// Reports the service name, version and the initialized providers.
#[derive(Default)]
pub struct ServiceIndex {
    providers: Option<ProviderSet>,
}

impl ServiceIndex {
    pub const NAME: &'static str = "index";

    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteHandler for ServiceIndex {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError> {
        if self.providers.is_some() {
            return Err(CompositionError::AlreadyInjected(Self::NAME.to_string()));
        }
        self.providers = Some(providers.clone());
        Ok(())
    }

    fn router(&self) -> Result<Router, CompositionError> {
        let providers = self
            .providers
            .as_ref()
            .ok_or_else(|| CompositionError::NotInjected(Self::NAME.to_string()))?;

        let body = json!({
            "service": crate::SERVICE_NAME,
            "version": crate::VERSION,
            "status": "ok",
            "providers": providers.names(),
        });
        Ok(Router::new().route("/", get(move || index_handler(body))))
    }
}

async fn index_handler(body: Value) -> Json<Value> {
    Json(body)
}
