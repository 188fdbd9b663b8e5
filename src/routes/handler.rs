//! RouteHandler trait and the injection slot handlers hold their providers in.

use std::any::type_name;
use std::sync::Arc;

use axum::Router;

use super::CompositionError;
use crate::providers::{CapabilityProvider, ProviderSet};

/// A unit of HTTP endpoints mounted somewhere in the route namespace.
///
/// The composer calls [`inject`](RouteHandler::inject) exactly once, then
/// [`router`](RouteHandler::router). Paths in the returned router are
/// relative to the mount prefix: `/` is the prefix itself.
pub trait RouteHandler: Send {
    fn name(&self) -> &str;

    /// Receive the full provider set and keep whatever this handler needs.
    fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError>;

    /// Build the handler's endpoints. Fails if called before `inject`.
    fn router(&self) -> Result<Router, CompositionError>;
}

/// Injection slot for one provider of concrete type `T`.
pub struct Injected<T> {
    handler: &'static str,
    provider: Option<Arc<T>>,
}

impl<T: CapabilityProvider> Injected<T> {
    pub fn new(handler: &'static str) -> Self {
        Self {
            handler,
            provider: None,
        }
    }

    /// Resolve `T` out of the provider set. A second call is an error.
    pub fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError> {
        if self.provider.is_some() {
            return Err(CompositionError::AlreadyInjected(self.handler.to_string()));
        }
        let provider =
            providers
                .find::<T>()
                .ok_or_else(|| CompositionError::MissingCapability {
                    handler: self.handler.to_string(),
                    capability: type_name::<T>(),
                })?;
        self.provider = Some(provider);
        Ok(())
    }

    pub fn get(&self) -> Result<Arc<T>, CompositionError> {
        self.provider
            .clone()
            .ok_or_else(|| CompositionError::NotInjected(self.handler.to_string()))
    }

    pub fn is_injected(&self) -> bool {
        self.provider.is_some()
    }
}
