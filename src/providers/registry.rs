//! Provider registry: the fixed registration table the daemon discovers
//! capability providers from.
//!
//! Registration is explicit: every provider the binary ships with is listed
//! in [`ProviderRegistry::with_defaults`]. Discovery walks that list once,
//! at startup, and either yields a fully initialized [`ProviderSet`] or
//! fails without exposing any partially built state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::docker::ContainerHelper;
use super::provider::{CapabilityProvider, ProviderSet};
use crate::config::DaemonConfig;
use crate::error::RuntimeError;

/// Errors raised while discovering providers. Always fatal.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to construct capability provider '{provider}': {source}")]
    Construct {
        provider: String,
        #[source]
        source: RuntimeError,
    },

    #[error("capability provider '{provider}' failed to initialize: {source}")]
    Initialize {
        provider: String,
        #[source]
        source: RuntimeError,
    },
}

/// Constructor for one provider type.
pub type ProviderConstructor =
    Box<dyn Fn(&DaemonConfig) -> Result<Box<dyn CapabilityProvider>, RuntimeError> + Send + Sync>;

/// One entry of the registration table.
pub struct ProviderRegistration {
    pub name: &'static str,
    construct: ProviderConstructor,
}

/// Registration table for capability providers.
#[derive(Default)]
pub struct ProviderRegistry {
    registrations: Vec<ProviderRegistration>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in provider registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ContainerHelper::NAME, |config| {
            Ok(Box::new(ContainerHelper::connect(config)?))
        });
        registry
    }

    /// Register a provider constructor. Discovery order is registration order.
    pub fn register<F>(&mut self, name: &'static str, construct: F)
    where
        F: Fn(&DaemonConfig) -> Result<Box<dyn CapabilityProvider>, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        self.registrations.push(ProviderRegistration {
            name,
            construct: Box::new(construct),
        });
    }

    /// Registered provider names, in discovery order.
    pub fn names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.name).collect()
    }

    /// Construct and initialize every registered provider exactly once.
    ///
    /// The first failure aborts discovery; providers constructed before it
    /// are dropped and never reach a route handler.
    pub async fn discover_and_initialize(
        self,
        config: &DaemonConfig,
    ) -> Result<ProviderSet, DiscoveryError> {
        let mut providers: Vec<Arc<dyn CapabilityProvider>> =
            Vec::with_capacity(self.registrations.len());

        for registration in &self.registrations {
            debug!("Constructing capability provider '{}'", registration.name);
            let mut provider =
                (registration.construct)(config).map_err(|source| DiscoveryError::Construct {
                    provider: registration.name.to_string(),
                    source,
                })?;

            provider
                .initialize()
                .await
                .map_err(|source| DiscoveryError::Initialize {
                    provider: registration.name.to_string(),
                    source,
                })?;

            providers.push(Arc::from(provider));
        }

        let set = ProviderSet::new(providers);
        info!("Capability providers initialized: {:?}", set);
        Ok(set)
    }
}
