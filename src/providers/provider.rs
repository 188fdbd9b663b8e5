//! CapabilityProvider trait: the lifecycle contract every provider follows.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RuntimeError;

/// The core provider trait.
///
/// The lifecycle is: construct → `initialize()` (exactly once) → shared
/// read-only for the rest of the process. Operations are provider-specific
/// inherent methods; route handlers reach them by resolving the concrete
/// type out of the [`ProviderSet`].
#[async_trait]
pub trait CapabilityProvider: Any + Send + Sync {
    /// Stable provider name used in logs and the service index.
    fn name(&self) -> &str;

    /// Prepare the provider for use. Called once, before the provider is
    /// shared with any route handler.
    async fn initialize(&mut self) -> Result<(), RuntimeError>;

    /// Upcast used by [`ProviderSet::find`] to recover the concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Ordered set of initialized providers, in registration order.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn CapabilityProvider>>,
}

impl ProviderSet {
    /// Wrap providers that have already completed `initialize`.
    pub fn new(providers: Vec<Arc<dyn CapabilityProvider>>) -> Self {
        Self { providers }
    }

    /// Find the provider of concrete type `T`.
    pub fn find<T: CapabilityProvider>(&self) -> Option<Arc<T>> {
        self.providers
            .iter()
            .find_map(|provider| provider.clone().into_any().downcast::<T>().ok())
    }

    /// Provider names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CapabilityProvider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
