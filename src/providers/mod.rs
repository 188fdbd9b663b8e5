//! # Capability providers
//!
//! A capability provider is a long-lived unit that exposes operations
//! against an external system. Providers are listed in a fixed registration
//! table, constructed and initialized exactly once at startup, and handed to
//! every route handler as an ordered [`ProviderSet`].
//!
//! ```text
//! ProviderRegistry::with_defaults()
//!   │ discover_and_initialize()
//!   │   construct → initialize   (per registration, in order)
//!   ▼
//! ProviderSet [ContainerHelper, ...]
//!   │ RouteComposer injects into each RouteHandler
//!   ▼
//! HTTP handlers call provider operations
//! ```
//!
//! ## Extending
//!
//! To add a provider:
//! 1. Implement [`CapabilityProvider`] for it
//! 2. Register its constructor in [`ProviderRegistry::with_defaults`]
//! 3. Resolve it from a route handler with `Injected<YourProvider>`

pub mod docker;
pub mod provider;
pub mod registry;

pub use docker::{ContainerHelper, ContainerRuntime, DockerRuntime};
pub use provider::{CapabilityProvider, ProviderSet};
pub use registry::{DiscoveryError, ProviderRegistration, ProviderRegistry};
