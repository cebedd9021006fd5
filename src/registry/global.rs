//! # Process-wide Registry
//!
//! One [`ServiceRegistry`] reachable from anywhere in the process, for
//! subsystems that cannot be handed a registry explicitly.
//!
//! The registry is created on first use with default configuration. Hosts
//! that need different settings call [`init_global`] once during startup,
//! before anything touches the registry. Tests and shutdown paths can empty
//! it with [`clear`].
//!
//! ```rust
//! use service_registry::global;
//! use std::sync::Arc;
//!
//! struct SaveGameService;
//!
//! global::register(Arc::new(SaveGameService), false);
//! assert!(global::get::<SaveGameService>().is_some());
//! global::unregister::<SaveGameService>();
//! ```

use super::service_registry::ServiceRegistry;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use std::sync::{Arc, OnceLock};
use tracing::info;

static GLOBAL_REGISTRY: OnceLock<ServiceRegistry> = OnceLock::new();

/// The process-wide registry, created with default configuration if
/// `init_global` has not run
pub fn global() -> &'static ServiceRegistry {
    GLOBAL_REGISTRY.get_or_init(ServiceRegistry::new)
}

/// Create the process-wide registry with `config`.
///
/// Fails with [`RegistryError::AlreadyInitialized`] if the registry already
/// exists, whether from an earlier `init_global` or from first use.
pub fn init_global(config: RegistryConfig) -> RegistryResult<&'static ServiceRegistry> {
    config.validate()?;

    let mut created = false;
    let registry = GLOBAL_REGISTRY.get_or_init(|| {
        created = true;
        ServiceRegistry::with_config(config)
    });

    if !created {
        return Err(RegistryError::AlreadyInitialized);
    }

    info!("Initialized global service registry");
    Ok(registry)
}

/// [`ServiceRegistry::register`] on the process-wide registry
pub fn register<T>(service: Arc<T>, force: bool) -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    global().register(service, force)
}

/// [`ServiceRegistry::get`] on the process-wide registry
pub fn get<T>() -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    global().get::<T>()
}

/// [`ServiceRegistry::unregister`] on the process-wide registry
pub fn unregister<T>() -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    global().unregister::<T>()
}

/// [`ServiceRegistry::clear`] on the process-wide registry
pub fn clear() -> usize {
    global().clear()
}
