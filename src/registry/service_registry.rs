//! # Service Registry
//!
//! Type-keyed storage for singleton service instances.
//!
//! ## Overview
//!
//! Each service is stored under the `TypeId` of the type it was registered
//! as, which may be a concrete type or a trait object (`dyn Logger`). At most
//! one instance exists per type. Instances are shared via `Arc`, so clearing
//! the registry does not drop a service somebody else still holds.
//!
//! ## Soft contract
//!
//! Duplicate registrations and lookups of missing types are not errors. They
//! log a warning and return a sentinel (`Some(previous)` / `None`), leaving the
//! decision to the caller. `try_register` and `require` are the strict
//! counterparts for callers that want a `Result`.
//!
//! ## Concurrency
//!
//! Entries live in a `DashMap`. The existence check, read of the previous
//! instance and conditional overwrite in `register` happen under one shard
//! write lock through the entry API, so operations on the same type are
//! linearizable. Diagnostics are emitted after the lock is released.
//!
//! ## Usage
//!
//! ```rust
//! use service_registry::ServiceRegistry;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger);
//! assert!(registry.register(logger, false).is_none());
//!
//! if let Some(logger) = registry.get::<dyn Logger>() {
//!     logger.log("registered");
//! }
//! ```

use crate::config::{RegistryConfig, MAX_INITIAL_CAPACITY};
use crate::error::{RegistryError, RegistryResult};
use crate::logging::log_registry_operation;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::{type_name, Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// A stored service. `instance` always holds an `Arc<T>` for the `T` whose
/// `TypeId` keys the entry.
struct ServiceEntry {
    type_name: &'static str,
    instance: Box<dyn Any + Send + Sync>,
    registered_at: DateTime<Utc>,
}

impl ServiceEntry {
    fn new<T: ?Sized + Send + Sync + 'static>(service: Arc<T>) -> Self {
        Self {
            type_name: type_name::<T>(),
            instance: Box::new(service),
            registered_at: Utc::now(),
        }
    }

    fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.downcast_ref::<Arc<T>>().cloned()
    }

    fn into_instance<T: ?Sized + Send + Sync + 'static>(self) -> Option<Arc<T>> {
        self.instance.downcast::<Arc<T>>().ok().map(|service| *service)
    }
}

/// Snapshot of one registered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub type_name: &'static str,
    pub registered_at: DateTime<Utc>,
}

/// Counters describing registry traffic since creation.
///
/// `registrations` counts `register`/`try_register` calls, including ones
/// that hit an existing entry and changed nothing; `duplicate_registrations`
/// is the subset of those calls. `total_services` is the current entry count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_services: usize,
    pub registrations: u64,
    pub forced_overwrites: u64,
    pub duplicate_registrations: u64,
    pub lookups: u64,
    pub missing_lookups: u64,
    pub unregistrations: u64,
    pub missing_unregistrations: u64,
}

#[derive(Debug, Default)]
struct RegistryCounters {
    registrations: AtomicU64,
    forced_overwrites: AtomicU64,
    duplicate_registrations: AtomicU64,
    lookups: AtomicU64,
    missing_lookups: AtomicU64,
    unregistrations: AtomicU64,
    missing_unregistrations: AtomicU64,
}

impl RegistryCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Thread-safe map from service type to its single shared instance
pub struct ServiceRegistry {
    services: DashMap<TypeId, ServiceEntry>,
    config: RwLock<RegistryConfig>,
    counters: RegistryCounters,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("total_services", &self.services.len())
            .field("config", &*self.config.read())
            .finish()
    }
}

impl ServiceRegistry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration
    ///
    /// `initial_capacity` is clamped to [`MAX_INITIAL_CAPACITY`].
    pub fn with_config(config: RegistryConfig) -> Self {
        let capacity = config.initial_capacity.min(MAX_INITIAL_CAPACITY);
        if capacity < config.initial_capacity {
            warn!(
                requested = config.initial_capacity,
                capacity = capacity,
                "Registry initial_capacity exceeds maximum, clamping"
            );
        }

        Self {
            services: DashMap::with_capacity(capacity),
            config: RwLock::new(config),
            counters: RegistryCounters::default(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> RegistryConfig {
        self.config.read().clone()
    }

    /// Replace the configuration. Capacity changes only affect new registries.
    pub fn configure(&self, config: RegistryConfig) {
        *self.config.write() = config;
    }

    /// Register `service` as the instance for `T`.
    ///
    /// Returns the instance that was already registered for `T`, if any. When
    /// one exists the entry is only replaced if `force` is set; otherwise the
    /// existing instance stays in place. Either way a duplicate logs a warning
    /// unless `warn_on_duplicate` is turned off.
    pub fn register<T>(&self, service: Arc<T>, force: bool) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let previous = match self.services.entry(TypeId::of::<T>()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.get().instance::<T>();
                if force {
                    occupied.insert(ServiceEntry::new(service));
                }
                previous
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ServiceEntry::new(service));
                None
            }
        };

        RegistryCounters::bump(&self.counters.registrations);

        if previous.is_some() {
            RegistryCounters::bump(&self.counters.duplicate_registrations);
            if force {
                RegistryCounters::bump(&self.counters.forced_overwrites);
            }
            if self.config.read().warn_on_duplicate {
                warn!(
                    operation = "register",
                    service_type = type_name::<T>(),
                    force = force,
                    "Service of type {} is already registered",
                    type_name::<T>()
                );
            }
        }

        self.trace("register", type_name::<T>(), || match (&previous, force) {
            (None, _) => "registered",
            (Some(_), true) => "overwritten",
            (Some(_), false) => "kept_existing",
        });

        previous
    }

    /// Register `service` only if `T` has no entry yet.
    ///
    /// Never overwrites and does not log the duplicate warning; the error
    /// carries that information instead.
    pub fn try_register<T>(&self, service: Arc<T>) -> RegistryResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.services.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => {
                RegistryCounters::bump(&self.counters.registrations);
                RegistryCounters::bump(&self.counters.duplicate_registrations);
                Err(RegistryError::AlreadyRegistered {
                    type_name: type_name::<T>(),
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ServiceEntry::new(service));
                RegistryCounters::bump(&self.counters.registrations);
                self.trace("try_register", type_name::<T>(), || "registered");
                Ok(())
            }
        }
    }

    /// Look up the instance registered for `T`.
    ///
    /// Logs a warning and returns `None` if there is none.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        RegistryCounters::bump(&self.counters.lookups);
        let service = self.lookup::<T>();

        if service.is_none() {
            RegistryCounters::bump(&self.counters.missing_lookups);
            self.warn_missing("get", type_name::<T>());
        } else {
            self.trace("get", type_name::<T>(), || "found");
        }

        service
    }

    /// Look up the instance registered for `T`, failing with
    /// [`RegistryError::NotRegistered`] if there is none
    pub fn require<T>(&self) -> RegistryResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        RegistryCounters::bump(&self.counters.lookups);
        self.lookup::<T>().ok_or_else(|| {
            RegistryCounters::bump(&self.counters.missing_lookups);
            RegistryError::NotRegistered {
                type_name: type_name::<T>(),
            }
        })
    }

    /// Whether `T` has an entry. Never logs.
    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Remove the entry for `T`, returning the instance it held.
    ///
    /// Logs a warning and returns `None` if `T` was not registered.
    pub fn unregister<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.services.remove(&TypeId::of::<T>()) {
            Some((_, entry)) => {
                RegistryCounters::bump(&self.counters.unregistrations);
                self.trace("unregister", entry.type_name, || "removed");
                entry.into_instance::<T>()
            }
            None => {
                RegistryCounters::bump(&self.counters.missing_unregistrations);
                self.warn_missing("unregister", type_name::<T>());
                None
            }
        }
    }

    /// Remove every entry, returning how many were removed.
    ///
    /// Services are dropped only after every shard lock is released, so a
    /// `Drop` impl may call back into the registry.
    pub fn clear(&self) -> usize {
        let keys: Vec<TypeId> = self.services.iter().map(|entry| *entry.key()).collect();
        let removed: Vec<ServiceEntry> = keys
            .iter()
            .filter_map(|key| self.services.remove(key).map(|(_, entry)| entry))
            .collect();
        let count = removed.len();
        drop(removed);

        info!(removed = count, "Cleared service registry");
        count
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Snapshot of registered services, sorted by type name
    pub fn registered_services(&self) -> Vec<ServiceInfo> {
        let mut services: Vec<ServiceInfo> = self
            .services
            .iter()
            .map(|entry| ServiceInfo {
                type_name: entry.type_name,
                registered_at: entry.registered_at,
            })
            .collect();
        services.sort_by(|a, b| a.type_name.cmp(b.type_name));
        services
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        RegistryStats {
            total_services: self.services.len(),
            registrations: load(&self.counters.registrations),
            forced_overwrites: load(&self.counters.forced_overwrites),
            duplicate_registrations: load(&self.counters.duplicate_registrations),
            lookups: load(&self.counters.lookups),
            missing_lookups: load(&self.counters.missing_lookups),
            unregistrations: load(&self.counters.unregistrations),
            missing_unregistrations: load(&self.counters.missing_unregistrations),
        }
    }

    fn lookup<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Clone out of the guard so the shard lock is not held by the caller
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance::<T>())
    }

    fn warn_missing(&self, operation: &str, service_type: &str) {
        if self.config.read().warn_on_missing {
            warn!(
                operation = operation,
                service_type = service_type,
                "Service of type {} is not registered",
                service_type
            );
        }
    }

    fn trace(&self, operation: &str, service_type: &str, status: impl FnOnce() -> &'static str) {
        if self.config.read().trace_operations {
            log_registry_operation(operation, service_type, status(), None);
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Logger: Send + Sync {
        fn name(&self) -> &str;
    }

    struct NamedLogger(&'static str);

    impl Logger for NamedLogger {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[derive(Debug)]
    struct AudioService {
        volume: u8,
    }

    #[derive(Debug)]
    struct InputService;

    #[test]
    fn test_registry_creation() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[test]
    fn test_register_and_get_returns_same_instance() {
        let registry = ServiceRegistry::new();
        let audio = Arc::new(AudioService { volume: 7 });

        assert!(registry.register(Arc::clone(&audio), false).is_none());

        let fetched = registry.get::<AudioService>().unwrap();
        assert!(Arc::ptr_eq(&audio, &fetched));
        assert_eq!(fetched.volume, 7);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_without_force_keeps_first() {
        let registry = ServiceRegistry::new();
        let first = Arc::new(AudioService { volume: 1 });
        let second = Arc::new(AudioService { volume: 2 });

        registry.register(Arc::clone(&first), false);
        let previous = registry.register(Arc::clone(&second), false).unwrap();

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&registry.get::<AudioService>().unwrap(), &first));

        let stats = registry.stats();
        assert_eq!(stats.registrations, 2);
        assert_eq!(stats.duplicate_registrations, 1);
        assert_eq!(stats.forced_overwrites, 0);
    }

    #[test]
    fn test_duplicate_with_force_replaces() {
        let registry = ServiceRegistry::new();
        let first = Arc::new(AudioService { volume: 1 });
        let second = Arc::new(AudioService { volume: 2 });

        registry.register(Arc::clone(&first), false);
        let previous = registry.register(Arc::clone(&second), true).unwrap();

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&registry.get::<AudioService>().unwrap(), &second));
        assert_eq!(registry.stats().forced_overwrites, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_force_on_empty_registers_normally() {
        let registry = ServiceRegistry::new();
        assert!(registry.register(Arc::new(InputService), true).is_none());
        assert!(registry.contains::<InputService>());
        assert_eq!(registry.stats().forced_overwrites, 0);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let registry = ServiceRegistry::new();
        assert!(registry.get::<AudioService>().is_none());

        let stats = registry.stats();
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.missing_lookups, 1);
    }

    #[test]
    fn test_unregister_returns_removed_and_repeat_is_noop() {
        let registry = ServiceRegistry::new();
        let audio = Arc::new(AudioService { volume: 3 });
        registry.register(Arc::clone(&audio), false);

        let removed = registry.unregister::<AudioService>().unwrap();
        assert!(Arc::ptr_eq(&removed, &audio));
        assert!(registry.get::<AudioService>().is_none());

        assert!(registry.unregister::<AudioService>().is_none());

        let stats = registry.stats();
        assert_eq!(stats.unregistrations, 1);
        assert_eq!(stats.missing_unregistrations, 1);
    }

    #[test]
    fn test_trait_object_keys_are_distinct_from_concrete() {
        let registry = ServiceRegistry::new();
        let logger: Arc<dyn Logger> = Arc::new(NamedLogger("console"));
        registry.register(logger, false);

        assert_eq!(registry.get::<dyn Logger>().unwrap().name(), "console");
        assert!(!registry.contains::<NamedLogger>());
    }

    #[test]
    fn test_try_register_rejects_duplicate() {
        let registry = ServiceRegistry::new();
        let first = Arc::new(AudioService { volume: 1 });

        registry.try_register(Arc::clone(&first)).unwrap();
        let err = registry
            .try_register(Arc::new(AudioService { volume: 9 }))
            .unwrap_err();

        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));
        assert!(Arc::ptr_eq(&registry.get::<AudioService>().unwrap(), &first));

        let stats = registry.stats();
        assert_eq!(stats.registrations, 2);
        assert_eq!(stats.duplicate_registrations, 1);
    }

    #[test]
    fn test_register_and_try_register_count_duplicates_alike() {
        let registry = ServiceRegistry::with_config(RegistryConfig::quiet());
        registry.register(Arc::new(InputService), false);
        registry.register(Arc::new(InputService), false);
        let _ = registry.try_register(Arc::new(InputService));

        let stats = registry.stats();
        assert_eq!(stats.registrations, 3);
        assert_eq!(stats.duplicate_registrations, 2);
        assert_eq!(stats.total_services, 1);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let config = RegistryConfig {
            initial_capacity: usize::MAX / 2,
            ..RegistryConfig::quiet()
        };
        assert!(config.validate().is_err());

        let registry = ServiceRegistry::with_config(config);
        registry.register(Arc::new(InputService), false);
        assert!(registry.contains::<InputService>());
        assert_eq!(registry.config().initial_capacity, usize::MAX / 2);
    }

    /// Calls back into the registry that owns it when dropped
    struct ShutdownHook {
        registry: Arc<ServiceRegistry>,
        observed_len: Arc<AtomicU64>,
    }

    impl Drop for ShutdownHook {
        fn drop(&mut self) {
            let len = self.registry.len() as u64;
            let _ = self.registry.get::<AudioService>();
            self.observed_len.store(len + 1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_clear_allows_reentrant_drop() {
        let registry = Arc::new(ServiceRegistry::with_config(RegistryConfig::quiet()));
        let observed_len = Arc::new(AtomicU64::new(0));
        registry.register(
            Arc::new(ShutdownHook {
                registry: Arc::clone(&registry),
                observed_len: Arc::clone(&observed_len),
            }),
            false,
        );
        registry.register(Arc::new(AudioService { volume: 1 }), false);

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = Arc::clone(&registry);
        std::thread::spawn(move || {
            let _ = tx.send(worker.clear());
        });

        let removed = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("clear() did not finish while a service re-entered the registry");
        assert_eq!(removed, 2);
        assert!(registry.is_empty());
        // The hook ran after both entries were gone
        assert_eq!(observed_len.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_require() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.require::<InputService>(),
            Err(RegistryError::NotRegistered { type_name }) if type_name.ends_with("InputService")
        ));

        registry.register(Arc::new(InputService), false);
        assert!(registry.require::<InputService>().is_ok());
    }

    #[test]
    fn test_clear_does_not_drop_held_instances() {
        let registry = ServiceRegistry::new();
        let audio = Arc::new(AudioService { volume: 5 });
        registry.register(Arc::clone(&audio), false);
        registry.register(Arc::new(InputService), false);

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert_eq!(Arc::strong_count(&audio), 1);
        assert_eq!(audio.volume, 5);
    }

    #[test]
    fn test_registered_services_sorted() {
        let registry = ServiceRegistry::new();
        registry.register(Arc::new(InputService), false);
        registry.register(Arc::new(AudioService { volume: 0 }), false);

        let names: Vec<&str> = registry
            .registered_services()
            .iter()
            .map(|info| info.type_name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("AudioService"));
        assert!(names[1].ends_with("InputService"));
    }

    #[test]
    fn test_configure_replaces_config() {
        let registry = ServiceRegistry::new();
        registry.configure(RegistryConfig {
            trace_operations: true,
            ..RegistryConfig::quiet()
        });

        let config = registry.config();
        assert!(config.trace_operations);
        assert!(!config.warn_on_missing);

        // Quiet paths still return sentinels
        assert!(registry.get::<InputService>().is_none());
        assert!(registry.unregister::<InputService>().is_none());
    }
}
