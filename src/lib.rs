#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Service Registry
//!
//! Process-wide, type-keyed service locator for engine plugin environments.
//!
//! ## Overview
//!
//! Subsystems register a singleton instance under its static type and other
//! code retrieves it by that type, without explicit wiring. Three operations
//! carry the design:
//!
//! - `register` stores an instance, reporting (and optionally replacing) an
//!   existing one
//! - `get` returns the stored instance or `None`
//! - `unregister` removes the entry
//!
//! Duplicate registrations and missing lookups are diagnosed with a `tracing`
//! warning and never fail; the caller decides whether they matter.
//!
//! ## Module Organization
//!
//! - [`registry`] - `ServiceRegistry` and the process-wide instance
//! - [`config`] - Diagnostics and sizing configuration
//! - [`error`] - Error type for the strict APIs
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use service_registry::ServiceRegistry;
//! use std::sync::Arc;
//!
//! struct Logger {
//!     prefix: &'static str,
//! }
//!
//! let registry = ServiceRegistry::new();
//! let l1 = Arc::new(Logger { prefix: "L1" });
//! let l2 = Arc::new(Logger { prefix: "L2" });
//!
//! assert!(registry.register(Arc::clone(&l1), false).is_none());
//!
//! // Duplicate without force keeps the first instance
//! let previous = registry.register(Arc::clone(&l2), false).unwrap();
//! assert!(Arc::ptr_eq(&previous, &l1));
//! assert_eq!(registry.get::<Logger>().unwrap().prefix, "L1");
//!
//! // Forced registration replaces it
//! registry.register(Arc::clone(&l2), true);
//! assert_eq!(registry.get::<Logger>().unwrap().prefix, "L2");
//!
//! registry.unregister::<Logger>();
//! assert!(registry.get::<Logger>().is_none());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::global;
pub use registry::{RegistryStats, ServiceInfo, ServiceRegistry};
