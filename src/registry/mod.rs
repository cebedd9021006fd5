//! # Registry Infrastructure
//!
//! Type-keyed service storage.
//!
//! ## Available Pieces
//!
//! - **ServiceRegistry**: explicitly constructed registry, one instance per type
//! - **global**: the process-wide registry and free functions delegating to it
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ServiceRegistry   (DashMap<TypeId, entry>, soft + strict APIs)
//! └── global            (OnceLock<ServiceRegistry> + register/get/unregister)
//! ```

pub mod global;
pub mod service_registry;

// Re-export main types for easy access
pub use service_registry::{RegistryStats, ServiceInfo, ServiceRegistry};
