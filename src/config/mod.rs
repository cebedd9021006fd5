//! # Registry Configuration
//!
//! Diagnostics and sizing knobs for [`ServiceRegistry`](crate::ServiceRegistry).
//!
//! ## Sources
//!
//! Values are layered, later sources winning:
//!
//! 1. Built-in defaults ([`RegistryConfig::default`])
//! 2. An optional TOML/YAML/JSON file
//! 3. Environment variables prefixed `SERVICE_REGISTRY_`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use service_registry::{RegistryConfig, ServiceRegistry};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::load(Some(Path::new("config/registry.toml")))?;
//! let registry = ServiceRegistry::with_config(config);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Upper bound for `initial_capacity`; anything larger is almost certainly a typo
pub const MAX_INITIAL_CAPACITY: usize = 65_536;

/// Registry behavior settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Emit a warning when a type is registered twice
    pub warn_on_duplicate: bool,

    /// Emit a warning when `get`/`unregister` hit an unregistered type
    pub warn_on_missing: bool,

    /// Emit debug events for successful operations
    pub trace_operations: bool,

    /// Number of entries the backing map is pre-sized for
    pub initial_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            warn_on_duplicate: true,
            warn_on_missing: true,
            trace_operations: false,
            initial_capacity: 16,
        }
    }
}

impl RegistryConfig {
    /// Configuration with every diagnostic switched off
    pub fn quiet() -> Self {
        Self {
            warn_on_duplicate: false,
            warn_on_missing: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(RegistryError::Configuration(format!(
                "initial_capacity {} exceeds maximum of {MAX_INITIAL_CAPACITY}",
                self.initial_capacity
            )));
        }
        Ok(())
    }
}
