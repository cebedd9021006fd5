//! Configuration Loader
//!
//! Layers an optional config file under `SERVICE_REGISTRY_*` environment
//! variables using the `config` crate, then validates the result.

use super::RegistryConfig;
use crate::error::RegistryResult;
use config::{Config, Environment, File, Map};
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `SERVICE_REGISTRY_WARN_ON_MISSING=false`
pub const ENV_PREFIX: &str = "SERVICE_REGISTRY";

impl RegistryConfig {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> RegistryResult<Self> {
        Self::load_from_sources(path, None)
    }

    /// Load configuration with an explicit environment map instead of the
    /// process environment. Keys are full variable names including the prefix.
    pub fn load_from_sources(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> RegistryResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading registry configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let config: RegistryConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Registry configuration loaded: {}",
            serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string())
        );

        Ok(config)
    }
}
