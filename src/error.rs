use thiserror::Error;

/// Errors surfaced by the strict registry APIs and configuration loading.
///
/// The soft operations (`register`, `get`, `unregister`) never return these;
/// they log a warning and hand back a sentinel instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A service of this type already has an entry
    #[error("Service of type {type_name} is already registered")]
    AlreadyRegistered { type_name: &'static str },

    /// No service of this type has an entry
    #[error("Service of type {type_name} is not registered")]
    NotRegistered { type_name: &'static str },

    /// The process-wide registry was created before `init_global` ran
    #[error("Global service registry is already initialized")]
    AlreadyInitialized,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::Configuration(err.to_string())
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_keep_diagnostic_wording() {
        let err = RegistryError::AlreadyRegistered {
            type_name: "game::Logger",
        };
        assert_eq!(
            err.to_string(),
            "Service of type game::Logger is already registered"
        );

        let err = RegistryError::NotRegistered {
            type_name: "game::Logger",
        };
        assert_eq!(err.to_string(), "Service of type game::Logger is not registered");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: RegistryError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, RegistryError::Configuration(ref msg) if msg.contains("bad value")));
    }
}
