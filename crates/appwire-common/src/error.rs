//! Unified error types for the appwire workspace.
//!
//! Wiring mistakes (duplicate binding names, required connection strings
//! that cannot be resolved) are grouped under [`ConfigurationError`] so
//! callers can tell a mis-wired application apart from I/O or parse
//! failures.

use std::path::PathBuf;

use thiserror::Error;

/// A mis-wired application. Always terminal for the current run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A service binding with the same name already exists on the resource.
    #[error("service binding \"{binding}\" already exists on resource \"{resource}\"")]
    BindingConflict {
        /// Resource owning the bindings.
        resource: String,
        /// Conflicting binding name (`<unnamed>` for the unnamed binding).
        binding: String,
    },

    /// A required connection string could not be resolved.
    #[error("connection string for resource \"{resource}\" could not be resolved")]
    UnresolvedConnectionString {
        /// Source resource whose connection string is missing.
        resource: String,
    },

    /// Two resources were declared with the same name.
    #[error("resource \"{name}\" is already declared")]
    DuplicateResource {
        /// Duplicated resource name.
        name: String,
    },

    /// Any other invalid configuration.
    #[error("{message}")]
    Invalid {
        /// Description of the invalid configuration.
        message: String,
    },
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum AppwireError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The application is mis-wired.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("yaml error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl AppwireError {
    /// Returns `true` when the error is a [`ConfigurationError`].
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Shorthand for [`ConfigurationError::Invalid`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::Invalid {
            message: message.into(),
        })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AppwireError>;
