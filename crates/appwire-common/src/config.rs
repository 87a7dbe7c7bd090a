//! Configuration model backing connection-string lookup and endpoint
//! allocation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{CONNECTION_STRINGS_PREFIX, DEFAULT_BASE_PORT, DEFAULT_HOST};
use crate::error::{AppwireError, Result};

/// External configuration queried for connection strings a resource does
/// not carry itself.
pub trait ConnectionStringLookup {
    /// Returns the configured connection string for `resource_name`.
    fn connection_string(&self, resource_name: &str) -> Option<String>;
}

impl ConnectionStringLookup for BTreeMap<String, String> {
    fn connection_string(&self, resource_name: &str) -> Option<String> {
        self.get(resource_name).cloned()
    }
}

/// Root configuration for an appwire run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppwireConfig {
    /// Connection strings keyed by resource name.
    #[serde(rename = "ConnectionStrings", default)]
    pub connection_strings: BTreeMap<String, String>,
    /// First port handed out to bindings without a host port.
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    /// Address recorded on allocated endpoints.
    #[serde(default = "default_host")]
    pub default_host: String,
}

const fn default_base_port() -> u16 {
    DEFAULT_BASE_PORT
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl Default for AppwireConfig {
    fn default() -> Self {
        Self {
            connection_strings: BTreeMap::new(),
            base_port: DEFAULT_BASE_PORT,
            default_host: DEFAULT_HOST.to_string(),
        }
    }
}

impl AppwireConfig {
    /// Loads configuration from a JSON (`.json`) or YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| AppwireError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Overlays `ConnectionStrings__{name}` variables on top of the loaded
    /// connection strings. Later entries win.
    #[must_use]
    pub fn with_env_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(CONNECTION_STRINGS_PREFIX) {
                if name.is_empty() {
                    continue;
                }
                tracing::debug!(name, "connection string overridden from environment");
                let _ = self.connection_strings.insert(name.to_string(), value);
            }
        }
        self
    }
}

impl ConnectionStringLookup for AppwireConfig {
    fn connection_string(&self, resource_name: &str) -> Option<String> {
        self.connection_strings.get(resource_name).cloned()
    }
}
