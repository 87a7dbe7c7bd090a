//! Environment variable naming, reserved publisher names, and defaults.

/// Prefix of every connection-string environment variable.
pub const CONNECTION_STRINGS_PREFIX: &str = "ConnectionStrings__";

/// Prefix of every service-binding environment variable.
pub const SERVICES_PREFIX: &str = "services__";

/// Reserved publisher name for manifest generation.
pub const MANIFEST_PUBLISHER: &str = "manifest";

/// Publisher name for live resolution.
pub const RUN_PUBLISHER: &str = "run";

/// First port handed out by the endpoint allocator.
pub const DEFAULT_BASE_PORT: u16 = 8000;

/// Host used for allocated endpoints.
pub const DEFAULT_HOST: &str = "localhost";

/// Protocol recorded on every service binding.
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Scheme assumed for bindings declared without one.
pub const DEFAULT_SCHEME: &str = "http";

/// Builds the `ConnectionStrings__{name}` variable name.
#[must_use]
pub fn connection_string_var(connection_name: &str) -> String {
    format!("{CONNECTION_STRINGS_PREFIX}{connection_name}")
}

/// Builds the `services__{target}__{index}` variable name.
#[must_use]
pub fn service_var(target_name: &str, index: usize) -> String {
    format!("{SERVICES_PREFIX}{target_name}__{index}")
}

/// Manifest placeholder standing in for a resource's connection string.
#[must_use]
pub fn connection_string_placeholder(resource_name: &str) -> String {
    format!("{{{resource_name}.connectionString}}")
}

/// Manifest placeholder standing in for an endpoint URL.
#[must_use]
pub fn endpoint_placeholder(resource_name: &str, binding_name: &str) -> String {
    format!("{{{resource_name}.bindings.{binding_name}.url}}")
}
