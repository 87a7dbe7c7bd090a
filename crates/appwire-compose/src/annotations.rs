//! Typed per-resource annotation table.
//!
//! Each annotation kind has its own slot. Ordered kinds (callbacks,
//! bindings, endpoints, references) keep insertion order; the manifest
//! directive is a single optional slot, so a resource can never hold two.

use std::collections::HashMap;
use std::fmt;

use appwire_common::constants::{DEFAULT_PROTOCOL, DEFAULT_SCHEME};
use appwire_common::types::ResourceId;
use serde::{Deserialize, Serialize};

use crate::callbacks::EnvironmentCallback;
use crate::manifest::ManifestDirective;
use crate::reference::ServiceReference;

/// Transport protocol of a service binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str(DEFAULT_PROTOCOL),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// A declared, not yet allocated, network entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    /// Transport protocol.
    pub protocol: Protocol,
    /// URI scheme, e.g. `http` or `grpc`.
    pub scheme: Option<String>,
    /// Binding name, unique per resource.
    pub name: Option<String>,
    /// Host port requested for the binding.
    pub port: Option<u16>,
}

impl ServiceBinding {
    /// Name the binding is known by: its own name, else its scheme, else
    /// the default scheme. Unique per resource.
    #[must_use]
    pub fn effective_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.scheme.as_deref())
            .unwrap_or(DEFAULT_SCHEME)
    }
}

/// A concrete endpoint allocated for one of a resource's bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedEndpoint {
    /// Name of the binding this endpoint instantiates.
    pub binding_name: String,
    /// URI scheme of the endpoint.
    pub uri_scheme: String,
    /// Host address.
    pub address: String,
    /// Allocated port.
    pub port: u16,
}

impl AllocatedEndpoint {
    /// Creates an endpoint record.
    #[must_use]
    pub fn new(
        binding_name: impl Into<String>,
        uri_scheme: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            binding_name: binding_name.into(),
            uri_scheme: uri_scheme.into(),
            address: address.into(),
            port,
        }
    }

    /// `address:port`.
    #[must_use]
    pub fn endpoint_string(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// URI keyed by the binding name, unique even when schemes collide.
    #[must_use]
    pub fn qualified_uri_string(&self) -> String {
        format!("{}://{}", self.binding_name, self.endpoint_string())
    }

    /// URI keyed by the scheme.
    #[must_use]
    pub fn uri_string(&self) -> String {
        format!("{}://{}", self.uri_scheme, self.endpoint_string())
    }
}

/// Lookup key for an endpoint, resolved against the owner when read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointReference {
    /// Resource owning the endpoint.
    pub owner: ResourceId,
    /// Binding name on the owner.
    pub binding_name: String,
}

impl EndpointReference {
    /// Creates a reference to `owner`'s `binding_name` endpoint.
    #[must_use]
    pub fn new(owner: ResourceId, binding_name: impl Into<String>) -> Self {
        Self {
            owner,
            binding_name: binding_name.into(),
        }
    }
}

/// All annotations attached to one resource.
#[derive(Debug, Default)]
pub struct Annotations {
    environment: Vec<EnvironmentCallback>,
    references: Vec<ServiceReference>,
    reference_index: HashMap<ResourceId, usize>,
    bindings: Vec<ServiceBinding>,
    endpoints: Vec<AllocatedEndpoint>,
    manifest: Option<ManifestDirective>,
}

impl Annotations {
    /// Environment callbacks in registration order.
    #[must_use]
    pub fn environment_callbacks(&self) -> &[EnvironmentCallback] {
        &self.environment
    }

    /// Service references in first-registration order.
    #[must_use]
    pub fn service_references(&self) -> &[ServiceReference] {
        &self.references
    }

    /// The relationship tracked for `target`, if any.
    #[must_use]
    pub fn service_reference(&self, target: ResourceId) -> Option<&ServiceReference> {
        self.reference_index
            .get(&target)
            .and_then(|&pos| self.references.get(pos))
    }

    /// Declared service bindings.
    #[must_use]
    pub fn service_bindings(&self) -> &[ServiceBinding] {
        &self.bindings
    }

    /// Allocated endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[AllocatedEndpoint] {
        &self.endpoints
    }

    /// The endpoint allocated for `binding_name`.
    #[must_use]
    pub fn endpoint(&self, binding_name: &str) -> Option<&AllocatedEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.binding_name == binding_name)
    }

    /// The manifest publishing directive.
    #[must_use]
    pub const fn manifest_directive(&self) -> Option<&ManifestDirective> {
        self.manifest.as_ref()
    }

    pub(crate) fn push_environment(&mut self, callback: EnvironmentCallback) {
        self.environment.push(callback);
    }

    /// Returns the relationship for `target` and whether it was just created.
    pub(crate) fn reference_entry(&mut self, target: ResourceId) -> (&mut ServiceReference, bool) {
        if let Some(&pos) = self.reference_index.get(&target) {
            return (&mut self.references[pos], false);
        }
        let pos = self.references.len();
        self.references.push(ServiceReference::new(target));
        let _ = self.reference_index.insert(target, pos);
        (&mut self.references[pos], true)
    }

    pub(crate) fn push_binding(&mut self, binding: ServiceBinding) {
        self.bindings.push(binding);
    }

    /// Records `endpoint`, replacing one already allocated for the same
    /// binding in place.
    pub(crate) fn push_endpoint(&mut self, endpoint: AllocatedEndpoint) {
        match self
            .endpoints
            .iter_mut()
            .find(|e| e.binding_name == endpoint.binding_name)
        {
            Some(existing) => *existing = endpoint,
            None => self.endpoints.push(endpoint),
        }
    }

    /// Replaces any existing directive.
    pub(crate) fn set_manifest_directive(&mut self, directive: ManifestDirective) {
        self.manifest = Some(directive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uri_forms() {
        let endpoint = AllocatedEndpoint::new("admin", "http", "localhost", 5001);
        assert_eq!(endpoint.endpoint_string(), "localhost:5001");
        assert_eq!(endpoint.qualified_uri_string(), "admin://localhost:5001");
        assert_eq!(endpoint.uri_string(), "http://localhost:5001");
    }

    #[test]
    fn effective_name_falls_back_to_scheme_then_default() {
        let mut binding = ServiceBinding {
            protocol: Protocol::Tcp,
            scheme: None,
            name: None,
            port: None,
        };
        assert_eq!(binding.effective_name(), "http");
        binding.scheme = Some("grpc".into());
        assert_eq!(binding.effective_name(), "grpc");
        binding.name = Some("internal".into());
        assert_eq!(binding.effective_name(), "internal");
    }

    #[test]
    fn reference_entry_reuses_existing_record() {
        let mut annotations = Annotations::default();
        let target = ResourceId::generate();

        let (_, created) = annotations.reference_entry(target);
        assert!(created);
        let (_, created) = annotations.reference_entry(target);
        assert!(!created);
        assert_eq!(annotations.service_references().len(), 1);
        assert!(annotations.service_reference(target).is_some());
    }

    #[test]
    fn endpoint_lookup_by_binding_name() {
        let mut annotations = Annotations::default();
        annotations.push_endpoint(AllocatedEndpoint::new("http", "http", "localhost", 80));
        annotations.push_endpoint(AllocatedEndpoint::new("grpc", "grpc", "localhost", 81));

        assert_eq!(annotations.endpoint("grpc").map(|e| e.port), Some(81));
        assert!(annotations.endpoint("https").is_none());
    }

    #[test]
    fn endpoint_for_same_binding_is_replaced_in_place() {
        let mut annotations = Annotations::default();
        annotations.push_endpoint(AllocatedEndpoint::new("http", "http", "localhost", 80));
        annotations.push_endpoint(AllocatedEndpoint::new("grpc", "grpc", "localhost", 81));
        annotations.push_endpoint(AllocatedEndpoint::new("http", "http", "10.0.0.1", 8080));

        let endpoints = annotations.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].uri_string(), "http://10.0.0.1:8080");
    }

    #[test]
    fn manifest_directive_slot_replaces() {
        let mut annotations = Annotations::default();
        assert!(annotations.manifest_directive().is_none());
        annotations.set_manifest_directive(ManifestDirective::Ignore);
        annotations.set_manifest_directive(ManifestDirective::Ignore);
        assert!(matches!(
            annotations.manifest_directive(),
            Some(ManifestDirective::Ignore)
        ));
    }
}
