//! Endpoint allocation for declared service bindings.
//!
//! Every binding without an endpoint gets one on the configured host.
//! Bindings with a host port keep it; the rest receive the next port
//! counting up from the configured base, skipping ports already in use.

use std::collections::BTreeSet;

use appwire_common::config::AppwireConfig;
use appwire_common::constants::DEFAULT_SCHEME;
use appwire_common::error::{AppwireError, Result};

use crate::annotations::{AllocatedEndpoint, ServiceBinding};
use crate::resource::{AppModel, Resource};

impl Resource {
    /// Records an endpoint allocated outside of [`allocate_endpoints`].
    /// An endpoint already recorded for the same binding is replaced.
    pub fn with_allocated_endpoint(&mut self, endpoint: AllocatedEndpoint) -> &mut Self {
        tracing::debug!(resource = %self.name(), binding = %endpoint.binding_name, "endpoint recorded");
        self.annotations_mut().push_endpoint(endpoint);
        self
    }
}

/// Allocates endpoints for every unallocated binding and returns how many
/// were created. Existing endpoints are left untouched.
///
/// # Errors
///
/// Returns an error if the port range above the base port is exhausted.
pub fn allocate_endpoints(model: &mut AppModel, config: &AppwireConfig) -> Result<usize> {
    let mut used: BTreeSet<u16> = BTreeSet::new();
    for resource in model.resources() {
        let annotations = resource.annotations();
        used.extend(annotations.service_bindings().iter().filter_map(|b| b.port));
        used.extend(annotations.endpoints().iter().map(|e| e.port));
    }

    let mut next = config.base_port;
    let mut allocated = 0;
    for resource in model.resources_mut() {
        let pending: Vec<ServiceBinding> = resource
            .annotations()
            .service_bindings()
            .iter()
            .filter(|b| resource.annotations().endpoint(b.effective_name()).is_none())
            .cloned()
            .collect();

        for binding in pending {
            let port = match binding.port {
                Some(port) => port,
                None => next_free_port(&mut next, &mut used)?,
            };
            let endpoint = AllocatedEndpoint::new(
                binding.effective_name(),
                binding.scheme.as_deref().unwrap_or(DEFAULT_SCHEME),
                config.default_host.clone(),
                port,
            );
            tracing::debug!(
                resource = %resource.name(),
                binding = %endpoint.binding_name,
                uri = %endpoint.uri_string(),
                "endpoint allocated"
            );
            resource.annotations_mut().push_endpoint(endpoint);
            allocated += 1;
        }
    }

    tracing::info!(allocated, "endpoint allocation finished");
    Ok(allocated)
}

fn next_free_port(next: &mut u16, used: &mut BTreeSet<u16>) -> Result<u16> {
    while used.contains(next) {
        *next = next
            .checked_add(1)
            .ok_or_else(|| AppwireError::invalid("no free port left for endpoint allocation"))?;
    }
    let port = *next;
    let _ = used.insert(port);
    *next = port.saturating_add(1);
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn config(base_port: u16) -> AppwireConfig {
        AppwireConfig {
            base_port,
            ..AppwireConfig::default()
        }
    }

    #[test]
    fn host_ports_are_kept_and_others_count_up() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        let _ = model
            .resource_mut(api)
            .expect("api")
            .add_service_binding(Some(9001), Some("http"), Some("public"))
            .expect("public")
            .add_service_binding(None, Some("http"), Some("admin"))
            .expect("admin")
            .add_service_binding(None, Some("grpc"), None)
            .expect("grpc");

        let count = allocate_endpoints(&mut model, &config(9000)).expect("allocate");
        assert_eq!(count, 3);

        let endpoints = model.resource(api).expect("api").annotations().endpoints();
        assert_eq!(endpoints[0].uri_string(), "http://localhost:9001");
        assert_eq!(endpoints[1].binding_name, "admin");
        assert_eq!(endpoints[1].port, 9000);
        assert_eq!(endpoints[2].binding_name, "grpc");
        assert_eq!(endpoints[2].port, 9002);
    }

    #[test]
    fn existing_endpoints_are_not_replaced() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        {
            let resource = model.resource_mut(api).expect("api");
            let _ = resource
                .add_service_binding(None, Some("http"), None)
                .expect("binding");
            resource
                .annotations_mut()
                .push_endpoint(AllocatedEndpoint::new("http", "http", "10.0.0.5", 80));
        }

        let count = allocate_endpoints(&mut model, &config(9000)).expect("allocate");
        assert_eq!(count, 0);
        let endpoints = model.resource(api).expect("api").annotations().endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].address, "10.0.0.5");
    }

    #[test]
    fn allocation_is_idempotent() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        let _ = model
            .resource_mut(api)
            .expect("api")
            .add_service_binding(None, None, None)
            .expect("binding");

        assert_eq!(allocate_endpoints(&mut model, &config(9000)).expect("first"), 1);
        assert_eq!(allocate_endpoints(&mut model, &config(9000)).expect("second"), 0);
        let endpoint = &model.resource(api).expect("api").annotations().endpoints()[0];
        assert_eq!(endpoint.qualified_uri_string(), "http://localhost:9000");
    }

    #[test]
    fn every_accepted_binding_gets_its_own_endpoint() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        let resource = model.resource_mut(api).expect("api");
        let _ = resource
            .add_service_binding(None, Some("http"), None)
            .expect("unnamed http");
        assert!(
            resource
                .add_service_binding(Some(9999), Some("grpc"), Some("http"))
                .is_err()
        );
        let _ = resource
            .add_service_binding(Some(9999), Some("grpc"), Some("rpc"))
            .expect("rpc");

        let count = allocate_endpoints(&mut model, &config(8000)).expect("allocate");
        let endpoints = model.resource(api).expect("api").annotations().endpoints();
        assert_eq!(count, 2);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].uri_string(), "http://localhost:8000");
        assert_eq!(endpoints[1].qualified_uri_string(), "rpc://localhost:9999");
    }

    #[test]
    fn exhausted_port_range_fails() {
        let mut next = u16::MAX;
        let mut used = BTreeSet::from([u16::MAX]);
        assert!(next_free_port(&mut next, &mut used).is_err());
    }
}
