//! Service reference tracking and `services__*` population.
//!
//! A destination holds at most one relationship per target resource.
//! Repeated references merge into that relationship, and exactly one
//! population callback is registered for it.

use std::collections::BTreeSet;

use appwire_common::constants::service_var;
use appwire_common::error::Result;
use appwire_common::types::ResourceId;

use crate::annotations::AllocatedEndpoint;
use crate::callbacks::{ContextCallback, EnvironmentContext};
use crate::endpoint::ambiguous_schemes;
use crate::resource::{AppModel, Resource};

/// A tracked dependency of one resource on another's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReference {
    target: ResourceId,
    binding_names: BTreeSet<String>,
    use_all_bindings: bool,
}

impl ServiceReference {
    pub(crate) const fn new(target: ResourceId) -> Self {
        Self {
            target,
            binding_names: BTreeSet::new(),
            use_all_bindings: false,
        }
    }

    /// Referenced resource.
    #[must_use]
    pub const fn target(&self) -> ResourceId {
        self.target
    }

    /// Binding names requested so far.
    #[must_use]
    pub const fn binding_names(&self) -> &BTreeSet<String> {
        &self.binding_names
    }

    /// Whether every binding of the target is referenced. Once set it
    /// dominates any explicit binding names.
    #[must_use]
    pub const fn use_all_bindings(&self) -> bool {
        self.use_all_bindings
    }

    fn includes(&self, endpoint: &AllocatedEndpoint) -> bool {
        self.use_all_bindings || self.binding_names.contains(&endpoint.binding_name)
    }
}

impl Resource {
    /// References `target`'s binding `binding`, or all of its bindings when
    /// `binding` is `None`.
    pub fn apply_binding(&mut self, target: ResourceId, binding: Option<&str>) -> &mut Self {
        let name = self.name().to_string();
        let (reference, created) = self.annotations_mut().reference_entry(target);
        match binding {
            None => reference.use_all_bindings = true,
            Some(binding) => {
                let _ = reference.binding_names.insert(binding.to_string());
            }
        }
        tracing::debug!(resource = %name, %target, binding, created, "service reference applied");
        if created {
            let _ = self.add_context_callback(ContextCallback::ServiceReference { target });
        }
        self
    }
}

/// Writes `services__{target}__{i}` for every endpoint the relationship
/// selects. Every endpoint gets its qualified URI; endpoints whose scheme
/// is unique among the selection also get their plain URI. One counter is
/// shared by both forms.
///
/// # Errors
///
/// Returns an error if the target is no longer part of the model.
pub(crate) fn populate_service_reference(
    model: &AppModel,
    destination: &Resource,
    target: ResourceId,
    context: &mut EnvironmentContext,
) -> Result<()> {
    let Some(reference) = destination.annotations().service_reference(target) else {
        return Ok(());
    };
    let target = model.resource(target)?;

    let endpoints: Vec<&AllocatedEndpoint> = target
        .annotations()
        .endpoints()
        .iter()
        .filter(|e| reference.includes(e))
        .collect();
    let ambiguous = ambiguous_schemes(endpoints.iter().copied());

    let mut index = 0;
    for endpoint in &endpoints {
        context.set(service_var(target.name(), index), endpoint.qualified_uri_string());
        index += 1;
        if !ambiguous.contains(endpoint.uri_scheme.as_str()) {
            context.set(service_var(target.name(), index), endpoint.uri_string());
            index += 1;
        }
    }

    tracing::debug!(
        resource = %destination.name(),
        target = %target.name(),
        endpoints = endpoints.len(),
        variables = index,
        "service reference populated"
    );
    Ok(())
}
