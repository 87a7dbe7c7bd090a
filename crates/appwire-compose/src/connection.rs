//! Connection-string references.
//!
//! In manifest mode the variable is always a `{source.connectionString}`
//! placeholder. In run mode the value comes from the source resource or,
//! failing that, from configuration.

use appwire_common::config::ConnectionStringLookup;
use appwire_common::constants::{connection_string_placeholder, connection_string_var};
use appwire_common::error::{ConfigurationError, Result};
use appwire_common::types::ResourceId;

use crate::callbacks::{ContextCallback, EnvironmentContext};
use crate::resource::{AppModel, Resource};

/// A declared dependency on another resource's connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStringReference {
    /// Resource providing the connection string.
    pub source: ResourceId,
    /// Overrides the variable suffix; defaults to the source name.
    pub connection_name: Option<String>,
    /// When set, an unresolvable value is skipped instead of failing.
    pub optional: bool,
}

impl Resource {
    /// Registers a `ConnectionStrings__*` variable fed by `source`.
    pub fn with_connection_string_reference(
        &mut self,
        source: ResourceId,
        connection_name: Option<&str>,
        optional: bool,
    ) -> &mut Self {
        tracing::debug!(
            resource = %self.name(),
            %source,
            connection_name,
            optional,
            "registering connection string reference"
        );
        self.add_context_callback(ContextCallback::ConnectionString(
            ConnectionStringReference {
                source,
                connection_name: connection_name.map(str::to_string),
                optional,
            },
        ))
    }
}

/// Resolves the concrete connection string of `source`. Configuration is
/// only consulted when the resource exposes no value at all; an empty
/// result from either place counts as unresolved.
#[must_use]
pub fn resolve_connection_string(
    source: &Resource,
    lookup: &dyn ConnectionStringLookup,
) -> Option<String> {
    match source.connection_string() {
        Some(value) => Some(value.to_string()),
        None => lookup.connection_string(source.name()),
    }
    .filter(|s| !s.is_empty())
}

/// Writes the variable for `reference` into `context`.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnresolvedConnectionString`] when a
/// required value cannot be resolved in run mode, or an error if the source
/// is not part of the model.
pub(crate) fn populate_connection_string(
    model: &AppModel,
    reference: &ConnectionStringReference,
    lookup: &dyn ConnectionStringLookup,
    context: &mut EnvironmentContext,
) -> Result<()> {
    let source = model.resource(reference.source)?;
    let variable =
        connection_string_var(reference.connection_name.as_deref().unwrap_or(source.name()));

    if context.mode().is_manifest() {
        context.set(variable, connection_string_placeholder(source.name()));
        return Ok(());
    }

    match resolve_connection_string(source, lookup) {
        Some(value) => {
            context.set(variable, value);
            Ok(())
        }
        None if reference.optional => {
            tracing::warn!(source = %source.name(), %variable, "optional connection string not resolved, skipping");
            Ok(())
        }
        None => Err(ConfigurationError::UnresolvedConnectionString {
            resource: source.name().to_string(),
        }
        .into()),
    }
}
