//! Manifest publishing directives and manifest emission.
//!
//! The manifest describes every resource declaratively: environment
//! values are rendered in manifest mode, so connection strings and
//! endpoints appear as placeholders rather than resolved values.

use std::fmt;

use appwire_common::config::ConnectionStringLookup;
use appwire_common::constants::{DEFAULT_SCHEME, connection_string_placeholder};
use appwire_common::error::Result;
use appwire_common::types::PublishMode;
use serde_json::{Map, Value, json};

use crate::annotations::ServiceBinding;
use crate::populate::populate_environment;
use crate::resource::{AppModel, Resource, ResourceKind};

/// Writer replacing the default manifest entry of a resource.
pub type ManifestWriter = Box<dyn Fn(&Resource) -> Value>;

/// How a resource appears in the manifest. A resource holds at most one.
pub enum ManifestDirective {
    /// Leave the resource out of the manifest.
    Ignore,
    /// Emit a custom entry.
    Custom(ManifestWriter),
}

impl fmt::Debug for ManifestDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => f.write_str("Ignore"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Resource {
    /// Leaves the resource out of the manifest, replacing any directive.
    pub fn exclude_from_manifest(&mut self) -> &mut Self {
        tracing::debug!(resource = %self.name(), "excluding from manifest");
        self.annotations_mut()
            .set_manifest_directive(ManifestDirective::Ignore);
        self
    }

    /// Emits `writer`'s output as the manifest entry, replacing any directive.
    pub fn with_manifest_writer<F>(&mut self, writer: F) -> &mut Self
    where
        F: Fn(&Resource) -> Value + 'static,
    {
        self.annotations_mut()
            .set_manifest_directive(ManifestDirective::Custom(Box::new(writer)));
        self
    }
}

/// Builds the manifest document for `model`.
///
/// # Errors
///
/// Returns an error if populating a resource's environment fails.
pub fn write_manifest(model: &AppModel, lookup: &dyn ConnectionStringLookup) -> Result<Value> {
    tracing::info!(resources = model.len(), "writing manifest");
    let mut resources = Map::new();
    for resource in model.resources() {
        let entry = match resource.annotations().manifest_directive() {
            Some(ManifestDirective::Ignore) => {
                tracing::debug!(resource = %resource.name(), "skipped by manifest directive");
                continue;
            }
            Some(ManifestDirective::Custom(writer)) => writer(resource),
            None => default_entry(model, resource, lookup)?,
        };
        let _ = resources.insert(resource.name().to_string(), entry);
    }
    Ok(json!({ "resources": resources }))
}

fn default_entry(
    model: &AppModel,
    resource: &Resource,
    lookup: &dyn ConnectionStringLookup,
) -> Result<Value> {
    let mut entry = Map::new();
    let _ = entry.insert("type".into(), resource.kind().manifest_type().into());

    match resource.kind() {
        ResourceKind::Project { path } => {
            let _ = entry.insert("path".into(), path.clone().into());
        }
        ResourceKind::Container { image } => {
            let _ = entry.insert("image".into(), image.clone().into());
        }
        ResourceKind::Executable { command, args } => {
            let _ = entry.insert("command".into(), command.clone().into());
            let _ = entry.insert("args".into(), args.clone().into());
        }
        ResourceKind::ConnectionString | ResourceKind::Parameter => {}
    }

    if resource.connection_string().is_some() {
        let _ = entry.insert(
            "connectionString".into(),
            connection_string_placeholder(resource.name()).into(),
        );
    }

    let env = populate_environment(model, resource.id(), PublishMode::Manifest, lookup)?;
    if !env.is_empty() {
        let _ = entry.insert("env".into(), serde_json::to_value(env)?);
    }

    let bindings = resource.annotations().service_bindings();
    if !bindings.is_empty() {
        let mut map = Map::new();
        for binding in bindings {
            let _ = map.insert(binding.effective_name().to_string(), binding_entry(binding));
        }
        let _ = entry.insert("bindings".into(), Value::Object(map));
    }

    Ok(Value::Object(entry))
}

fn binding_entry(binding: &ServiceBinding) -> Value {
    let scheme = binding.scheme.as_deref().unwrap_or(DEFAULT_SCHEME);
    let transport = match scheme {
        "http" | "https" | "http2" => "http".to_string(),
        _ => binding.protocol.to_string(),
    };
    let mut entry = json!({
        "scheme": scheme,
        "protocol": binding.protocol.to_string(),
        "transport": transport,
    });
    if let (Some(port), Value::Object(map)) = (binding.port, &mut entry) {
        let _ = map.insert("port".into(), port.into());
    }
    entry
}
