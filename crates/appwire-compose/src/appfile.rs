//! YAML/JSON application descriptions.
//!
//! An app file declares resources and their relationships. Loading it
//! replays every declaration through the same registration operations the
//! library exposes, so merges and conflicts behave identically.

use std::collections::BTreeMap;
use std::path::Path;

use appwire_common::error::{AppwireError, Result};
use appwire_common::types::ResourceId;
use serde::{Deserialize, Serialize};

use crate::annotations::AllocatedEndpoint;
use crate::resource::{AppModel, ResourceKind};

/// Root of an app file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFile {
    /// Resource declarations, in order.
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
}

/// One resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// Resource name.
    pub name: String,
    /// Resource kind and its fields.
    #[serde(flatten)]
    pub kind: ResourceKind,
    /// Connection string exposed by the resource itself.
    #[serde(default)]
    pub connection_string: Option<String>,
    /// Literal environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Declared service bindings.
    #[serde(default)]
    pub bindings: Vec<BindingDecl>,
    /// Endpoints that are already allocated.
    #[serde(default)]
    pub endpoints: Vec<EndpointDecl>,
    /// Service references to other resources.
    #[serde(default)]
    pub references: Vec<ReferenceDecl>,
    /// Connection-string references to other resources.
    #[serde(default)]
    pub connection_strings: Vec<ConnectionDecl>,
    /// Leave the resource out of the manifest.
    #[serde(default)]
    pub exclude_from_manifest: bool,
}

/// A `bindings` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDecl {
    /// Binding name.
    #[serde(default)]
    pub name: Option<String>,
    /// URI scheme.
    #[serde(default)]
    pub scheme: Option<String>,
    /// Host port.
    #[serde(default)]
    pub port: Option<u16>,
}

/// An `endpoints` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDecl {
    /// Binding the endpoint instantiates.
    pub binding: String,
    /// URI scheme.
    pub scheme: String,
    /// Host address.
    pub address: String,
    /// Port.
    pub port: u16,
}

/// A `references` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDecl {
    /// Referenced resource name.
    pub resource: String,
    /// Single binding to reference; all bindings when absent.
    #[serde(default)]
    pub binding: Option<String>,
}

/// A `connection_strings` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDecl {
    /// Resource providing the connection string.
    pub resource: String,
    /// Variable suffix override.
    #[serde(default)]
    pub name: Option<String>,
    /// Skip instead of failing when unresolved.
    #[serde(default)]
    pub optional: bool,
}

impl AppFile {
    /// Reads an app file, as JSON for `.json` paths and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading app file");
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
            Self::parse_yaml(&content)
        }
    }

    /// Parses YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid app file.
    pub fn parse_yaml(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Builds the application model.
    ///
    /// All resources are declared first so references may point forward.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate resources, duplicate binding names, or
    /// references to undeclared resources.
    pub fn into_model(self) -> Result<AppModel> {
        let mut model = AppModel::new();
        let mut ids = Vec::with_capacity(self.resources.len());
        for decl in &self.resources {
            let id = model.add_resource(decl.name.clone(), decl.kind.clone())?;
            if let Some(ref value) = decl.connection_string {
                let _ = model.resource_mut(id)?.with_connection_string(value.clone());
            }
            ids.push(id);
        }

        for (decl, id) in self.resources.into_iter().zip(ids) {
            apply_decl(&mut model, id, decl)?;
        }
        Ok(model)
    }
}

fn apply_decl(model: &mut AppModel, id: ResourceId, decl: ResourceDecl) -> Result<()> {
    {
        let resource = model.resource_mut(id)?;
        for (name, value) in decl.env {
            let _ = resource.add_named_value(name, value);
        }
        for binding in &decl.bindings {
            let _ = resource.add_service_binding(
                binding.port,
                binding.scheme.as_deref(),
                binding.name.as_deref(),
            )?;
        }
        for endpoint in decl.endpoints {
            let _ = resource.with_allocated_endpoint(AllocatedEndpoint::new(
                endpoint.binding,
                endpoint.scheme,
                endpoint.address,
                endpoint.port,
            ));
        }
    }

    for reference in &decl.references {
        let target = lookup(model, &reference.resource)?;
        model.with_reference(id, target, reference.binding.as_deref())?;
    }
    for connection in &decl.connection_strings {
        let source = lookup(model, &connection.resource)?;
        model.with_connection_string_reference(
            id,
            source,
            connection.name.as_deref(),
            connection.optional,
        )?;
    }

    if decl.exclude_from_manifest {
        let _ = model.resource_mut(id)?.exclude_from_manifest();
    }
    Ok(())
}

fn lookup(model: &AppModel, name: &str) -> Result<ResourceId> {
    model
        .find(name)
        .map(crate::resource::Resource::id)
        .ok_or_else(|| AppwireError::NotFound {
            kind: "resource",
            id: name.to_string(),
        })
}
