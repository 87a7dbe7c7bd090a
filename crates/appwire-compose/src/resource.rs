//! The application model: named resources and their annotations.

use std::collections::HashMap;

use appwire_common::error::{AppwireError, ConfigurationError, Result};
use appwire_common::types::ResourceId;
use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;

/// What a resource is, as far as manifest emission cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceKind {
    /// A project built from source.
    Project {
        /// Path to the project.
        path: String,
    },
    /// A container image.
    Container {
        /// Image reference.
        image: String,
    },
    /// A local executable.
    Executable {
        /// Program to run.
        command: String,
        /// Program arguments.
        #[serde(default)]
        args: Vec<String>,
    },
    /// A connection string supplied entirely by configuration.
    ConnectionString,
    /// An externally supplied parameter.
    Parameter,
}

impl ResourceKind {
    /// Manifest `type` tag for this kind.
    #[must_use]
    pub const fn manifest_type(&self) -> &'static str {
        match self {
            Self::Project { .. } => "project.v0",
            Self::Container { .. } => "container.v0",
            Self::Executable { .. } => "executable.v0",
            Self::ConnectionString => "connectionstring.v0",
            Self::Parameter => "parameter.v0",
        }
    }
}

/// A named entity in the application model.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    name: String,
    kind: ResourceKind,
    connection_string: Option<String>,
    annotations: Annotations,
}

impl Resource {
    /// Creates a resource with a fresh identity.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: ResourceId::generate(),
            name: name.into(),
            kind,
            connection_string: None,
            annotations: Annotations::default(),
        }
    }

    /// Identity of the resource.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource kind.
    #[must_use]
    pub const fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// The connection string the resource exposes itself.
    #[must_use]
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    /// Sets the resource's own connection string.
    pub fn with_connection_string(&mut self, value: impl Into<String>) -> &mut Self {
        self.connection_string = Some(value.into());
        self
    }

    /// Read access to the annotation table.
    #[must_use]
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

/// Every resource of an application, in declaration order.
#[derive(Debug, Default)]
pub struct AppModel {
    resources: Vec<Resource>,
    index: HashMap<ResourceId, usize>,
}

impl AppModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a resource and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource with the same name (ignoring case)
    /// already exists.
    pub fn add_resource(&mut self, name: impl Into<String>, kind: ResourceKind) -> Result<ResourceId> {
        let name = name.into();
        if self
            .resources
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(&name))
        {
            return Err(ConfigurationError::DuplicateResource { name }.into());
        }
        tracing::debug!(resource = %name, kind = kind.manifest_type(), "adding resource");
        let resource = Resource::new(name, kind);
        let id = resource.id;
        let _ = self.index.insert(id, self.resources.len());
        self.resources.push(resource);
        Ok(id)
    }

    /// Looks up a resource by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this model.
    pub fn resource(&self, id: ResourceId) -> Result<&Resource> {
        self.index
            .get(&id)
            .and_then(|&pos| self.resources.get(pos))
            .ok_or_else(|| not_found(id))
    }

    /// Looks up a resource by id for mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this model.
    pub fn resource_mut(&mut self, id: ResourceId) -> Result<&mut Resource> {
        match self.index.get(&id) {
            Some(&pos) => self.resources.get_mut(pos).ok_or_else(|| not_found(id)),
            None => Err(not_found(id)),
        }
    }

    /// Looks up a resource by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// All resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut [Resource] {
        &mut self.resources
    }

    /// Number of declared resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the model is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Makes `destination` reference `target`'s endpoints. `binding` limits
    /// the reference to one binding; `None` references all of them.
    ///
    /// # Errors
    ///
    /// Returns an error if either resource is not part of the model.
    pub fn with_reference(
        &mut self,
        destination: ResourceId,
        target: ResourceId,
        binding: Option<&str>,
    ) -> Result<()> {
        let _ = self.resource(target)?;
        let _ = self.resource_mut(destination)?.apply_binding(target, binding);
        Ok(())
    }

    /// Makes `destination` receive `source`'s connection string.
    ///
    /// # Errors
    ///
    /// Returns an error if either resource is not part of the model.
    pub fn with_connection_string_reference(
        &mut self,
        destination: ResourceId,
        source: ResourceId,
        connection_name: Option<&str>,
        optional: bool,
    ) -> Result<()> {
        let _ = self.resource(source)?;
        let _ = self
            .resource_mut(destination)?
            .with_connection_string_reference(source, connection_name, optional);
        Ok(())
    }
}

fn not_found(id: ResourceId) -> AppwireError {
    AppwireError::NotFound {
        kind: "resource",
        id: id.to_string(),
    }
}
