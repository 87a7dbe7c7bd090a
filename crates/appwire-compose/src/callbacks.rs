//! Deferred environment callbacks.
//!
//! Registration only records work; nothing here is evaluated until a
//! population pass walks the callbacks in order. Later callbacks may
//! overwrite keys written by earlier ones.

use std::collections::BTreeMap;
use std::fmt;

use appwire_common::constants::endpoint_placeholder;
use appwire_common::error::{AppwireError, Result};
use appwire_common::types::{PublishMode, ResourceId};

use crate::annotations::EndpointReference;
use crate::connection::ConnectionStringReference;
use crate::resource::{AppModel, Resource};

/// Producer signature for values computed at population time.
pub type DeferredValue = Box<dyn Fn() -> String>;

/// Consumer signature for callbacks writing into the context directly.
pub type CustomCallback = Box<dyn Fn(&mut EnvironmentContext) -> Result<()>>;

/// State shared by every callback of one resource during population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    mode: PublishMode,
    /// Variables written so far.
    pub environment_variables: BTreeMap<String, String>,
}

impl EnvironmentContext {
    /// Creates an empty context for `mode`.
    #[must_use]
    pub const fn new(mode: PublishMode) -> Self {
        Self {
            mode,
            environment_variables: BTreeMap::new(),
        }
    }

    /// Active publish mode.
    #[must_use]
    pub const fn mode(&self) -> PublishMode {
        self.mode
    }

    /// Name of the active publisher.
    #[must_use]
    pub const fn publisher_name(&self) -> &'static str {
        self.mode.publisher_name()
    }

    /// Writes a variable, replacing any earlier value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let _ = self.environment_variables.insert(name.into(), value.into());
    }

    /// Consumes the context, returning the variables.
    #[must_use]
    pub fn into_variables(self) -> BTreeMap<String, String> {
        self.environment_variables
    }
}

/// Source of a single named value.
pub enum ValueProducer {
    /// A fixed string.
    Literal(String),
    /// The plain URI of another resource's endpoint.
    Endpoint(EndpointReference),
    /// Any zero-argument producer.
    Deferred(DeferredValue),
}

impl ValueProducer {
    /// Evaluates the producer against the final model state.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced endpoint or its owner is missing.
    pub fn produce(&self, model: &AppModel, mode: PublishMode) -> Result<String> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Deferred(producer) => Ok(producer()),
            Self::Endpoint(reference) => {
                let owner = model.resource(reference.owner)?;
                if mode.is_manifest() {
                    return Ok(endpoint_placeholder(owner.name(), &reference.binding_name));
                }
                owner
                    .annotations()
                    .endpoint(&reference.binding_name)
                    .map(crate::annotations::AllocatedEndpoint::uri_string)
                    .ok_or_else(|| AppwireError::NotFound {
                        kind: "endpoint",
                        id: format!("{}.{}", owner.name(), reference.binding_name),
                    })
            }
        }
    }
}

impl fmt::Debug for ValueProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Endpoint(reference) => f.debug_tuple("Endpoint").field(reference).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for ValueProducer {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for ValueProducer {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<EndpointReference> for ValueProducer {
    fn from(reference: EndpointReference) -> Self {
        Self::Endpoint(reference)
    }
}

/// Callback that receives the whole context.
pub enum ContextCallback {
    /// Emits `services__*` variables for the relationship with `target`.
    ServiceReference {
        /// Referenced resource.
        target: ResourceId,
    },
    /// Emits a `ConnectionStrings__*` variable.
    ConnectionString(ConnectionStringReference),
    /// Arbitrary consumer.
    Custom(CustomCallback),
}

impl fmt::Debug for ContextCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceReference { target } => f
                .debug_struct("ServiceReference")
                .field("target", target)
                .finish(),
            Self::ConnectionString(reference) => {
                f.debug_tuple("ConnectionString").field(reference).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One deferred unit of environment work.
#[derive(Debug)]
pub enum EnvironmentCallback {
    /// Writes `name` with the producer's value.
    Value {
        /// Variable name.
        name: String,
        /// Value source.
        value: ValueProducer,
    },
    /// Hands the context to a consumer.
    Context(ContextCallback),
}

impl Resource {
    /// Appends a named value callback. Multiple callbacks for the same
    /// name are kept; the last one populated wins.
    pub fn add_named_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ValueProducer>,
    ) -> &mut Self {
        let name = name.into();
        tracing::debug!(resource = %self.name(), variable = %name, "registering environment value");
        self.annotations_mut()
            .push_environment(EnvironmentCallback::Value {
                name,
                value: value.into(),
            });
        self
    }

    /// Appends a named value computed by `producer` at population time.
    pub fn add_deferred_value<F>(&mut self, name: impl Into<String>, producer: F) -> &mut Self
    where
        F: Fn() -> String + 'static,
    {
        self.add_named_value(name, ValueProducer::Deferred(Box::new(producer)))
    }

    /// Appends a context callback.
    pub fn add_context_callback(&mut self, callback: ContextCallback) -> &mut Self {
        self.annotations_mut()
            .push_environment(EnvironmentCallback::Context(callback));
        self
    }

    /// Appends a custom consumer of the population context.
    pub fn add_custom_callback<F>(&mut self, consumer: F) -> &mut Self
    where
        F: Fn(&mut EnvironmentContext) -> Result<()> + 'static,
    {
        self.add_context_callback(ContextCallback::Custom(Box::new(consumer)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::annotations::AllocatedEndpoint;
    use crate::resource::ResourceKind;

    #[test]
    fn registration_appends_without_deduplication() {
        let mut resource = Resource::new("api", ResourceKind::Parameter);
        let _ = resource
            .add_named_value("MODE", "a")
            .add_named_value("MODE", "b");
        assert_eq!(resource.annotations().environment_callbacks().len(), 2);
    }

    #[test]
    fn deferred_producer_is_not_invoked_at_registration() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut resource = Resource::new("api", ResourceKind::Parameter);
        let _ = resource.add_deferred_value("COUNT", move || {
            seen.set(seen.get() + 1);
            "1".to_string()
        });
        assert_eq!(calls.get(), 0);

        let model = AppModel::new();
        let Some(EnvironmentCallback::Value { value, .. }) =
            resource.annotations().environment_callbacks().first()
        else {
            panic!("expected value callback");
        };
        assert_eq!(value.produce(&model, PublishMode::Run).expect("produce"), "1");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn endpoint_producer_resolves_lazily() {
        let mut model = AppModel::new();
        let api = model
            .add_resource("api", ResourceKind::Parameter)
            .expect("add");
        let producer = ValueProducer::from(EndpointReference::new(api, "http"));

        assert!(producer.produce(&model, PublishMode::Run).is_err());

        model
            .resource_mut(api)
            .expect("api")
            .annotations_mut()
            .push_endpoint(AllocatedEndpoint::new("http", "http", "localhost", 5000));
        assert_eq!(
            producer.produce(&model, PublishMode::Run).expect("resolved"),
            "http://localhost:5000"
        );
        assert_eq!(
            producer
                .produce(&model, PublishMode::Manifest)
                .expect("placeholder"),
            "{api.bindings.http.url}"
        );
    }

    #[test]
    fn context_set_overwrites() {
        let mut context = EnvironmentContext::new(PublishMode::Manifest);
        context.set("KEY", "first");
        context.set("KEY", "second");
        assert_eq!(context.publisher_name(), "manifest");
        assert_eq!(
            context.into_variables().get("KEY").map(String::as_str),
            Some("second")
        );
    }
}
