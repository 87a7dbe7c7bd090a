//! # appwire-compose
//!
//! Binds application resources together by turning declared relationships
//! into environment variables.
//!
//! Handles:
//! - **Resource**: The application model and its typed annotation table.
//! - **Callbacks**: Deferred environment callbacks, run at population time.
//! - **Reference**: Service reference tracking, one relationship per pair.
//! - **Endpoint**: Scheme ambiguity detection across allocated endpoints.
//! - **Connection**: Connection-string references for manifest and run modes.
//! - **Binding**: Service binding registration with conflict detection.
//! - **Manifest**: Manifest exclusion and manifest emission.
//! - **Populate**: The population pass driving every callback.
//! - **Allocate**: Endpoint allocation for declared bindings.
//! - **Graph**: Dependency ordering between resources.
//! - **Appfile**: YAML/JSON application descriptions.

pub mod allocate;
pub mod annotations;
pub mod appfile;
pub mod binding;
pub mod callbacks;
pub mod connection;
pub mod endpoint;
pub mod graph;
pub mod manifest;
pub mod populate;
pub mod reference;
pub mod resource;

pub use annotations::{AllocatedEndpoint, Annotations, EndpointReference, ServiceBinding};
pub use callbacks::{ContextCallback, EnvironmentCallback, EnvironmentContext, ValueProducer};
pub use connection::ConnectionStringReference;
pub use manifest::ManifestDirective;
pub use populate::{populate_all, populate_environment};
pub use reference::ServiceReference;
pub use resource::{AppModel, Resource, ResourceKind};
