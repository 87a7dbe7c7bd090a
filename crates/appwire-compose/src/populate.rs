//! The population pass.
//!
//! Walks a resource's environment callbacks in registration order against
//! one fresh [`EnvironmentContext`]. The first failing callback aborts the
//! pass; a mis-wired resource never yields a partial environment.

use std::collections::BTreeMap;

use appwire_common::config::ConnectionStringLookup;
use appwire_common::error::Result;
use appwire_common::types::{PublishMode, ResourceId};

use crate::callbacks::{ContextCallback, EnvironmentCallback, EnvironmentContext};
use crate::connection::populate_connection_string;
use crate::reference::populate_service_reference;
use crate::resource::AppModel;

/// Populates the environment of one resource.
///
/// # Errors
///
/// Returns an error if the resource is unknown or any callback fails.
pub fn populate_environment(
    model: &AppModel,
    id: ResourceId,
    mode: PublishMode,
    lookup: &dyn ConnectionStringLookup,
) -> Result<BTreeMap<String, String>> {
    let resource = model.resource(id)?;
    let mut context = EnvironmentContext::new(mode);

    for callback in resource.annotations().environment_callbacks() {
        match callback {
            EnvironmentCallback::Value { name, value } => {
                let value = value.produce(model, mode)?;
                context.set(name.clone(), value);
            }
            EnvironmentCallback::Context(ContextCallback::ServiceReference { target }) => {
                populate_service_reference(model, resource, *target, &mut context)?;
            }
            EnvironmentCallback::Context(ContextCallback::ConnectionString(reference)) => {
                populate_connection_string(model, reference, lookup, &mut context)?;
            }
            EnvironmentCallback::Context(ContextCallback::Custom(consumer)) => {
                consumer(&mut context)?;
            }
        }
    }

    tracing::debug!(
        resource = %resource.name(),
        %mode,
        variables = context.environment_variables.len(),
        "environment populated"
    );
    Ok(context.into_variables())
}

/// Populates every resource in declaration order.
///
/// # Errors
///
/// Returns the first error raised by any resource.
pub fn populate_all(
    model: &AppModel,
    mode: PublishMode,
    lookup: &dyn ConnectionStringLookup,
) -> Result<Vec<(String, BTreeMap<String, String>)>> {
    tracing::info!(%mode, resources = model.len(), "populating environments");
    model
        .resources()
        .iter()
        .map(|r| {
            populate_environment(model, r.id(), mode, lookup).map(|env| (r.name().to_string(), env))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use appwire_common::error::AppwireError;

    use super::*;
    use crate::annotations::AllocatedEndpoint;
    use crate::resource::ResourceKind;

    #[test]
    fn later_callbacks_overwrite_earlier_keys() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        let _ = model
            .resource_mut(api)
            .expect("api")
            .add_named_value("LEVEL", "info")
            .add_custom_callback(|ctx| {
                let previous = ctx.environment_variables.get("LEVEL").cloned();
                ctx.set("PREVIOUS", previous.unwrap_or_default());
                Ok(())
            })
            .add_named_value("LEVEL", "debug");

        let env = populate_environment(&model, api, PublishMode::Run, &BTreeMap::new())
            .expect("populate");
        assert_eq!(env["LEVEL"], "debug");
        assert_eq!(env["PREVIOUS"], "info");
    }

    #[test]
    fn custom_callback_sees_publish_mode() {
        let mut model = AppModel::new();
        let api = model.add_resource("api", ResourceKind::Parameter).expect("add");
        let _ = model
            .resource_mut(api)
            .expect("api")
            .add_custom_callback(|ctx| {
                ctx.set("PUBLISHER", ctx.publisher_name());
                Ok(())
            });

        let run = populate_environment(&model, api, PublishMode::Run, &BTreeMap::new())
            .expect("run");
        let manifest = populate_environment(&model, api, PublishMode::Manifest, &BTreeMap::new())
            .expect("manifest");
        assert_eq!(run["PUBLISHER"], "run");
        assert_eq!(manifest["PUBLISHER"], "manifest");
    }

    #[test]
    fn references_reflect_state_at_population_time() {
        let mut model = AppModel::new();
        let web = model.add_resource("web", ResourceKind::Parameter).expect("web");
        let api = model.add_resource("api", ResourceKind::Parameter).expect("api");
        model.with_reference(web, api, Some("http")).expect("ref");

        model
            .resource_mut(api)
            .expect("api")
            .annotations_mut()
            .push_endpoint(AllocatedEndpoint::new("http", "http", "localhost", 5000));

        let env = populate_environment(&model, web, PublishMode::Run, &BTreeMap::new())
            .expect("populate");
        assert_eq!(env["services__api__0"], "http://localhost:5000");
        assert_eq!(env["services__api__1"], "http://localhost:5000");
    }

    #[test]
    fn populate_all_stops_at_first_failure() {
        let mut model = AppModel::new();
        let web = model.add_resource("web", ResourceKind::Parameter).expect("web");
        let db = model.add_resource("db", ResourceKind::ConnectionString).expect("db");
        model
            .with_connection_string_reference(web, db, None, false)
            .expect("ref");

        let err = populate_all(&model, PublishMode::Run, &BTreeMap::new()).expect_err("unresolved");
        assert!(err.is_configuration());

        let manifest = populate_all(&model, PublishMode::Manifest, &BTreeMap::new())
            .expect("manifest never resolves");
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].0, "web");
        assert!(manifest[1].1.is_empty());
    }

    #[test]
    fn unknown_resource_is_not_found() {
        let model = AppModel::new();
        let err = populate_environment(&model, ResourceId::generate(), PublishMode::Run, &BTreeMap::new())
            .expect_err("missing");
        assert!(matches!(err, AppwireError::NotFound { .. }));
    }
}
