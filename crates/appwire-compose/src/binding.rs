//! Service binding registration.

use appwire_common::error::{ConfigurationError, Result};

use crate::annotations::{Protocol, ServiceBinding};
use crate::resource::Resource;

impl Resource {
    /// Declares a TCP service binding.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BindingConflict`] if a binding with the
    /// same effective name already exists. An unnamed binding is known by
    /// its scheme (see [`ServiceBinding::effective_name`]).
    pub fn add_service_binding(
        &mut self,
        host_port: Option<u16>,
        scheme: Option<&str>,
        name: Option<&str>,
    ) -> Result<&mut Self> {
        let binding = ServiceBinding {
            protocol: Protocol::Tcp,
            scheme: scheme.map(str::to_string),
            name: name.map(str::to_string),
            port: host_port,
        };
        let conflict = self
            .annotations()
            .service_bindings()
            .iter()
            .any(|b| b.effective_name() == binding.effective_name());
        if conflict {
            return Err(ConfigurationError::BindingConflict {
                resource: self.name().to_string(),
                binding: binding.effective_name().to_string(),
            }
            .into());
        }

        tracing::debug!(resource = %self.name(), name, scheme, host_port, "adding service binding");
        self.annotations_mut().push_binding(binding);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use appwire_common::error::AppwireError;

    use super::*;
    use crate::resource::ResourceKind;

    fn resource() -> Resource {
        Resource::new("api", ResourceKind::Project { path: "./api".into() })
    }

    #[test]
    fn distinct_names_are_accepted() {
        let mut api = resource();
        let _ = api
            .add_service_binding(Some(8080), Some("http"), Some("http"))
            .expect("http");
        let _ = api
            .add_service_binding(None, Some("grpc"), Some("grpc"))
            .expect("grpc");
        let _ = api.add_service_binding(None, Some("tcp"), None).expect("unnamed");

        let bindings = api.annotations().service_bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].port, Some(8080));
        assert_eq!(bindings[0].protocol, Protocol::Tcp);
        assert!(bindings[2].name.is_none());
    }

    #[test]
    fn duplicate_name_conflicts() {
        let mut api = resource();
        let _ = api
            .add_service_binding(None, Some("http"), Some("web"))
            .expect("first");
        let err = api
            .add_service_binding(Some(9000), Some("https"), Some("web"))
            .expect_err("second");

        assert!(matches!(
            err,
            AppwireError::Configuration(ConfigurationError::BindingConflict { ref binding, .. })
                if binding == "web"
        ));
        assert_eq!(api.annotations().service_bindings().len(), 1);
    }

    #[test]
    fn second_unnamed_binding_conflicts() {
        let mut api = resource();
        let _ = api.add_service_binding(None, None, None).expect("first");
        let err = api.add_service_binding(None, None, None).expect_err("second");
        assert!(err.to_string().contains("\"http\""), "got: {err}");
    }

    #[test]
    fn unnamed_binding_conflicts_with_name_equal_to_its_scheme() {
        let mut api = resource();
        let _ = api
            .add_service_binding(None, Some("http"), None)
            .expect("unnamed http");
        let err = api
            .add_service_binding(Some(9999), Some("grpc"), Some("http"))
            .expect_err("named http");
        assert!(matches!(
            err,
            AppwireError::Configuration(ConfigurationError::BindingConflict { ref binding, .. })
                if binding == "http"
        ));
        assert_eq!(api.annotations().service_bindings().len(), 1);
    }

    #[test]
    fn unnamed_bindings_with_distinct_schemes_are_accepted() {
        let mut api = resource();
        let _ = api.add_service_binding(None, Some("http"), None).expect("http");
        let _ = api.add_service_binding(None, Some("grpc"), None).expect("grpc");
        assert_eq!(api.annotations().service_bindings().len(), 2);
    }
}
