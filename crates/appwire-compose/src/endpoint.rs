//! Scheme ambiguity across a relationship's endpoints.
//!
//! When two endpoints share a scheme, only their binding-qualified URIs
//! can tell them apart.

use std::collections::{HashMap, HashSet};

use crate::annotations::AllocatedEndpoint;

/// Returns the schemes used by more than one of `endpoints`.
#[must_use]
pub fn ambiguous_schemes<'a, I>(endpoints: I) -> HashSet<&'a str>
where
    I: IntoIterator<Item = &'a AllocatedEndpoint>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for endpoint in endpoints {
        *counts.entry(endpoint.uri_scheme.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(scheme, _)| scheme)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(binding: &str, scheme: &str) -> AllocatedEndpoint {
        AllocatedEndpoint::new(binding, scheme, "localhost", 80)
    }

    #[test]
    fn empty_input_has_no_ambiguity() {
        let endpoints: Vec<AllocatedEndpoint> = Vec::new();
        assert!(ambiguous_schemes(&endpoints).is_empty());
    }

    #[test]
    fn distinct_schemes_are_unambiguous() {
        let endpoints = [endpoint("http", "http"), endpoint("grpc", "grpc")];
        assert!(ambiguous_schemes(&endpoints).is_empty());
    }

    #[test]
    fn shared_scheme_is_ambiguous() {
        let endpoints = [
            endpoint("public", "http"),
            endpoint("admin", "http"),
            endpoint("grpc", "grpc"),
        ];
        let ambiguous = ambiguous_schemes(&endpoints);
        assert_eq!(ambiguous.len(), 1);
        assert!(ambiguous.contains("http"));
    }
}
