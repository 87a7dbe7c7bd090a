//! Domain primitive types used across the appwire workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MANIFEST_PUBLISHER, RUN_PUBLISHER};
use crate::error::AppwireError;

/// Identity of a resource inside an application model.
///
/// Two resources are the same resource only when their ids match, even if
/// every other field is equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(uuid::Uuid);

impl ResourceId {
    /// Generates a fresh resource id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target of a population pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Live resolution: values are concrete.
    #[default]
    Run,
    /// Manifest generation: values stay declarative placeholders.
    Manifest,
}

impl PublishMode {
    /// Maps a publisher name onto a mode. Only the reserved manifest
    /// publisher name selects [`PublishMode::Manifest`].
    #[must_use]
    pub fn from_publisher(name: &str) -> Self {
        if name == MANIFEST_PUBLISHER {
            Self::Manifest
        } else {
            Self::Run
        }
    }

    /// Publisher name reported for this mode.
    #[must_use]
    pub const fn publisher_name(self) -> &'static str {
        match self {
            Self::Run => RUN_PUBLISHER,
            Self::Manifest => MANIFEST_PUBLISHER,
        }
    }

    /// Returns `true` for manifest generation.
    #[must_use]
    pub const fn is_manifest(self) -> bool {
        matches!(self, Self::Manifest)
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.publisher_name())
    }
}

impl FromStr for PublishMode {
    type Err = AppwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MANIFEST_PUBLISHER => Ok(Self::Manifest),
            RUN_PUBLISHER => Ok(Self::Run),
            other => Err(AppwireError::invalid(format!("unknown publish mode: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ResourceId::generate(), ResourceId::generate());
    }

    #[test]
    fn only_reserved_name_selects_manifest() {
        assert_eq!(PublishMode::from_publisher("manifest"), PublishMode::Manifest);
        assert_eq!(PublishMode::from_publisher("Manifest"), PublishMode::Run);
        assert_eq!(PublishMode::from_publisher("dcp"), PublishMode::Run);
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert_eq!("run".parse::<PublishMode>().expect("run"), PublishMode::Run);
        assert!("deploy".parse::<PublishMode>().is_err());
    }
}
