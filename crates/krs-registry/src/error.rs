use semver::{Version, VersionReq};
use thiserror::Error;

use crate::Namespace;

/// Failures raised while the registry is being declared.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("extension `{name}` is already registered in `{namespace}`")]
    DuplicateName { namespace: Namespace, name: String },

    #[error("extension name `{name}` in `{namespace}` is malformed: {reason}")]
    MalformedName {
        namespace: Namespace,
        name: String,
        reason: &'static str,
    },

    #[error(
        "extension `{name}` in `{namespace}` requires extension point {requirement}, \
         but this build provides {provided}"
    )]
    IncompatibleVersion {
        namespace: Namespace,
        name: String,
        requirement: VersionReq,
        provided: Version,
    },
}

impl RegistryError {
    pub fn name(&self) -> &str {
        match self {
            RegistryError::DuplicateName { name, .. }
            | RegistryError::MalformedName { name, .. }
            | RegistryError::IncompatibleVersion { name, .. } => name,
        }
    }
}
