use std::collections::BTreeMap;

use semver::{Version, VersionReq};

use crate::{Namespace, RegistryError};

/// Version of the extension point contract every handler is checked against.
pub const EXTENSION_POINT_VERSION: Version = Version::new(1, 0, 0);

#[derive(Clone, Debug)]
pub struct ExtensionRecord<H> {
    pub name: String,
    pub handler: H,
    pub requirement: VersionReq,
}

/// Name-to-handler bindings grouped by namespace.
///
/// Records keep their declaration order and are never mutated once
/// registered. Every rule (unique names, well-formed names, compatible
/// extension point) is enforced in [`ExtensionRegistry::register`], so a
/// registry that finished building is valid as a whole.
#[derive(Clone, Debug)]
pub struct ExtensionRegistry<H> {
    namespaces: BTreeMap<Namespace, Vec<ExtensionRecord<H>>>,
}

impl<H> ExtensionRegistry<H> {
    pub fn new() -> Self {
        Self {
            namespaces: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        namespace: Namespace,
        name: impl Into<String>,
        handler: H,
        requirement: VersionReq,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if let Some(reason) = malformed_reason(&name) {
            return Err(RegistryError::MalformedName {
                namespace,
                name,
                reason,
            });
        }
        if !requirement.matches(&EXTENSION_POINT_VERSION) {
            return Err(RegistryError::IncompatibleVersion {
                namespace,
                name,
                requirement,
                provided: EXTENSION_POINT_VERSION,
            });
        }

        let records = self.namespaces.entry(namespace).or_default();
        if records.iter().any(|record| record.name == name) {
            return Err(RegistryError::DuplicateName { namespace, name });
        }

        tracing::debug!(%namespace, %name, %requirement, "registered extension");
        records.push(ExtensionRecord {
            name,
            handler,
            requirement,
        });
        Ok(())
    }

    pub fn get(&self, namespace: Namespace, name: &str) -> Option<&H> {
        self.record(namespace, name).map(|record| &record.handler)
    }

    pub fn record(&self, namespace: Namespace, name: &str) -> Option<&ExtensionRecord<H>> {
        self.records(namespace).iter().find(|record| record.name == name)
    }

    /// Records of `namespace` in declaration order.
    pub fn records(&self, namespace: Namespace) -> &[ExtensionRecord<H>] {
        self.namespaces
            .get(&namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn names(&self, namespace: Namespace) -> impl Iterator<Item = &str> {
        self.records(namespace)
            .iter()
            .map(|record| record.name.as_str())
    }

    pub fn len(&self, namespace: Namespace) -> usize {
        self.records(namespace).len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(Vec::is_empty)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.namespaces.keys().copied()
    }
}

impl<H> Default for ExtensionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn malformed_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('-') {
        Some("name starts with `-`")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> VersionReq {
        VersionReq::parse("^1.0").unwrap()
    }

    #[test]
    fn keeps_declaration_order() {
        let mut registry = ExtensionRegistry::new();
        for name in ["mount", "board", "v++"] {
            registry
                .register(Namespace::SUBVERB, name, (), req())
                .unwrap();
        }
        let names: Vec<_> = registry.names(Namespace::SUBVERB).collect();
        assert_eq!(names, ["mount", "board", "v++"]);
    }

    #[test]
    fn same_name_in_other_namespace_is_allowed() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Namespace::VERB, "acceleration", 1, req())
            .unwrap();
        registry
            .register(Namespace::SUBVERB, "acceleration", 2, req())
            .unwrap();
        assert_eq!(registry.get(Namespace::VERB, "acceleration"), Some(&1));
        assert_eq!(registry.get(Namespace::SUBVERB, "acceleration"), Some(&2));
    }

    #[test]
    fn rejects_duplicate_and_keeps_first_handler() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Namespace::SUBVERB, "board", "first", req())
            .unwrap();
        let err = registry
            .register(Namespace::SUBVERB, "board", "second", req())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                namespace: Namespace::SUBVERB,
                name: "board".into(),
            }
        );
        assert_eq!(registry.len(Namespace::SUBVERB), 1);
        assert_eq!(registry.get(Namespace::SUBVERB, "board"), Some(&"first"));
    }

    #[test]
    fn rejects_malformed_names() {
        let mut registry = ExtensionRegistry::new();
        for name in ["", "--debug", "two words"] {
            let err = registry
                .register(Namespace::SUBVERB, name, (), req())
                .unwrap_err();
            assert!(matches!(err, RegistryError::MalformedName { .. }), "{name}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_incompatible_requirement() {
        let mut registry = ExtensionRegistry::new();
        let err = registry
            .register(
                Namespace::SUBVERB,
                "hls",
                (),
                VersionReq::parse("^2.0").unwrap(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("requires extension point ^2.0"));
        assert_eq!(err.name(), "hls");
    }

    #[test]
    fn unknown_namespace_is_empty() {
        let registry: ExtensionRegistry<()> = ExtensionRegistry::new();
        assert_eq!(registry.len(Namespace::new("other.namespace")), 0);
        assert!(registry.get(Namespace::VERB, "acceleration").is_none());
    }
}
