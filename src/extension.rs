use anyhow::Result;
use clap::{ArgMatches, Command};
use krs_registry::{ExtensionRegistry, Namespace, RegistryError};
use once_cell::sync::Lazy;
use semver::VersionReq;

use crate::context::Context;

const EXTENSION_REQUIREMENT_STR: &str = "^1.0";
/// Extension point requirement declared by every built-in handler.
pub static EXTENSION_REQUIREMENT: Lazy<VersionReq> = Lazy::new(|| {
    VersionReq::parse(EXTENSION_REQUIREMENT_STR).expect("valid EXTENSION_REQUIREMENT_STR")
});

pub type Registry = ExtensionRegistry<Box<dyn Extension>>;

/// Uniform contract for verbs and subverbs.
pub trait Extension {
    /// Name the handler is registered and invoked under.
    fn name(&self) -> &'static str;

    fn about(&self) -> &'static str;

    /// Argument surface of the handler. Verbs use `registry` to attach their subverbs.
    fn command(&self, registry: &Registry) -> Command;

    /// Run the handler and return the process exit status.
    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32>;
}

/// Register `handler` under its own name.
pub fn register(
    registry: &mut Registry,
    namespace: Namespace,
    handler: Box<dyn Extension>,
) -> Result<(), RegistryError> {
    let name = handler.name();
    registry.register(namespace, name, handler, EXTENSION_REQUIREMENT.clone())
}
