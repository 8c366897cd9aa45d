mod acceleration;
pub mod hypervisor;
mod mount;
mod version;

use anyhow::{Result, anyhow};
use clap::ArgMatches;
use krs_registry::{Namespace, RegistryError};

use crate::context::Context;
use crate::delegate::{DelegatedSubverb, HandlerProgram};
use crate::extension::{Extension, Registry, register};

pub use acceleration::AccelerationVerb;
pub use hypervisor::HypervisorSubverb;
pub use mount::{MountSubverb, UmountSubverb};
pub use version::VersionSubverb;

/// Subverbs of `acceleration`, in declaration order.
pub fn builtin_subverbs() -> Vec<Box<dyn Extension>> {
    vec![
        delegated(
            "board",
            "Report and configure the target board",
            HandlerProgram::Path("krs-acceleration-board"),
        ),
        delegated(
            "emulation",
            "Manage hardware emulation environments",
            HandlerProgram::Path("krs-acceleration-emulation"),
        ),
        delegated(
            "hls",
            "Run High-Level Synthesis flows",
            HandlerProgram::Path("krs-acceleration-hls"),
        ),
        Box::new(HypervisorSubverb),
        delegated(
            "linux",
            "Configure the Linux kernel of the raw disk image",
            HandlerProgram::Path("krs-acceleration-linux"),
        ),
        delegated(
            "list",
            "List available acceleration firmware",
            HandlerProgram::Path("krs-acceleration-list"),
        ),
        delegated(
            "mkinitramfs",
            "Create an initramfs from a root filesystem",
            HandlerProgram::Path("krs-acceleration-mkinitramfs"),
        ),
        Box::new(MountSubverb),
        delegated(
            "platform",
            "Report the platform of the selected firmware",
            HandlerProgram::Path("krs-acceleration-platform"),
        ),
        delegated(
            "select",
            "Select the acceleration firmware",
            HandlerProgram::Path("krs-acceleration-select"),
        ),
        Box::new(UmountSubverb),
        Box::new(VersionSubverb),
        delegated(
            "v++",
            "Invoke the Vitis v++ compiler",
            HandlerProgram::Vitis("v++"),
        ),
    ]
}

fn delegated(
    name: &'static str,
    about: &'static str,
    program: HandlerProgram,
) -> Box<dyn Extension> {
    Box::new(DelegatedSubverb::new(name, about, program))
}

/// Declare every verb and subverb; fails on the first registration error.
pub fn default_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register(&mut registry, Namespace::VERB, Box::new(AccelerationVerb))?;
    for subverb in builtin_subverbs() {
        register(&mut registry, Namespace::SUBVERB, subverb)?;
    }
    Ok(registry)
}

/// Route parsed top-level matches to the selected verb.
pub fn dispatch(ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no verb given"))?;
    let verb = ctx
        .registry
        .get(Namespace::VERB, name)
        .ok_or_else(|| anyhow!("unknown verb `{name}`"))?;
    tracing::debug!(verb = name, "dispatching");
    verb.execute(ctx, sub_matches)
}
