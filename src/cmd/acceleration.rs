use anyhow::{Result, anyhow};
use clap::{ArgMatches, Command};
use krs_registry::Namespace;

use crate::context::Context;
use crate::extension::{Extension, Registry};

/// The `acceleration` verb: dispatches to the registered subverbs.
pub struct AccelerationVerb;

impl Extension for AccelerationVerb {
    fn name(&self) -> &'static str {
        "acceleration"
    }

    fn about(&self) -> &'static str {
        "Hardware acceleration build flows (firmware, hypervisor, raw images)"
    }

    fn command(&self, registry: &Registry) -> Command {
        let subverbs = registry
            .records(Namespace::SUBVERB)
            .iter()
            .map(|record| record.handler.command(registry));
        Command::new(self.name())
            .about(self.about())
            .subcommands(subverbs)
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let Some((name, sub_matches)) = matches.subcommand() else {
            // No subverb: show what is available.
            let mut command = self
                .command(ctx.registry)
                .bin_name(format!("krs {}", self.name()));
            command.print_help()?;
            println!();
            return Ok(0);
        };

        let subverb = ctx
            .registry
            .get(Namespace::SUBVERB, name)
            .ok_or_else(|| anyhow!("unknown subverb `{name}`"))?;
        tracing::debug!(subverb = name, "dispatching");
        subverb.execute(ctx, sub_matches)
    }
}
