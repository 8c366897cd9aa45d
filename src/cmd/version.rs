use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use krs_registry::{EXTENSION_POINT_VERSION, Namespace};
use serde_json::json;

use crate::cli::VersionArgs;
use crate::context::Context;
use crate::extension::{Extension, Registry};

pub struct VersionSubverb;

impl Extension for VersionSubverb {
    fn name(&self) -> &'static str {
        "version"
    }

    fn about(&self) -> &'static str {
        "Report the version of the acceleration tooling"
    }

    fn command(&self, _registry: &Registry) -> Command {
        VersionArgs::augment_args(Command::new(self.name()).about(self.about()))
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let args = VersionArgs::from_arg_matches(matches)?;
        let version = env!("CARGO_PKG_VERSION");
        if args.json {
            let subverbs: Vec<&str> = ctx.registry.names(Namespace::SUBVERB).collect();
            let doc = json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": version,
                "extension_point": EXTENSION_POINT_VERSION.to_string(),
                "subverbs": subverbs,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        } else {
            println!("{} {version}", env!("CARGO_PKG_NAME"));
            println!("extension point {EXTENSION_POINT_VERSION}");
        }
        Ok(0)
    }
}
