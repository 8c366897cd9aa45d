use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::cli::PassthroughArgs;
use crate::config::KrsConfig;
use crate::context::Context;
use crate::extension::{Extension, Registry};
use crate::passthrough::resolve_handler;
use crate::util::process::CommandSpec;

/// Where a delegated subverb finds its program when nothing overrides it.
#[derive(Clone, Copy, Debug)]
pub enum HandlerProgram {
    /// Looked up on PATH.
    Path(&'static str),
    /// A Vitis tool: `<vitis_dir>/bin/<tool>` when configured, otherwise PATH.
    Vitis(&'static str),
}

impl HandlerProgram {
    fn program(&self) -> &'static str {
        match self {
            HandlerProgram::Path(program) | HandlerProgram::Vitis(program) => program,
        }
    }

    fn preferred(&self, config: &KrsConfig) -> Option<PathBuf> {
        match self {
            HandlerProgram::Path(_) => None,
            HandlerProgram::Vitis(tool) => config
                .paths
                .vitis_dir
                .as_ref()
                .map(|dir| dir.join("bin").join(tool)),
        }
    }
}

/// Subverb implemented by an external program; arguments and stdio pass straight through.
pub struct DelegatedSubverb {
    name: &'static str,
    about: &'static str,
    program: HandlerProgram,
}

impl DelegatedSubverb {
    pub const fn new(name: &'static str, about: &'static str, program: HandlerProgram) -> Self {
        Self {
            name,
            about,
            program,
        }
    }

    pub fn resolve(&self, config: &KrsConfig) -> Result<PathBuf> {
        let preferred = self.program.preferred(config);
        resolve_handler(
            config,
            self.name,
            self.program.program(),
            preferred.as_deref(),
        )
    }
}

impl Extension for DelegatedSubverb {
    fn name(&self) -> &'static str {
        self.name
    }

    fn about(&self) -> &'static str {
        self.about
    }

    fn command(&self, _registry: &Registry) -> Command {
        PassthroughArgs::augment_args(Command::new(self.name).about(self.about))
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let args = PassthroughArgs::from_arg_matches(matches)?;
        let program = self.resolve(ctx.config)?;
        tracing::info!(subverb = self.name, program = %program.display(), "delegating");
        let spec = CommandSpec::new(&program).args(args.passthrough);
        let output = ctx
            .runner
            .run(spec)
            .with_context(|| format!("failed to run `{}` handler", self.name))?;
        Ok(output.code())
    }
}
