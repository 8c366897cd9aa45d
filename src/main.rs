use anyhow::{Context as _, Result};
use clap::FromArgMatches;
use krs_dev::cli::{GlobalArgs, build_command};
use krs_dev::cmd;
use krs_dev::config;
use krs_dev::context::Context;
use krs_dev::util::process::SystemRunner;
use tracing::Level;

fn main() -> Result<()> {
    let registry = cmd::default_registry().context("failed to register built-in extensions")?;
    let matches = build_command(&registry).get_matches();
    let globals = GlobalArgs::from_arg_matches(&matches)?;
    init_tracing(globals.verbose);

    let config = config::load(globals.config.as_deref())?;
    let runner = SystemRunner;
    let ctx = Context::new(&config, &registry, &runner)?;
    let code = cmd::dispatch(&ctx, &matches)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
