use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, ValueEnum};
use krs_registry::Namespace;

use crate::extension::Registry;
use crate::firmware::RAW_IMAGE;

/// Options of `krs` itself. They go before the verb; everything after a
/// delegated subverb belongs to its handler.
///
/// Verbs and subverbs are not listed here: they are attached from the
/// registry by [`build_command`].
#[derive(Parser, Debug)]
#[command(name = "krs")]
#[command(version)]
#[command(about = "Hardware acceleration build-flow tooling CLI")]
pub struct GlobalArgs {
    /// Override config file path (default: $XDG_CONFIG_HOME/krs-dev/config.toml)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

/// Full command tree: global options plus one subcommand per registered verb.
pub fn build_command(registry: &Registry) -> clap::Command {
    let mut command = GlobalArgs::command()
        .subcommand_required(true)
        .arg_required_else_help(true);
    for record in registry.records(Namespace::VERB) {
        command = command.subcommand(record.handler.command(registry));
    }
    command
}

#[derive(Args, Debug, Clone, Default)]
#[command(disable_help_flag = true)]
pub struct PassthroughArgs {
    /// Arguments passed directly to the handler program
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub passthrough: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HypervisorArgs {
    /// Print the generated configuration and commands; keep the staging directory
    #[arg(long = "debug")]
    pub debug: bool,
    /// Kernel for dom0
    #[arg(long = "dom0", value_enum)]
    pub dom0: Option<GuestKernel>,
    /// Kernel for a domU guest (repeatable)
    #[arg(long = "domU", value_enum)]
    pub domu: Vec<GuestKernel>,
    /// Kernel for a dom0less guest (repeatable)
    #[arg(long = "dom0less", value_enum)]
    pub dom0less: Vec<GuestKernel>,
    /// Ramdisk for a dom0less guest, in guest order; dom0 is excluded (repeatable)
    #[arg(long = "ramdisk", value_name = "FILE")]
    pub ramdisks: Vec<String>,
    /// Rootfs image, first for dom0 then for each domU (repeatable)
    #[arg(long = "rootfs", value_name = "FILE")]
    pub rootfs: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, ValueEnum)]
pub enum GuestKernel {
    #[value(name = "preempt_rt")]
    PreemptRt,
    Vanilla,
}

impl GuestKernel {
    /// Kernel image file name inside `<firmware>/kernel/`.
    pub fn image_name(self) -> &'static str {
        match self {
            GuestKernel::PreemptRt => "Image_PREEMPT_RT",
            GuestKernel::Vanilla => "Image",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MountArgs {
    /// Raw disk image; relative paths are resolved against the firmware directory
    #[arg(long = "image", default_value = RAW_IMAGE)]
    pub image: PathBuf,
    /// Partition number to mount
    #[arg(
        long = "partition",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub partition: u32,
    /// Echo the commands being run
    #[arg(long = "debug")]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UmountArgs {
    /// Partition number to unmount
    #[arg(
        long = "partition",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub partition: u32,
    /// Echo the commands being run
    #[arg(long = "debug")]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VersionArgs {
    /// Emit JSON output
    #[arg(long = "json")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Command, FromArgMatches};

    fn parse_hypervisor(args: &[&str]) -> HypervisorArgs {
        let command = HypervisorArgs::augment_args(Command::new("hypervisor"));
        let matches = command.try_get_matches_from(args).unwrap();
        HypervisorArgs::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn hypervisor_collects_repeated_guests() {
        let args = parse_hypervisor(&[
            "hypervisor",
            "--dom0",
            "preempt_rt",
            "--domU",
            "vanilla",
            "--domU",
            "preempt_rt",
            "--dom0less",
            "vanilla",
            "--ramdisk",
            "initrd2.cpio",
        ]);
        assert_eq!(args.dom0, Some(GuestKernel::PreemptRt));
        assert_eq!(args.domu, [GuestKernel::Vanilla, GuestKernel::PreemptRt]);
        assert_eq!(args.dom0less, [GuestKernel::Vanilla]);
        assert_eq!(args.ramdisks, ["initrd2.cpio"]);
        assert!(args.rootfs.is_empty());
        assert!(!args.debug);
    }

    #[test]
    fn hypervisor_rejects_unknown_kernel() {
        let command = HypervisorArgs::augment_args(Command::new("hypervisor"));
        assert!(
            command
                .try_get_matches_from(["hypervisor", "--dom0", "rt"])
                .is_err()
        );
    }

    #[test]
    fn passthrough_keeps_hyphenated_args() {
        let command = PassthroughArgs::augment_args(Command::new("hls"));
        let matches = command
            .try_get_matches_from(["hls", "--synthesis", "-k", "vadd", "--help"])
            .unwrap();
        let args = PassthroughArgs::from_arg_matches(&matches).unwrap();
        assert_eq!(args.passthrough, ["--synthesis", "-k", "vadd", "--help"]);
    }

    #[test]
    fn krs_options_before_the_verb_are_parsed() {
        let registry = crate::cmd::default_registry().unwrap();
        let matches = build_command(&registry)
            .try_get_matches_from(["krs", "-vv", "--config", "krs.toml", "acceleration", "version"])
            .unwrap();
        let globals = GlobalArgs::from_arg_matches(&matches).unwrap();
        assert_eq!(globals.verbose, 2);
        assert_eq!(globals.config.as_deref(), Some(std::path::Path::new("krs.toml")));
    }

    #[test]
    fn delegated_subverb_keeps_leading_krs_flags() {
        let registry = crate::cmd::default_registry().unwrap();
        let matches = build_command(&registry)
            .try_get_matches_from(["krs", "acceleration", "hls", "-v", "--config", "hls.cfg"])
            .unwrap();
        let globals = GlobalArgs::from_arg_matches(&matches).unwrap();
        assert_eq!(globals.verbose, 0);
        assert!(globals.config.is_none());

        let (_, acceleration) = matches.subcommand().unwrap();
        let (name, hls) = acceleration.subcommand().unwrap();
        assert_eq!(name, "hls");
        let args = PassthroughArgs::from_arg_matches(hls).unwrap();
        assert_eq!(args.passthrough, ["-v", "--config", "hls.cfg"]);
    }

    #[test]
    fn mount_rejects_partition_zero() {
        let command = MountArgs::augment_args(Command::new("mount"));
        assert!(
            command
                .try_get_matches_from(["mount", "--partition", "0"])
                .is_err()
        );
    }
}
