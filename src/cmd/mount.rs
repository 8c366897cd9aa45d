use anyhow::{Result, ensure};
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::cli::{MountArgs, UmountArgs};
use crate::context::Context;
use crate::extension::{Extension, Registry};
use crate::rawimage;
use crate::report;

pub struct MountSubverb;

impl Extension for MountSubverb {
    fn name(&self) -> &'static str {
        "mount"
    }

    fn about(&self) -> &'static str {
        "Mount a partition of the raw disk image"
    }

    fn command(&self, _registry: &Registry) -> Command {
        MountArgs::augment_args(Command::new(self.name()).about(self.about()))
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let args = MountArgs::from_arg_matches(matches)?;
        let image = ctx.firmware.root().join(&args.image);
        ensure!(image.exists(), "raw image {} does not exist", image.display());
        let mountpoint = rawimage::mount(ctx, &image, args.partition, args.debug)?;
        report::ok(format!(
            "Mounted partition {} of {} at {}",
            args.partition,
            image.display(),
            mountpoint.display()
        ));
        Ok(0)
    }
}

pub struct UmountSubverb;

impl Extension for UmountSubverb {
    fn name(&self) -> &'static str {
        "umount"
    }

    fn about(&self) -> &'static str {
        "Unmount a partition of the raw disk image"
    }

    fn command(&self, _registry: &Registry) -> Command {
        UmountArgs::augment_args(Command::new(self.name()).about(self.about()))
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let args = UmountArgs::from_arg_matches(matches)?;
        rawimage::umount(ctx, args.partition, args.debug)?;
        report::ok(format!(
            "Unmounted {}",
            ctx.mountpoint(args.partition).display()
        ));
        Ok(0)
    }
}
