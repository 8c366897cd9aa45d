use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::plan::XenPlan;
use crate::context::Context;
use crate::firmware::{DEFAULT_RAMDISK, DEFAULT_ROOTFS, RAW_IMAGE};
use crate::rawimage;
use crate::report;
use crate::util::process::{self, CommandOutput, CommandSpec};

pub const XEN_CONFIG: &str = "xen.cfg";
/// Free space added to every rootfs-backed partition, in MB.
const ROOTFS_SLACK_MB: &str = "500";
const INITTAB_HVC0: &str = "s-PS0:12345:respawn:/bin/start_getty 115200 ttyPS0 vt102-X0:12345:respawn:/sbin/getty 115200 hvc0-g";
/// First rootfs partition of the generated image; domU partitions follow.
const DOM0_ROOTFS_PARTITION: u32 = 2;

/// Builds a Xen SD card image from a [`XenPlan`].
pub struct Deployment<'c, 'a> {
    ctx: &'c Context<'a>,
    debug: bool,
}

impl<'c, 'a> Deployment<'c, 'a> {
    pub fn new(ctx: &'c Context<'a>, debug: bool) -> Self {
        Self { ctx, debug }
    }

    pub fn run(&self, plan: &XenPlan) -> Result<()> {
        let staging = create_staging()?;
        tracing::info!(staging = %staging.display(), "staging hypervisor artifacts");

        let result = self.deploy(plan, &staging);
        if self.debug {
            report::detail(format!("Staging directory kept at {}", staging.display()));
            return result;
        }

        let cleaned = self.cleanup(&staging);
        match (result, cleaned) {
            (Err(err), Err(cleanup_err)) => {
                tracing::warn!(error = %cleanup_err, "failed to remove staging directory");
                Err(err)
            }
            (result, cleaned) => result.and(cleaned),
        }
    }

    fn deploy(&self, plan: &XenPlan, staging: &Path) -> Result<()> {
        // The existing image is only touched once every artifact is staged.
        self.stage(plan, staging)?;
        self.rotate_raw_image()?;

        let config = plan.render();
        if self.debug {
            report::detail("Debugging config file:");
            for line in config.lines() {
                report::detail(line);
            }
        }
        let config_path = staging.join(XEN_CONFIG);
        fs::write(&config_path, &config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;

        report::warn("Generating boot script");
        let uboot_script_gen = self.ctx.firmware.imagebuilder_script("uboot-script-gen");
        self.exec(
            CommandSpec::new("bash")
                .arg(&uboot_script_gen)
                .args(["-c", XEN_CONFIG, "-d", ".", "-t", "sd"])
                .current_dir(staging),
            "generating the boot script",
        )?;
        report::ok("Boot script ready");

        report::warn(format!(
            "Creating new {RAW_IMAGE}. This will take a few seconds, hold on..."
        ));
        let user = self.invoking_user()?;
        let image = self.ctx.firmware.raw_image();
        let disk_image = self.ctx.firmware.imagebuilder_script("disk_image");
        self.exec(
            self.ctx
                .privilege
                .command("bash")
                .arg(&disk_image)
                .args(["-c", XEN_CONFIG, "-d", ".", "-t", "sd", "-w"])
                .arg(staging)
                .arg("-o")
                .arg(&image)
                .args(["-s", ROOTFS_SLACK_MB])
                .current_dir(staging),
            "creating the sd card image",
        )?;
        report::ok("Image successfully created");

        self.exec(
            self.ctx
                .privilege
                .command("chown")
                .arg(format!("{user}:{user}"))
                .arg(&image),
            "setting ownership of the sd card image",
        )?;

        self.xen_fixes(DOM0_ROOTFS_PARTITION)?;
        for offset in 1..=plan.domus.len() as u32 {
            self.xen_fixes(DOM0_ROOTFS_PARTITION + offset)?;
        }
        Ok(())
    }

    /// Keep the last image as `sd_card.img.old`, dropping any older backup.
    fn rotate_raw_image(&self) -> Result<()> {
        let image = self.ctx.firmware.raw_image();
        if !image.exists() {
            return Ok(());
        }
        let backup = self.ctx.firmware.raw_image_backup();
        if backup.exists() {
            self.exec(
                self.ctx.privilege.command("rm").arg(&backup),
                "removing the previous backup image",
            )?;
            report::warn(format!(
                "Detected previous {RAW_IMAGE}.old raw image, deleting."
            ));
        }
        self.exec(
            self.ctx
                .privilege
                .command("mv")
                .arg(&image)
                .arg(&backup),
            "moving the previous image aside",
        )?;
        report::warn(format!(
            "Detected previous {RAW_IMAGE} raw image, moving to {RAW_IMAGE}.old."
        ));
        Ok(())
    }

    fn stage(&self, plan: &XenPlan, staging: &Path) -> Result<()> {
        let firmware = &self.ctx.firmware;
        for kernel in plan.kernels() {
            copy_artifact(&firmware.kernel(kernel), &staging.join(kernel))?;
        }
        copy_artifact(&firmware.xen_bootbin(), &staging.join("BOOT.BIN"))?;
        copy_artifact(&firmware.xen(), &staging.join("xen"))?;
        copy_artifact(&firmware.xen_device_tree(), &staging.join("system.dtb"))?;

        for name in plan.images() {
            copy_artifact(&firmware.file(name), &staging.join(name))?;
            if name != DEFAULT_RAMDISK && name != DEFAULT_ROOTFS {
                report::ok(format!("Copied to temporary directory: {name}"));
            }
        }
        Ok(())
    }

    fn invoking_user(&self) -> Result<String> {
        let output = self.exec(CommandSpec::new("whoami"), "fetching username")?;
        let user = output.stdout_lossy().trim().to_string();
        anyhow::ensure!(!user.is_empty(), "whoami returned an empty username");
        Ok(user)
    }

    /// Create directories Xen needs and move the serial getty to the Xen console.
    fn xen_fixes(&self, partition: u32) -> Result<()> {
        let image = self.ctx.firmware.raw_image();
        let mountpoint = rawimage::mount(self.ctx, &image, partition, self.debug)?;
        let fixed = self.patch_rootfs(&mountpoint);
        let unmounted = rawimage::umount(self.ctx, partition, self.debug);
        fixed?;
        unmounted
    }

    fn patch_rootfs(&self, mountpoint: &Path) -> Result<()> {
        self.exec(
            self.ctx
                .privilege
                .command("mkdir")
                .arg("-p")
                .arg(mountpoint.join("var/lib/xen")),
            "creating Xen /var/lib/xen directory in rootfs",
        )?;
        report::ok("Successfully created Xen /var/lib/xen directory in rootfs.");

        self.exec(
            self.ctx
                .privilege
                .command("sed")
                .arg("-i")
                .arg(INITTAB_HVC0)
                .arg(mountpoint.join("etc/inittab")),
            "setting up /etc/inittab for Xen in rootfs",
        )?;
        report::ok("Successfully setup /etc/inittab for Xen in rootfs.");
        Ok(())
    }

    fn cleanup(&self, staging: &Path) -> Result<()> {
        // disk_image leaves root-owned files behind; escalate only when needed.
        if fs::remove_dir_all(staging).is_ok() {
            return Ok(());
        }
        self.exec(
            self.ctx.privilege.command("rm").arg("-r").arg(staging),
            "removing the staging directory",
        )
        .map(drop)
    }

    fn exec(&self, spec: CommandSpec, what: &str) -> Result<CommandOutput> {
        if self.debug {
            report::detail(spec.display());
        }
        process::run_checked(self.ctx.runner, spec.captured(), what)
    }
}

fn create_staging() -> Result<PathBuf> {
    let tmp = tempfile::Builder::new()
        .prefix("hypervisor")
        .tempdir()
        .context("failed to create staging directory")?;
    Ok(tmp.keep())
}

fn copy_artifact(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}
