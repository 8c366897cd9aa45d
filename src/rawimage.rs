//! Loop-mounting partitions of raw SD card images.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow, bail};

use crate::context::Context;
use crate::report;
use crate::util::process::{self, CommandOutput, CommandSpec};

const DEFAULT_SECTOR_SIZE: u64 = 512;

/// Byte offset of `partition` inside `image`, read from an `fdisk -l` listing.
pub fn partition_offset(listing: &str, image: &Path, partition: u32) -> Result<u64> {
    let sector_size = sector_size(listing)?;
    for line in listing.lines() {
        let mut tokens = line.split_whitespace();
        let Some(device) = tokens.next() else {
            continue;
        };
        if !device_matches(device, image, partition) {
            continue;
        }
        let start = tokens
            .find(|token| *token != "*")
            .ok_or_else(|| anyhow!("partition row `{line}` has no start sector"))?;
        let start: u64 = start
            .parse()
            .with_context(|| format!("invalid start sector `{start}` in `{line}`"))?;
        return start
            .checked_mul(sector_size)
            .ok_or_else(|| anyhow!("partition {partition} offset overflows: {start} * {sector_size}"));
    }
    bail!(
        "partition {partition} not found in the partition table of {}",
        image.display()
    );
}

fn sector_size(listing: &str) -> Result<u64> {
    // Units: sectors of 1 * 512 = 512 bytes
    let Some(units) = listing
        .lines()
        .find_map(|line| line.trim().strip_prefix("Units:"))
    else {
        return Ok(DEFAULT_SECTOR_SIZE);
    };
    let size = units
        .rsplit('=')
        .next()
        .and_then(|tail| tail.split_whitespace().next())
        .ok_or_else(|| anyhow!("unrecognised fdisk units line `{units}`"))?;
    size.parse()
        .with_context(|| format!("invalid sector size `{size}`"))
}

fn device_matches(device: &str, image: &Path, partition: u32) -> bool {
    if device == format!("{}{partition}", image.display()) {
        return true;
    }
    let Some(file_name) = image.file_name() else {
        return false;
    };
    let suffix = format!("{}{partition}", file_name.to_string_lossy());
    device == suffix || device.ends_with(&format!("/{suffix}"))
}

fn exec(ctx: &Context<'_>, spec: CommandSpec, what: &str, debug: bool) -> Result<CommandOutput> {
    if debug {
        report::detail(spec.display());
    }
    process::run_checked(ctx.runner, spec.captured(), what)
}

/// Loop-mount `partition` of `image` at its mount point and return the mount point.
pub fn mount(ctx: &Context<'_>, image: &Path, partition: u32, debug: bool) -> Result<PathBuf> {
    let listing = exec(
        ctx,
        CommandSpec::new("fdisk").arg("-l").arg(image),
        "reading the partition table",
        debug,
    )?;
    let offset = partition_offset(&listing.stdout_lossy(), image, partition)?;

    let mountpoint = ctx.mountpoint(partition);
    fs::create_dir_all(&mountpoint)
        .with_context(|| format!("failed to create {}", mountpoint.display()))?;

    let spec = ctx
        .privilege
        .command("mount")
        .arg("-o")
        .arg(format!("loop,offset={offset}"))
        .arg(image)
        .arg(&mountpoint);
    exec(ctx, spec, &format!("mounting partition {partition}"), debug)?;
    tracing::info!(image = %image.display(), partition, offset, mountpoint = %mountpoint.display(), "mounted raw image partition");
    Ok(mountpoint)
}

pub fn umount(ctx: &Context<'_>, partition: u32, debug: bool) -> Result<()> {
    let mountpoint = ctx.mountpoint(partition);
    let spec = ctx.privilege.command("umount").arg(&mountpoint);
    exec(ctx, spec, &format!("unmounting partition {partition}"), debug)?;
    tracing::info!(partition, mountpoint = %mountpoint.display(), "unmounted raw image partition");
    Ok(())
}
