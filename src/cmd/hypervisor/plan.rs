use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::{GuestKernel, HypervisorArgs};
use crate::firmware::{DEFAULT_RAMDISK, DEFAULT_ROOTFS};

/// Memory map and boot artifacts shared by every deployment.
const BASE_CONFIG: &str = "\
MEMORY_START=0x0
MEMORY_END=0x80000000
DEVICE_TREE=system.dtb
BOOTBIN=BOOT.BIN
XEN=xen
UBOOT_SOURCE=boot.source
UBOOT_SCRIPT=boot.scr
";

/// Validate guest and image counts. Returns advisory warnings.
pub fn check_counts(args: &HypervisorArgs) -> Result<Vec<String>> {
    let vms = args.domu.len() + args.dom0less.len() + 1;
    let ramdisks = args.ramdisks.len();
    let rootfs = args.rootfs.len();

    if ramdisks > args.dom0less.len() {
        bail!(
            "More ramdisks provided than dom0less VMs. Note that dom0's ramdisk should NOT be \
             indicated (ramdisks <= dom0less)."
        );
    }
    if rootfs > vms {
        bail!("More rootfs provided than VMs, including dom0's (rootfs <= domUs + dom0less + 1).");
    }

    let mut warnings: Vec<String> = Vec::new();
    if ramdisks > 0 && rootfs > 0 {
        if ramdisks + rootfs > vms {
            bail!(
                "More rootfs and ramdisks provided than VMs, including dom0's \
                 (rootfs + ramdisks <= domUs + dom0less + 1)."
            );
        }
        if ramdisks + rootfs < vms {
            warnings.push("More VMs than ramdisks and rootfs provided, will use defaults.".into());
        }
    }
    Ok(warnings)
}

/// Ramdisk and rootfs arguments name files at the top of the firmware directory.
pub fn check_image_names(args: &HypervisorArgs) -> Result<()> {
    for name in args.ramdisks.iter().chain(&args.rootfs) {
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            bail!("`{name}` must be a file name inside the firmware directory, not a path");
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guest {
    pub kernel: GuestKernel,
    /// Rootfs for dom0 and domUs, ramdisk for dom0less guests.
    pub image: String,
}

/// Guest layout of one Xen deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XenPlan {
    pub dom0: Guest,
    pub dom0_rootfs_defaulted: bool,
    pub domus: Vec<Guest>,
    pub dom0less: Vec<Guest>,
    pub extra_ramdisks: Vec<String>,
    pub extra_rootfs: Vec<String>,
}

impl XenPlan {
    /// Rootfs images go to dom0 first, then to each domU; dom0less guests take ramdisks in
    /// order. Guests without an explicit image fall back to the firmware defaults.
    pub fn new(dom0: GuestKernel, args: &HypervisorArgs) -> Self {
        let rootfs_for = |index: usize| {
            args.rootfs
                .get(index)
                .cloned()
                .unwrap_or_else(|| DEFAULT_ROOTFS.to_string())
        };

        let domus = args
            .domu
            .iter()
            .enumerate()
            .map(|(i, kernel)| Guest {
                kernel: *kernel,
                image: rootfs_for(i + 1),
            })
            .collect();
        let dom0less = args
            .dom0less
            .iter()
            .enumerate()
            .map(|(j, kernel)| Guest {
                kernel: *kernel,
                image: args
                    .ramdisks
                    .get(j)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_RAMDISK.to_string()),
            })
            .collect();

        Self {
            dom0: Guest {
                kernel: dom0,
                image: rootfs_for(0),
            },
            dom0_rootfs_defaulted: args.rootfs.is_empty(),
            domus,
            dom0less,
            extra_ramdisks: args.ramdisks.clone(),
            extra_rootfs: args.rootfs.clone(),
        }
    }

    pub fn num_domus(&self) -> usize {
        self.domus.len() + self.dom0less.len()
    }

    /// Kernel images referenced by any guest.
    pub fn kernels(&self) -> BTreeSet<&'static str> {
        std::iter::once(&self.dom0)
            .chain(&self.domus)
            .chain(&self.dom0less)
            .map(|guest| guest.kernel.image_name())
            .collect()
    }

    /// Top-level firmware files to stage next to the kernels, without duplicates.
    pub fn images(&self) -> BTreeSet<&str> {
        [DEFAULT_RAMDISK, DEFAULT_ROOTFS]
            .into_iter()
            .chain(self.extra_ramdisks.iter().map(String::as_str))
            .chain(self.extra_rootfs.iter().map(String::as_str))
            .collect()
    }

    /// Image-builder configuration (`xen.cfg`).
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("DOM0_KERNEL={}", self.dom0.kernel.image_name()),
            format!("DOM0_ROOTFS={}", self.dom0.image),
        ];
        for (i, guest) in self.domus.iter().enumerate() {
            lines.push(format!(
                "DOMU_KERNEL[{i}]=\"{}\"",
                guest.kernel.image_name()
            ));
            lines.push(format!("DOMU_ROOTFS[{i}]=\"{}\"", guest.image));
            lines.push(format!("DOMU_NOBOOT[{i}]=y"));
        }
        let offset = self.domus.len();
        for (j, guest) in self.dom0less.iter().enumerate() {
            let index = offset + j;
            lines.push(format!(
                "DOMU_KERNEL[{index}]=\"{}\"",
                guest.kernel.image_name()
            ));
            lines.push(format!("DOMU_RAMDISK[{index}]=\"{}\"", guest.image));
        }
        lines.push(format!("NUM_DOMUS={}", self.num_domus()));

        let mut config = String::from(BASE_CONFIG);
        for line in lines {
            config.push_str(&line);
            config.push('\n');
        }
        config
    }
}
