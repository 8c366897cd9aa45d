use std::path::{Path, PathBuf};

pub const RAW_IMAGE: &str = "sd_card.img";
pub const DEFAULT_RAMDISK: &str = "initrd.cpio";
pub const DEFAULT_ROOTFS: &str = "rootfs.cpio.gz";

/// File layout of the selected acceleration firmware directory.
#[derive(Clone, Debug)]
pub struct FirmwareLayout {
    root: PathBuf,
}

impl FirmwareLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A file at the top level of the firmware directory (ramdisks, rootfs, raw images).
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn kernel(&self, image: &str) -> PathBuf {
        self.root.join("kernel").join(image)
    }

    pub fn xen_bootbin(&self) -> PathBuf {
        self.root.join("bootbin").join("BOOT.BIN.xen")
    }

    pub fn xen(&self) -> PathBuf {
        self.root.join("xen")
    }

    pub fn xen_device_tree(&self) -> PathBuf {
        self.root.join("device_tree").join("system.dtb.xen")
    }

    pub fn imagebuilder_script(&self, script: &str) -> PathBuf {
        self.root.join("imagebuilder").join("scripts").join(script)
    }

    pub fn raw_image(&self) -> PathBuf {
        self.file(RAW_IMAGE)
    }

    pub fn raw_image_backup(&self) -> PathBuf {
        self.file(&format!("{RAW_IMAGE}.old"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_artifact_paths() {
        let layout = FirmwareLayout::new("/fw");
        assert_eq!(
            layout.kernel("Image_PREEMPT_RT"),
            Path::new("/fw/kernel/Image_PREEMPT_RT")
        );
        assert_eq!(layout.xen_bootbin(), Path::new("/fw/bootbin/BOOT.BIN.xen"));
        assert_eq!(
            layout.imagebuilder_script("disk_image"),
            Path::new("/fw/imagebuilder/scripts/disk_image")
        );
        assert_eq!(layout.raw_image_backup(), Path::new("/fw/sd_card.img.old"));
    }
}
