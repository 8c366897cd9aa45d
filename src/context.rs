use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use anyhow::Result;

use crate::config::KrsConfig;
use crate::extension::Registry;
use crate::firmware::FirmwareLayout;
use crate::util::process::{CommandRunner, CommandSpec};

/// Everything a handler needs from the process that dispatched it.
pub struct Context<'a> {
    pub config: &'a KrsConfig,
    pub registry: &'a Registry,
    pub runner: &'a dyn CommandRunner,
    pub firmware: FirmwareLayout,
    pub privilege: Privilege,
}

impl<'a> Context<'a> {
    pub fn new(
        config: &'a KrsConfig,
        registry: &'a Registry,
        runner: &'a dyn CommandRunner,
    ) -> Result<Self> {
        let firmware = FirmwareLayout::new(config.firmware_dir()?);
        tracing::debug!(firmware = %firmware.root().display(), "resolved firmware directory");
        Ok(Self {
            config,
            registry,
            runner,
            firmware,
            privilege: Privilege::from_config(config),
        })
    }

    /// Mount point of raw image partition `partition`.
    pub fn mountpoint(&self, partition: u32) -> PathBuf {
        PathBuf::from(format!("{}{partition}", self.config.mount_prefix()))
    }
}

/// Privilege escalation prefix for commands touching root-owned files.
#[derive(Clone, Debug)]
pub struct Privilege {
    program: Option<OsString>,
}

impl Privilege {
    pub fn from_config(config: &KrsConfig) -> Self {
        let sudo = config.privilege.sudo.trim();
        Self {
            program: (!sudo.is_empty()).then(|| OsString::from(sudo)),
        }
    }

    pub fn none() -> Self {
        Self { program: None }
    }

    pub fn command(&self, program: impl AsRef<OsStr>) -> CommandSpec {
        match &self.program {
            Some(sudo) => CommandSpec::new(sudo.clone()).arg(program.as_ref()),
            None => CommandSpec::new(program.as_ref()),
        }
    }
}
