use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "KRS_CONFIG";
pub const FIRMWARE_DIR_ENV: &str = "KRS_FIRMWARE_DIR";
const DEFAULT_MOUNT_PREFIX: &str = "/tmp/sdcard_img_p";

#[derive(Debug, Default, Deserialize)]
pub struct KrsConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub privilege: PrivilegeSection,
    /// Map of subverb name -> external handler override.
    #[serde(default)]
    pub handlers: HashMap<String, ToolEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathsSection {
    /// Selected firmware directory (kernels, device trees, imagebuilder, disk images).
    pub firmware_dir: Option<PathBuf>,
    /// Vitis installation root; `bin/v++` is used from here when set.
    pub vitis_dir: Option<PathBuf>,
    /// Raw image partitions are mounted at `<mount_prefix><partition>`.
    pub mount_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrivilegeSection {
    /// Program used to escalate privileges; empty disables escalation.
    #[serde(default = "default_sudo")]
    pub sudo: String,
}

impl Default for PrivilegeSection {
    fn default() -> Self {
        Self {
            sudo: default_sudo(),
        }
    }
}

fn default_sudo() -> String {
    "sudo".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolEntry {
    pub path: Option<PathBuf>,
}

impl KrsConfig {
    pub fn mount_prefix(&self) -> &str {
        self.paths
            .mount_prefix
            .as_deref()
            .unwrap_or(DEFAULT_MOUNT_PREFIX)
    }

    pub fn handler_path(&self, name: &str) -> Option<&Path> {
        self.handlers
            .get(name)
            .and_then(|entry| entry.path.as_deref())
    }

    /// Firmware directory: env override, then config, then `<cwd>/acceleration/firmware/select`.
    pub fn firmware_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(FIRMWARE_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.paths.firmware_dir {
            return Ok(dir.clone());
        }
        let cwd = std::env::current_dir().context("failed to resolve current directory")?;
        Ok(cwd.join("acceleration").join("firmware").join("select"))
    }
}

pub fn load(path_override: Option<&Path>) -> Result<KrsConfig> {
    match path_override {
        Some(path) => load_from(Some(path)),
        None => {
            let env_override = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
            load_from(env_override.as_deref())
        }
    }
}

pub fn load_from(path_override: Option<&Path>) -> Result<KrsConfig> {
    let Some(path) = path_override.map(Path::to_path_buf).or_else(config_path) else {
        return Ok(KrsConfig::default());
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(KrsConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: KrsConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn config_path() -> Option<PathBuf> {
    // Prefer XDG-style config path, but fall back to legacy ~/.krs/config.toml.
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("krs-dev");
        dir.push("config.toml");
        if dir.exists() {
            return Some(dir);
        }
    }
    dirs::home_dir().map(|mut home| {
        home.push(".krs");
        home.push("config.toml");
        home
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_from(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.privilege.sudo, "sudo");
        assert_eq!(config.mount_prefix(), "/tmp/sdcard_img_p");
        assert!(config.handlers.is_empty());
    }

    #[test]
    fn parses_all_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[paths]
firmware_dir = "/opt/firmware/select"
mount_prefix = "/mnt/krs_p"

[privilege]
sudo = ""

[handlers.hls]
path = "/usr/local/bin/hls-handler"

[handlers."v++"]
path = "/opt/vitis/bin/v++"
"#,
        )
        .unwrap();

        let config = load_from(Some(&path)).unwrap();
        assert_eq!(
            config.paths.firmware_dir.as_deref(),
            Some(Path::new("/opt/firmware/select"))
        );
        assert_eq!(config.mount_prefix(), "/mnt/krs_p");
        assert!(config.privilege.sudo.is_empty());
        assert_eq!(
            config.handler_path("hls"),
            Some(Path::new("/usr/local/bin/hls-handler"))
        );
        assert_eq!(
            config.handler_path("v++"),
            Some(Path::new("/opt/vitis/bin/v++"))
        );
        assert!(config.handler_path("board").is_none());
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[paths\nfirmware_dir = 1").unwrap();
        let err = load_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
