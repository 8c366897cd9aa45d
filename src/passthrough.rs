use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

use crate::config::KrsConfig;

/// Environment variable overriding the handler program of subverb `name`.
pub fn handler_env_key(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("KRS_BIN_{suffix}")
}

/// Resolve the handler program of subverb `name` using env override, config, an optional
/// preferred install location, then PATH.
pub fn resolve_handler(
    config: &KrsConfig,
    name: &str,
    program: &str,
    preferred: Option<&Path>,
) -> Result<PathBuf> {
    let env_key = handler_env_key(name);
    if let Some(path) = env::var_os(&env_key) {
        let pb = PathBuf::from(path);
        if pb.exists() {
            return Ok(pb);
        }
        bail!("{env_key} points to non-existent binary: {}", pb.display());
    }

    if let Some(custom) = config.handler_path(name) {
        if !custom.exists() {
            bail!(
                "configured handler path `{}` for `{name}` does not exist",
                custom.display()
            );
        }
        return Ok(custom.to_path_buf());
    }

    if let Some(candidate) = preferred.filter(|path| path.exists()) {
        return Ok(candidate.to_path_buf());
    }

    which::which(program).map_err(|error| {
        anyhow!(
            "failed to find `{program}` in PATH ({error}); set {env_key} or \
             [handlers.\"{name}\"].path in config"
        )
    })
}
