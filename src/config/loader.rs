// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskdagError};

/// File names probed by [`find_config`], in order.
pub const DEFAULT_CONFIG_NAMES: [&str; 3] = ["Taskdag.toml", "taskdag.toml", ".taskdag.toml"];

/// Parse a config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Parse and validate a config file.
///
/// Relative job directories in the result resolve against the directory
/// holding `path`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;

    debug!(path = %path.display(), jobs = config.job.len(), "config loaded");
    Ok(config.with_base_dir(config_dir(path)))
}

/// Walk from `start` up to the filesystem root and return the first
/// [`DEFAULT_CONFIG_NAMES`] entry that exists.
pub fn find_config(start: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start.as_ref();

    for dir in start.ancestors() {
        for name in DEFAULT_CONFIG_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found config file");
                return Ok(candidate);
            }
        }
    }

    Err(TaskdagError::ConfigNotFound {
        start: start.to_path_buf(),
        names: DEFAULT_CONFIG_NAMES.join(", "),
    })
}

/// Resolve the config to use: the explicit path if given, else the nearest
/// default-named file above the current directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => find_config(std::env::current_dir()?),
    }
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(config_dir(Path::new("Taskdag.toml")), PathBuf::from("."));
        assert_eq!(config_dir(Path::new("ci/Taskdag.toml")), PathBuf::from("ci"));
    }
}
