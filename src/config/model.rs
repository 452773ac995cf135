// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// max_workers = 4
/// fail_fast = true
///
/// [job.build]
/// cmd = "cargo build"
///
/// [job.test]
/// cmd = "cargo test"
/// after = ["build"]
/// groups = ["ci"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigSection {
    /// Upper bound on jobs running at once. `None` means "one per available
    /// CPU".
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Stop starting new jobs once one has failed.
    #[serde(default)]
    pub fail_fast: bool,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JobConfig {
    /// Shell command to run.
    pub cmd: String,

    /// Working directory, relative to the directory holding the config file.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Groups this job belongs to, for `--group` selection.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Jobs that must finish before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

impl JobConfig {
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means the
/// job graph is known to be well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub job: BTreeMap<String, JobConfig>,
    /// Directory the config was loaded from; relative `dir`s resolve here.
    base_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, job: BTreeMap<String, JobConfig>) -> Self {
        Self {
            config,
            job,
            base_dir: None,
        }
    }

    pub(crate) fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Working directory for `job`: its `dir` joined onto the config's
    /// directory, or the config's directory itself.
    pub fn working_dir(&self, job: &JobConfig) -> Option<PathBuf> {
        match (&self.base_dir, &job.dir) {
            (Some(base), Some(dir)) => Some(base.join(dir)),
            (None, Some(dir)) => Some(dir.clone()),
            (Some(base), None) => Some(base.clone()),
            (None, None) => None,
        }
    }
}
