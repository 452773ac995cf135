// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskdagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.job))
    }
}

/// Run every check a [`ConfigFile`] guarantees.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_commands(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(TaskdagError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        if job.cmd.trim().is_empty() {
            return Err(TaskdagError::ConfigError(format!(
                "job '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if dep == name {
                return Err(TaskdagError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.job.contains_key(dep) {
                return Err(TaskdagError::ConfigError(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction is dep -> job: `after = ["A"]` on B gives A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.job.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(TaskdagError::DagCycle(format!(
            "cycle detected in job graph involving job '{}'",
            cycle.node_id()
        ))),
    }
}
