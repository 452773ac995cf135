#![allow(dead_code)]

use taskdag::config::{ConfigFile, JobConfig, RawConfigFile};
use taskdag::dag::Dag;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.config.max_workers = Some(n);
        self
    }

    pub fn fail_fast(mut self, on: bool) -> Self {
        self.config.config.fail_fast = on;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            job: JobConfig {
                cmd: cmd.to_string(),
                dir: None,
                groups: Vec::new(),
                after: Vec::new(),
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.job.groups.push(group.to_string());
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.job.dir = Some(dir.into());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// A `Dag<()>` from vertex ids and `(from, to)` edges.
pub fn dag_of(vertices: &[&str], edges: &[(&str, &str)]) -> Dag<()> {
    let dag = Dag::new();
    for id in vertices {
        dag.add_vertex(*id, ()).expect("adding test vertex");
    }
    for (from, to) in edges {
        dag.add_edge(from, to).expect("adding test edge");
    }
    dag
}
