// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a file from disk and discovers the default one.
//! - [`validate`] turns a raw file into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{find_config, load_and_validate, load_from_path, resolve_config_path};
pub use model::{ConfigFile, ConfigSection, JobConfig, RawConfigFile};
pub use validate::validate_raw_config;
