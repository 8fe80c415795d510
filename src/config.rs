//! Runtime configuration
//!
//! Where to find extra schema definitions, which format version to force
//! and what resource limits apply. Values come from the environment and can
//! be overridden with builder methods.

use std::env;
use std::path::PathBuf;

use crate::error::Result;
use crate::limits::Limits;
use crate::names;
use crate::validators::SchemaRegistry;

/// Environment variable listing extra schema directories
pub const SCHEMA_PATH_VAR: &str = "SDF_PATH";

/// Environment variable forcing a format version
pub const VERSION_VAR: &str = "SDF_VERSION";

/// Processing configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directories searched for `*.xml` schema definitions
    pub schema_paths: Vec<PathBuf>,
    /// Version used instead of the one declared by documents
    pub forced_version: Option<String>,
    /// Resource limits for loading and parsing
    pub limits: Limits,
}

impl Config {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `SDF_PATH` and `SDF_VERSION` from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Build a configuration from a variable lookup function
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(paths) = lookup(SCHEMA_PATH_VAR) {
            config.schema_paths = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        if let Some(version) = lookup(VERSION_VAR).filter(|v| !v.trim().is_empty()) {
            let version = version.trim();
            names::validate_version(version)?;
            config.forced_version = Some(version.to_string());
        }

        tracing::debug!(
            schema_paths = config.schema_paths.len(),
            forced_version = ?config.forced_version,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Add a schema search directory
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_paths.push(path.into());
        self
    }

    /// Force a format version
    pub fn with_forced_version(mut self, version: impl Into<String>) -> Self {
        self.forced_version = Some(version.into());
        self
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the schema registry this configuration describes
    pub fn registry(&self) -> Result<SchemaRegistry> {
        SchemaRegistry::from_config(self)
    }
}
