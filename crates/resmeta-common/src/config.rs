//! Configuration types for resmeta
//!
//! Every section falls back to its defaults when omitted, so an empty TOML
//! file is a valid configuration.

use crate::error::{Error, Result};
use crate::types::{OperationMode, SegmentRule, wildcard_rules};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration for resmeta
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metadata processing configuration
    pub processing: ProcessingConfig,
    /// Persistent metadata database
    pub database: DatabaseConfig,
    /// Background persistence worker
    pub worker: WorkerConfig,
    /// Management server environment
    pub environment: EnvironmentConfig,
    /// Unresolve policy used to key cached metadata
    pub unresolve: UnresolveConfig,
    /// Screen id to required resources
    pub screens: BTreeMap<String, ScreenConfig>,
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`. A missing file yields the
    /// default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.processing.batch_size == 0 {
            return Err(Error::configuration("processing.batch_size must be positive"));
        }
        if self.worker.queue_capacity == 0 {
            return Err(Error::configuration("worker.queue_capacity must be positive"));
        }
        if let Some(rule) = self.unresolve.rules.iter().find(|r| r.key.is_empty()) {
            return Err(Error::configuration(format!(
                "unresolve rule with empty key (scope {})",
                rule.scope
            )));
        }
        Ok(())
    }
}

/// Metadata processing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Operations combined into one composite request
    pub batch_size: usize,
    /// Recursion depth for non-recursive description reads
    pub rrd_depth: u32,
    /// Ask the server to include alias children
    pub include_aliases: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            rrd_depth: 3,
            include_aliases: true,
        }
    }
}

/// Persistent metadata database configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Use the persistent database as a warm-start cache
    pub enabled: bool,
    /// Path of the database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("./resmeta-data/metadata.redb"),
        }
    }
}

/// Background persistence worker configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Bound of the persistence queue
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Management server environment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub mode: OperationMode,
}

/// Unresolve policy configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UnresolveConfig {
    /// Ordered rules, first match wins
    pub rules: Vec<SegmentRule>,
}

impl Default for UnresolveConfig {
    fn default() -> Self {
        Self {
            rules: wildcard_rules(),
        }
    }
}

/// Resources required by one screen
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Address templates
    pub resources: Vec<String>,
    /// Fetch descriptions recursively
    pub recursive: bool,
}
