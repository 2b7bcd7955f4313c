//! mpitest configuration system
//!
//! Provides everything a test run needs to know before it starts:
//! - Run configuration (test case label, node count, directories)
//! - MPI flavor selection
//! - Toolchain description (compiler and launcher, `toolchain.toml`)
//! - YAML test descriptors and their typed attribute sets
//!
//! # Configuration Hierarchy
//!
//! Each setting is resolved in the following order (earlier wins):
//! 1. CLI flags
//! 2. Environment variables (`prefix` for the workspace)
//! 3. Built-in defaults
//!
//! # Example
//!
//! ```no_run
//! use mpitest_config::{RunConfig, RunOverrides};
//!
//! let config = RunConfig::resolve(RunOverrides::default(), |key| std::env::var(key).ok()).unwrap();
//! println!("building in {}", config.workspace.display());
//! ```

pub mod attributes;
pub mod mpi;
pub mod run;
pub mod toolchain;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid YAML test descriptor {file}: {error}")]
    YamlParseError {
        file: PathBuf,
        error: serde_yaml::Error,
    },

    #[error("Test case '{label}' not found in {file}")]
    MissingTestCase { label: String, file: PathBuf },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown MPI implementation '{0}' (expected mpich, mvapich or openmpi)")]
    UnknownMpi(String),
}

impl ConfigError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use attributes::TestAttributes;
pub use mpi::MpiFlavor;
pub use run::{RunConfig, RunOverrides, WORKSPACE_ENV};
pub use toolchain::{CompilerConfig, LauncherConfig, ToolchainConfig};
