//! Toolchain Configuration (toolchain.toml)
//!
//! Describes how test sources are compiled and how the resulting binaries
//! are launched. Every section is optional; omitted values fall back to
//! the X10 + MPI defaults.

use crate::mpi::MpiFlavor;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Toolchain configuration from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Compiler used to build test binaries
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// MPI launcher used to run test binaries
    #[serde(default)]
    pub launcher: LauncherConfig,
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Compiler executable (default: "x10c++")
    #[serde(default = "default_compiler")]
    pub program: String,

    /// Flags placed before the generated arguments
    #[serde(default = "default_compiler_flags")]
    pub flags: Vec<String>,
}

fn default_compiler() -> String {
    "x10c++".to_string()
}

fn default_compiler_flags() -> Vec<String> {
    ["-x10rt", "mpi", "-O", "-NO_CHECKS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler(),
            flags: default_compiler_flags(),
        }
    }
}

/// Launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Launcher executable; defaults to the MPI flavor's own launcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Arguments inserted right after the launcher program
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Host file handed to the launcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostfile: Option<PathBuf>,
}

impl LauncherConfig {
    /// Launcher program for the given flavor
    pub fn program_for(&self, flavor: MpiFlavor) -> &str {
        self.program
            .as_deref()
            .unwrap_or_else(|| flavor.default_launcher())
    }
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let mut config = Self::parse(&content, path)?;

        // Launchers run inside the sandbox, so relative paths are anchored
        // at the directory holding the toolchain file.
        if let Some(hostfile) = config.launcher.hostfile.take() {
            config.launcher.hostfile = Some(config_dir(path)?.join(hostfile));
        }
        Ok(config)
    }

    /// Parse toolchain configuration from TOML text
    pub fn parse(content: &str, file: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|error| ConfigError::TomlParseError {
            file: file.to_path_buf(),
            error,
        })
    }
}

/// Absolute directory containing `path`
fn config_dir(path: &Path) -> ConfigResult<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = env::current_dir().map_err(|e| ConfigError::io(path, e))?;
    Ok(cwd.join(dir))
}
