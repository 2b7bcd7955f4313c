//! Run Configuration
//!
//! Merges CLI overrides, the environment and built-in defaults into one
//! immutable [`RunConfig`]. This is the only place that consults the
//! environment; the lookup is injected so callers decide where variables
//! come from.

use crate::mpi::MpiFlavor;
use crate::toolchain::ToolchainConfig;
use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;
use tracing::debug;

/// Environment variable supplying the default workspace directory
pub const WORKSPACE_ENV: &str = "prefix";

/// Default test case label
pub const DEFAULT_TESTCASE: &str = "small";
/// Default number of nodes
pub const DEFAULT_NODES: u32 = 4;
/// Default directory of YAML test descriptors
pub const DEFAULT_YAML_DIR: &str = "./tests";
/// Default directory of X10 test sources
pub const DEFAULT_X10_DIR: &str = "../../src/test";
/// Default source root handed to the compiler, relative to the current directory
pub const DEFAULT_SOURCE_DIR: &str = "../../src";
/// Workspace used when neither `--workspace` nor `prefix` is set
pub const DEFAULT_WORKSPACE: &str = "./workspace";

/// Extension of X10 source files
pub const SOURCE_EXTENSION: &str = "x10";

/// Values supplied explicitly by the caller (usually CLI flags)
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub testcase: Option<String>,
    pub nodes: Option<u32>,
    pub mpi: Option<MpiFlavor>,
    pub yaml_dir: Option<PathBuf>,
    pub x10_dir: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub toolchain: Option<PathBuf>,
}

/// Fully resolved configuration of one test run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Test case label selected in every YAML descriptor
    pub testcase: String,
    /// Number of nodes each test is launched on
    pub nodes: u32,
    /// MPI implementation used to launch tests
    pub mpi: MpiFlavor,
    /// Directory containing `*.yaml` descriptors
    pub yaml_dir: PathBuf,
    /// Directory containing `<name>.x10` sources
    pub x10_dir: PathBuf,
    /// Directory holding one sandbox per descriptor
    pub workspace: PathBuf,
    /// Source root passed to the compiler
    pub source_dir: PathBuf,
    /// Compiler and launcher description
    pub toolchain: ToolchainConfig,
}

impl RunConfig {
    /// Resolve the run configuration
    ///
    /// Each field takes the override if present, otherwise the built-in
    /// default. The workspace additionally falls back to the `prefix`
    /// variable returned by `env` before using the default.
    pub fn resolve<F>(overrides: RunOverrides, env: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nodes = overrides.nodes.unwrap_or(DEFAULT_NODES);
        if nodes == 0 {
            return Err(ConfigError::invalid_value(
                "nodes",
                "node count must be at least 1",
            ));
        }

        let testcase = overrides
            .testcase
            .unwrap_or_else(|| DEFAULT_TESTCASE.to_string());
        if testcase.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "test",
                "test case label must not be empty",
            ));
        }

        let workspace = Self::resolve_workspace(overrides.workspace, &env);

        let toolchain = match overrides.toolchain {
            Some(path) => ToolchainConfig::load_from_file(&path)?,
            None => ToolchainConfig::default(),
        };

        let config = Self {
            testcase,
            nodes,
            mpi: overrides.mpi.unwrap_or_default(),
            yaml_dir: overrides
                .yaml_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_YAML_DIR)),
            x10_dir: overrides
                .x10_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_X10_DIR)),
            workspace,
            source_dir: overrides
                .source_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)),
            toolchain,
        };

        debug!(?config, "resolved run configuration");
        Ok(config)
    }

    fn resolve_workspace<F>(explicit: Option<PathBuf>, env: &F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return path;
        }
        match env(WORKSPACE_ENV) {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => PathBuf::from(DEFAULT_WORKSPACE),
        }
    }

    /// Source file built for the descriptor `name`
    pub fn source_for(&self, name: &str) -> PathBuf {
        self.x10_dir.join(format!("{}.{}", name, SOURCE_EXTENSION))
    }

    /// Sandbox directory of the descriptor `name`
    pub fn sandbox_for(&self, name: &str) -> PathBuf {
        self.workspace.join(name)
    }
}
