//! Per-test working directories
//!
//! Every descriptor gets `<workspace>/<name>`. Acquiring a sandbox creates
//! the directory if needed and is safe to repeat; existing contents are
//! left in place.

use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A test's working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    name: String,
    path: PathBuf,
}

impl Sandbox {
    /// Create (if missing) and return the sandbox of `name` under `workspace`
    pub fn acquire(workspace: &Path, name: &str) -> BuildResult<Self> {
        Self::at(workspace.join(name), name)
    }

    /// Create (if missing) and return a sandbox at an explicit path
    pub fn at(path: impl Into<PathBuf>, name: &str) -> BuildResult<Self> {
        let path = path.into();
        if !path.is_dir() {
            debug!(sandbox = %path.display(), "creating sandbox");
        }
        fs::create_dir_all(&path).map_err(|e| BuildError::io(&path, e))?;
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Name of the test owning this sandbox
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the sandbox
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}
