/// Build error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source file for test '{name}' not found: {path}")]
    SourceNotFound { name: String, path: PathBuf },

    #[error("Failed to start compiler '{program}' for test '{name}': {error}")]
    CompilerSpawn {
        name: String,
        program: String,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a source not found error
    pub fn source_not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound {
            name: name.into(),
            path: path.into(),
        }
    }
}
