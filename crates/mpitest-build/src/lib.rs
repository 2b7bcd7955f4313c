//! mpitest build infrastructure
//!
//! Provides the build half of a test run:
//! - Sandbox directories, one per test descriptor
//! - Compiler invocation for X10 test sources
//! - Captured build output and logs

pub mod builder;
pub mod error;
pub mod sandbox;

// Re-export main types
pub use builder::{combined_output, BuildOutput, BuildRequest, Builder, Compile, BUILD_LOG};
pub use error::{BuildError, BuildResult};
pub use sandbox::Sandbox;
