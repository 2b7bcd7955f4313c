//! Test driver infrastructure
//!
//! Discovers YAML descriptors, builds and launches each test case under
//! MPI, and streams outcomes as TAP.

pub mod discovery;
pub mod launcher;
pub mod reporter;
pub mod runner;
pub mod summary;

pub use discovery::TestSuite;
pub use launcher::MpiLauncher;
pub use reporter::TapReporter;
pub use runner::TestRunner;
pub use summary::RunSummary;
