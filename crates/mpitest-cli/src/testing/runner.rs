//! Test runner - build and launch every discovered test
//!
//! Descriptors are processed one at a time, in suite order. For each one
//! the sandbox is acquired, the attribute sets of the requested test case
//! are loaded, and every set is built and then launched. A failed build
//! is reported as `build failed` without launching anything.

use crate::testing::discovery::{TestDescriptor, TestSuite};
use crate::testing::launcher::{Launch, RunRequest};
use crate::testing::reporter::{ReportError, TapReporter};
use mpitest_build::{BuildError, BuildRequest, Compile, Sandbox};
use mpitest_config::{ConfigError, RunConfig, TestAttributes};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Description attached to tests whose build did not succeed
pub const BUILD_FAILED: &str = "build failed";

/// Errors that stop the whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Sandbox(#[from] BuildError),

    #[error(transparent)]
    Descriptor(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result of running a single attribute set
#[derive(Debug, Clone)]
pub enum TestResult {
    /// Test passed successfully
    Pass { duration: Duration },
    /// Test failed; `detail` carries captured output or the error text
    Fail {
        description: String,
        detail: String,
        duration: Duration,
    },
}

impl TestResult {
    /// Check if this result is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    /// Check if this result is a failure
    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }

    /// Get the duration of this test
    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Pass { duration } => *duration,
            TestResult::Fail { duration, .. } => *duration,
        }
    }

    /// Failure description, if any
    pub fn description(&self) -> Option<&str> {
        match self {
            TestResult::Pass { .. } => None,
            TestResult::Fail { description, .. } => Some(description),
        }
    }
}

/// A completed test run
#[derive(Debug, Clone)]
pub struct TestRun {
    /// The descriptor the test came from
    pub test: TestDescriptor,
    /// Position of the attribute set within the descriptor
    pub index: usize,
    /// Attribute set the test ran with
    pub attributes: TestAttributes,
    /// Result of running the test
    pub result: TestResult,
}

impl TestRun {
    /// Human readable name, e.g. `PageRank (small)` or `PageRank (large #2)`
    pub fn title(&self) -> String {
        if self.index == 0 {
            format!("{} ({})", self.test.name, self.attributes.label)
        } else {
            format!(
                "{} ({} #{})",
                self.test.name,
                self.attributes.label,
                self.index + 1
            )
        }
    }
}

/// Sequential build-then-launch runner
pub struct TestRunner<'a, C, L> {
    config: &'a RunConfig,
    compiler: C,
    launcher: L,
}

impl<'a, C: Compile, L: Launch> TestRunner<'a, C, L> {
    /// Create a runner for the given configuration
    pub fn new(config: &'a RunConfig, compiler: C, launcher: L) -> Self {
        Self {
            config,
            compiler,
            launcher,
        }
    }

    /// Run every descriptor of the suite, reporting each outcome as it
    /// completes
    ///
    /// Stops at the first sandbox or descriptor error; outcomes already
    /// reported stay in the stream.
    pub fn run<W: Write>(
        &self,
        suite: &TestSuite,
        reporter: &mut TapReporter<W>,
    ) -> Result<Vec<TestRun>, RunError> {
        let mut runs = Vec::new();

        for descriptor in suite.iter() {
            let sandbox = Sandbox::acquire(&self.config.workspace, &descriptor.name)?;
            let sets = TestAttributes::load_from_file(&descriptor.file, &self.config.testcase)?;
            debug!(
                test = %descriptor.name,
                count = sets.len(),
                attributes = ?sets,
                "loaded attribute sets"
            );

            for (index, attributes) in sets.into_iter().enumerate() {
                let attributes = attributes.with_nodes(self.config.nodes);
                let run = self.run_attribute_set(descriptor, &sandbox, index, attributes);
                reporter.report(&run)?;
                runs.push(run);
            }
        }

        Ok(runs)
    }

    fn run_attribute_set(
        &self,
        descriptor: &TestDescriptor,
        sandbox: &Sandbox,
        index: usize,
        attributes: TestAttributes,
    ) -> TestRun {
        let request = BuildRequest {
            name: descriptor.name.clone(),
            source: self.config.source_for(&descriptor.name),
            sandbox: sandbox.path().to_path_buf(),
            source_root: self.config.source_dir.clone(),
        };

        match self.compiler.build_test(&request) {
            Ok(output) if output.success() => {
                self.run_test(descriptor, sandbox, index, attributes, &output.binary)
            }
            Ok(output) => self.fail_run_test(
                descriptor,
                index,
                attributes,
                BUILD_FAILED,
                output.output(),
                output.duration,
            ),
            Err(e) => self.fail_run_test(
                descriptor,
                index,
                attributes,
                BUILD_FAILED,
                e.to_string(),
                Duration::ZERO,
            ),
        }
    }

    /// Launch a built binary and turn its exit status into a result
    fn run_test(
        &self,
        descriptor: &TestDescriptor,
        sandbox: &Sandbox,
        index: usize,
        attributes: TestAttributes,
        binary: &Path,
    ) -> TestRun {
        let request = RunRequest {
            name: descriptor.name.clone(),
            binary: binary.to_path_buf(),
            workdir: sandbox.path().to_path_buf(),
            log: sandbox.file(&format!("{}.{}.log", descriptor.name, index)),
            attributes,
        };

        let result = match self.launcher.launch(&request) {
            Ok(output) if output.success() => TestResult::Pass {
                duration: output.duration,
            },
            Ok(output) => TestResult::Fail {
                description: match output.exit_code {
                    Some(code) => format!("exit code {}", code),
                    None => "terminated by signal".to_string(),
                },
                detail: output.output(),
                duration: output.duration,
            },
            Err(e) => TestResult::Fail {
                description: "launch failed".to_string(),
                detail: e.to_string(),
                duration: Duration::ZERO,
            },
        };

        info!(
            test = %descriptor.name,
            index,
            passed = result.is_pass(),
            "test finished"
        );

        TestRun {
            test: descriptor.clone(),
            index,
            attributes: request.attributes,
            result,
        }
    }

    /// Record a failure without launching anything
    fn fail_run_test(
        &self,
        descriptor: &TestDescriptor,
        index: usize,
        attributes: TestAttributes,
        describe: &str,
        detail: String,
        duration: Duration,
    ) -> TestRun {
        info!(test = %descriptor.name, index, reason = describe, "test failed without running");
        TestRun {
            test: descriptor.clone(),
            index,
            attributes,
            result: TestResult::Fail {
                description: describe.to_string(),
                detail,
                duration,
            },
        }
    }
}
