//! Test binary builder
//!
//! Compiles one X10 test source into an executable inside the test's
//! sandbox. The compiler is invoked as
//!
//! ```text
//! <program> <flags...> -sourcepath <source_root> -o <sandbox>/<name> <source>
//! ```
//!
//! with the sandbox as working directory. A build never retries; the exit
//! status is handed back to the caller to decide what happens next.

use crate::error::{BuildError, BuildResult};
use crate::sandbox::Sandbox;
use mpitest_config::CompilerConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File in the sandbox receiving the compiler's output
pub const BUILD_LOG: &str = "build.log";

/// Anything that can turn a build request into a build output
pub trait Compile {
    /// Build the test described by `request`
    fn build_test(&self, request: &BuildRequest) -> BuildResult<BuildOutput>;
}

impl<T: Compile + ?Sized> Compile for &T {
    fn build_test(&self, request: &BuildRequest) -> BuildResult<BuildOutput> {
        (**self).build_test(request)
    }
}

/// What to build and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Test name, also the binary name
    pub name: String,
    /// Source file to compile
    pub source: PathBuf,
    /// Sandbox directory receiving the binary
    pub sandbox: PathBuf,
    /// Source root searched for imported classes
    pub source_root: PathBuf,
}

impl BuildRequest {
    /// Path of the binary produced by this request
    pub fn binary(&self) -> PathBuf {
        self.sandbox.join(&self.name)
    }
}

/// Result of one compiler invocation
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Test name
    pub name: String,
    /// Compiler exit code
    pub exit_code: i32,
    /// Stdout output
    pub stdout: String,
    /// Stderr output
    pub stderr: String,
    /// Wall-clock build time
    pub duration: Duration,
    /// Absolute binary path (only meaningful on success)
    pub binary: PathBuf,
}

impl BuildOutput {
    /// Check if the build succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output
    pub fn output(&self) -> String {
        combined_output(&self.stdout, &self.stderr)
    }
}

/// Captured stdout and stderr under `STDOUT:` / `STDERR:` headings
///
/// Empty streams are left out entirely.
pub fn combined_output(stdout: &str, stderr: &str) -> String {
    let mut output = String::new();
    if !stdout.is_empty() {
        output.push_str("STDOUT:\n");
        output.push_str(stdout);
        output.push('\n');
    }
    if !stderr.is_empty() {
        output.push_str("STDERR:\n");
        output.push_str(stderr);
    }
    output
}

/// Builder invoking the configured compiler
#[derive(Debug, Clone, Default)]
pub struct Builder {
    compiler: CompilerConfig,
}

impl Builder {
    /// Create a builder for the given compiler
    pub fn new(compiler: CompilerConfig) -> Self {
        Self { compiler }
    }

    /// Get the compiler configuration
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Build the compiler command line for a request
    ///
    /// All paths are made absolute because the compiler runs inside the
    /// sandbox.
    pub fn command(&self, request: &BuildRequest) -> BuildResult<Command> {
        let source = absolutize(&request.source)?;
        let source_root = absolutize(&request.source_root)?;
        let sandbox = absolutize(&request.sandbox)?;

        let mut command = Command::new(&self.compiler.program);
        command
            .args(&self.compiler.flags)
            .arg("-sourcepath")
            .arg(source_root)
            .arg("-o")
            .arg(sandbox.join(&request.name))
            .arg(source)
            .current_dir(sandbox);
        Ok(command)
    }

    fn write_log(&self, sandbox: &Sandbox, command: &Command, output: &BuildOutput) {
        let path = sandbox.file(BUILD_LOG);
        let content = format!(
            "$ {:?}\nexit code: {}\n{}",
            command,
            output.exit_code,
            output.output()
        );
        if let Err(e) = fs::write(&path, content) {
            warn!(
                test = %sandbox.name(),
                log = %path.display(),
                error = %e,
                "failed to write build log"
            );
        }
    }
}

impl Compile for Builder {
    fn build_test(&self, request: &BuildRequest) -> BuildResult<BuildOutput> {
        let sandbox = Sandbox::at(&request.sandbox, &request.name)?;

        if !request.source.is_file() {
            return Err(BuildError::source_not_found(&request.name, &request.source));
        }

        let mut command = self.command(request)?;
        debug!(test = %request.name, ?command, "invoking compiler");

        let start = Instant::now();
        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(|child| child.wait_with_output())
            .map_err(|error| BuildError::CompilerSpawn {
                name: request.name.clone(),
                program: self.compiler.program.clone(),
                error,
            })?;

        let result = BuildOutput {
            name: request.name.clone(),
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
            binary: absolutize(&request.binary())?,
        };

        self.write_log(&sandbox, &command, &result);

        if result.success() {
            info!(test = %request.name, duration = ?result.duration, "build succeeded");
        } else {
            warn!(test = %request.name, exit_code = result.exit_code, "build failed");
        }

        Ok(result)
    }
}

fn absolutize(path: &Path) -> BuildResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| BuildError::io(path, e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh_compiler(script: &str) -> CompilerConfig {
        // `sh -c <script> compiler <generated args...>`
        CompilerConfig {
            program: "sh".to_string(),
            flags: vec!["-c".to_string(), script.to_string(), "compiler".to_string()],
        }
    }

    fn request(dir: &Path, name: &str) -> BuildRequest {
        let source = dir.join(format!("{}.x10", name));
        fs::write(&source, "public class Main {}").unwrap();
        BuildRequest {
            name: name.to_string(),
            source,
            sandbox: dir.join("ws").join(name),
            source_root: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_build_output_success() {
        let output = BuildOutput {
            name: "t".to_string(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            binary: PathBuf::from("t"),
        };
        assert!(output.success());
    }

    #[test]
    fn test_build_output_combined() {
        let output = BuildOutput {
            name: "t".to_string(),
            exit_code: 1,
            stdout: "compiling".to_string(),
            stderr: "error: Main.x10:3".to_string(),
            duration: Duration::ZERO,
            binary: PathBuf::from("t"),
        };
        assert!(!output.success());
        let text = output.output();
        assert!(text.contains("STDOUT:"));
        assert!(text.contains("compiling"));
        assert!(text.contains("STDERR:"));
        assert!(text.contains("Main.x10:3"));
    }

    #[test]
    fn test_combined_output_skips_empty_streams() {
        assert_eq!(combined_output("", ""), "");
        assert_eq!(combined_output("", "boom"), "STDERR:\nboom");
        assert_eq!(combined_output("ok", ""), "STDOUT:\nok\n");
    }

    #[test]
    fn test_command_layout() {
        let dir = tempdir().unwrap();
        let req = request(dir.path(), "BFS");
        let builder = Builder::new(CompilerConfig {
            program: "x10c++".to_string(),
            flags: vec!["-O".to_string()],
        });

        let command = builder.command(&req).unwrap();
        assert_eq!(command.get_program(), "x10c++");
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args[0], "-O");
        assert_eq!(args[1], "-sourcepath");
        assert_eq!(args[3], "-o");
        assert!(args[4].ends_with("BFS"));
        assert!(args[5].ends_with("BFS.x10"));
    }

    #[test]
    fn test_build_success_writes_log() {
        let dir = tempdir().unwrap();
        let req = request(dir.path(), "PageRank");
        let builder = Builder::new(sh_compiler("echo built; exit 0"));

        let output = builder.build_test(&req).unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("built"));
        assert_eq!(output.binary, req.binary());

        let log = fs::read_to_string(req.sandbox.join(BUILD_LOG)).unwrap();
        assert!(log.contains("exit code: 0"));
    }

    #[test]
    fn test_build_failure_status() {
        let dir = tempdir().unwrap();
        let req = request(dir.path(), "SSSP");
        let builder = Builder::new(sh_compiler("echo broken >&2; exit 3"));

        let output = builder.build_test(&req).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
        assert!(output.stderr.contains("broken"));
    }

    #[test]
    fn test_build_missing_source() {
        let dir = tempdir().unwrap();
        let req = BuildRequest {
            name: "Missing".to_string(),
            source: dir.path().join("Missing.x10"),
            sandbox: dir.path().join("ws").join("Missing"),
            source_root: dir.path().to_path_buf(),
        };
        let err = Builder::new(sh_compiler("exit 0"))
            .build_test(&req)
            .unwrap_err();
        assert!(matches!(err, BuildError::SourceNotFound { .. }));
        // The sandbox is acquired before the source is checked
        assert!(req.sandbox.is_dir());
    }

    #[test]
    fn test_build_missing_compiler() {
        let dir = tempdir().unwrap();
        let req = request(dir.path(), "CC");
        let builder = Builder::new(CompilerConfig {
            program: "definitely-not-a-compiler-mpitest".to_string(),
            flags: Vec::new(),
        });
        let err = builder.build_test(&req).unwrap_err();
        assert!(matches!(err, BuildError::CompilerSpawn { .. }));
    }
}
