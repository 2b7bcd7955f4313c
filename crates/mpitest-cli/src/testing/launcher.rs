//! MPI launcher - run built test binaries across nodes

use mpitest_build::combined_output;
use mpitest_config::{LauncherConfig, MpiFlavor, TestAttributes};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Anything that can run a built test binary
pub trait Launch {
    /// Run the binary described by `request` and wait for it to exit
    fn launch(&self, request: &RunRequest) -> io::Result<RunOutput>;
}

impl<T: Launch + ?Sized> Launch for &T {
    fn launch(&self, request: &RunRequest) -> io::Result<RunOutput> {
        (**self).launch(request)
    }
}

/// What to run and where
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Test name
    pub name: String,
    /// Binary to launch
    pub binary: PathBuf,
    /// Working directory (the test's sandbox)
    pub workdir: PathBuf,
    /// Attribute set, node count already merged in
    pub attributes: TestAttributes,
    /// File receiving the captured output
    pub log: PathBuf,
}

/// Outcome of one launch
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// Stdout output
    pub stdout: String,
    /// Stderr output
    pub stderr: String,
    /// Wall-clock run time
    pub duration: Duration,
}

impl RunOutput {
    /// Check if the run passed
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Get combined output
    pub fn output(&self) -> String {
        combined_output(&self.stdout, &self.stderr)
    }
}

/// Launcher for one MPI implementation
#[derive(Debug, Clone)]
pub struct MpiLauncher {
    flavor: MpiFlavor,
    config: LauncherConfig,
}

impl MpiLauncher {
    /// Create a launcher for the given flavor
    ///
    /// A relative hostfile is anchored at the current directory, since the
    /// launcher itself runs inside the sandbox.
    pub fn new(flavor: MpiFlavor, mut config: LauncherConfig) -> Self {
        if let Some(hostfile) = config.hostfile.as_mut() {
            if hostfile.is_relative() {
                match env::current_dir() {
                    Ok(cwd) => *hostfile = cwd.join(&*hostfile),
                    Err(e) => {
                        warn!(hostfile = %hostfile.display(), error = %e, "cannot resolve hostfile")
                    }
                }
            }
        }
        Self { flavor, config }
    }

    /// Build the launch command for a request
    pub fn command(&self, request: &RunRequest) -> Command {
        let attributes = &request.attributes;
        let np = attributes.process_count().to_string();
        let env = attributes.launch_env();

        let mut command = Command::new(self.config.program_for(self.flavor));
        command.args(&self.config.args);

        match self.flavor {
            MpiFlavor::Mpich => {
                command.arg("-n").arg(&np);
                if let Some(hostfile) = &self.config.hostfile {
                    command.arg("-f").arg(hostfile);
                }
                for (key, value) in &env {
                    command.arg("-genv").arg(key).arg(value);
                }
            }
            MpiFlavor::Mvapich => {
                command.arg("-np").arg(&np);
                if let Some(hostfile) = &self.config.hostfile {
                    command.arg("-hostfile").arg(hostfile);
                }
                for (key, value) in &env {
                    command.arg(format!("{}={}", key, value));
                }
            }
            MpiFlavor::Openmpi => {
                command.arg("-np").arg(&np);
                if let Some(hostfile) = &self.config.hostfile {
                    command.arg("--hostfile").arg(hostfile);
                }
                for (key, value) in &env {
                    command.arg("-x").arg(format!("{}={}", key, value));
                }
            }
        }

        command
            .arg(&request.binary)
            .args(&attributes.args)
            .envs(&env)
            .current_dir(&request.workdir);
        command
    }

    fn write_log(&self, request: &RunRequest, command: &Command, output: &RunOutput) {
        let exit = output
            .exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let content = format!("$ {:?}\nexit code: {}\n{}", command, exit, output.output());
        if let Err(e) = fs::write(&request.log, content) {
            warn!(log = %request.log.display(), error = %e, "failed to write run log");
        }
    }
}

impl Launch for MpiLauncher {
    fn launch(&self, request: &RunRequest) -> io::Result<RunOutput> {
        let mut command = self.command(request);
        debug!(test = %request.name, mpi = %self.flavor, ?command, "launching");

        let start = Instant::now();
        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?
            .wait_with_output()?;

        let result = RunOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        self.write_log(request, &command, &result);
        Ok(result)
    }
}
