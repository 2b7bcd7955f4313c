use anyhow::Result;
use clap::Parser;
use mpitest_config::{MpiFlavor, RunOverrides};
use std::path::PathBuf;

mod logging;
mod testing;

/// Build and run X10 tests under MPI, reporting results as TAP.
///
/// Every `*.yaml` file in the descriptor directory names one test. The
/// test case selected with `--test` is read from each descriptor; each of
/// its attribute sets is compiled into a sandbox under the workspace and
/// launched with the chosen MPI implementation.
///
/// EXAMPLES:
///     mpitest                           Run the small test case on 4 nodes
///     mpitest -t large -n 16            Run the large test case on 16 nodes
///     mpitest --mpi openmpi             Launch with Open MPI
///     mpitest --filter PageRank         Only run matching descriptors
///
/// ENVIRONMENT VARIABLES:
///     prefix      Workspace directory when --workspace is not given
///     RUST_LOG    Log filter (overrides --debug)
///     NO_COLOR    Set to disable colored output
#[derive(Parser, Debug)]
#[command(name = "mpitest")]
#[command(version)]
struct Cli {
    /// Test case label read from every descriptor [default: small]
    #[arg(short = 't', long = "test", value_name = "LABEL")]
    testcase: Option<String>,

    /// Number of nodes each test runs on [default: 4]
    #[arg(short = 'n', value_name = "NODES")]
    nodes: Option<u32>,

    /// MPI implementation: mpich, mvapich or openmpi [default: mvapich]
    #[arg(long, value_name = "MPI")]
    mpi: Option<MpiFlavor>,

    /// Directory of YAML test descriptors [default: ./tests]
    #[arg(long = "yamlDir", visible_alias = "yaml-dir", value_name = "DIR")]
    yaml_dir: Option<PathBuf>,

    /// Directory of X10 test sources [default: ../../src/test, relative to the current directory]
    #[arg(long = "x10dir", value_name = "DIR")]
    x10_dir: Option<PathBuf>,

    /// Directory receiving one sandbox per test [default: $prefix, else ./workspace]
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Source root handed to the compiler [default: ../../src, relative to the current directory]
    #[arg(long = "source", value_name = "DIR")]
    source_dir: Option<PathBuf>,

    /// TOML file describing the compiler and MPI launcher
    #[arg(long, value_name = "FILE")]
    toolchain: Option<PathBuf>,

    /// Only run descriptors whose name contains PATTERN
    #[arg(long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Write a JSON summary of the run to FILE
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,
}

impl Cli {
    fn into_args(self) -> commands::test::TestArgs {
        commands::test::TestArgs {
            overrides: RunOverrides {
                testcase: self.testcase,
                nodes: self.nodes,
                mpi: self.mpi,
                yaml_dir: self.yaml_dir,
                x10_dir: self.x10_dir,
                workspace: self.workspace,
                source_dir: self.source_dir,
                toolchain: self.toolchain,
            },
            filter: self.filter,
            summary_json: self.summary_json,
            no_color: self.no_color,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);
    commands::test::run(cli.into_args())
}
