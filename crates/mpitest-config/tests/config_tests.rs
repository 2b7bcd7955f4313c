//! Configuration resolution and descriptor loading tests

use mpitest_config::{
    ConfigError, MpiFlavor, RunConfig, RunOverrides, TestAttributes, ToolchainConfig,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Run Configuration Tests
// ============================================================================

#[rstest]
#[case("mpich", MpiFlavor::Mpich)]
#[case("mvapich", MpiFlavor::Mvapich)]
#[case("OpenMPI", MpiFlavor::Openmpi)]
fn test_mpi_override(#[case] name: &str, #[case] expected: MpiFlavor) {
    let overrides = RunOverrides {
        mpi: Some(name.parse().unwrap()),
        ..Default::default()
    };
    let config = RunConfig::resolve(overrides, no_env).unwrap();
    assert_eq!(config.mpi, expected);
}

#[test]
fn test_all_overrides_applied() {
    let overrides = RunOverrides {
        testcase: Some("large".to_string()),
        nodes: Some(16),
        mpi: Some(MpiFlavor::Openmpi),
        yaml_dir: Some(PathBuf::from("ci/tests")),
        x10_dir: Some(PathBuf::from("src/test")),
        workspace: Some(PathBuf::from("/scratch/run")),
        source_dir: Some(PathBuf::from("src")),
        toolchain: None,
    };
    let config = RunConfig::resolve(overrides, |_| Some("/ignored".to_string())).unwrap();

    assert_eq!(config.testcase, "large");
    assert_eq!(config.nodes, 16);
    assert_eq!(config.mpi, MpiFlavor::Openmpi);
    assert_eq!(config.yaml_dir, PathBuf::from("ci/tests"));
    assert_eq!(config.x10_dir, PathBuf::from("src/test"));
    assert_eq!(config.workspace, PathBuf::from("/scratch/run"));
    assert_eq!(config.source_dir, PathBuf::from("src"));
}

#[test]
fn test_only_prefix_is_consulted() {
    let config = RunConfig::resolve(RunOverrides::default(), |key| {
        (key == "prefix").then(|| "/from/prefix".to_string())
    })
    .unwrap();
    assert_eq!(config.workspace, PathBuf::from("/from/prefix"));
}

// ============================================================================
// Toolchain Tests
// ============================================================================

#[test]
fn test_toolchain_loaded_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "toolchain.toml",
        r#"
[compiler]
program = "/opt/x10/bin/x10c++"
flags = ["-O"]

[launcher]
program = "mpiexec.hydra"
args = ["-bootstrap", "ssh"]
hostfile = "/etc/hosts.mpi"
"#,
    );

    let overrides = RunOverrides {
        toolchain: Some(path),
        ..Default::default()
    };
    let config = RunConfig::resolve(overrides, no_env).unwrap();

    assert_eq!(config.toolchain.compiler.program, "/opt/x10/bin/x10c++");
    assert_eq!(config.toolchain.compiler.flags, vec!["-O".to_string()]);
    assert_eq!(
        config.toolchain.launcher.program_for(config.mpi),
        "mpiexec.hydra"
    );
    assert_eq!(config.toolchain.launcher.args, vec!["-bootstrap", "ssh"]);
    assert_eq!(
        config.toolchain.launcher.hostfile,
        Some(PathBuf::from("/etc/hosts.mpi"))
    );
}

#[test]
fn test_toolchain_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "toolchain.toml", "[compiler\nprogram = 1");

    let err = ToolchainConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError { .. }));
}

// ============================================================================
// Descriptor Loading Tests
// ============================================================================

#[test]
fn test_load_descriptor_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "BFS.yaml",
        r#"
small:
  args: ["--scale", 14]
large:
  - args: ["--scale", 20]
  - args: ["--scale", 22]
"#,
    );

    let small = TestAttributes::load_from_file(&path, "small").unwrap();
    assert_eq!(small.len(), 1);
    assert_eq!(small[0].args, vec!["--scale", "14"]);

    let large = TestAttributes::load_from_file(&path, "large").unwrap();
    assert_eq!(large.len(), 2);
    assert!(large.iter().all(|a| a.label == "large"));
}

#[test]
fn test_load_descriptor_missing_file() {
    let err = TestAttributes::load_from_file(Path::new("/nonexistent/BFS.yaml"), "small")
        .unwrap_err();
    assert!(matches!(err, ConfigError::IoError { .. }));
}

#[test]
fn test_load_descriptor_missing_label_names_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "BFS.yaml", "small:\n  args: []\n");

    let err = TestAttributes::load_from_file(&path, "medium").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("medium"));
    assert!(message.contains("BFS.yaml"));
}

#[rstest]
#[case("small: 42\n")]
#[case("- just\n- a list\n")]
#[case("small:\n  threads: many\n")]
fn test_load_descriptor_wrong_shape(#[case] content: &str) {
    let err = TestAttributes::parse(content, Path::new("bad.yaml"), "small").unwrap_err();
    assert!(matches!(err, ConfigError::YamlParseError { .. }));
}

#[test]
fn test_yaml_node_is_replaced_by_run_nodes() {
    let sets = TestAttributes::parse("small:\n  node: 2\n", Path::new("a.yaml"), "small").unwrap();
    assert_eq!(sets[0].node, 2);
    assert_eq!(sets[0].clone().with_nodes(8).node, 8);
}
