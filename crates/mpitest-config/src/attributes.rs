//! YAML test descriptors
//!
//! A descriptor maps test case labels to one attribute mapping or a list of
//! them. Each mapping becomes a typed [`TestAttributes`] record:
//!
//! ```yaml
//! small:
//!   args: ["-s", 10]
//!   threads: 4
//! large:
//!   - args: ["-s", 20]
//!   - args: ["-s", 22]
//!     places_per_node: 2
//!     env: { GC_NPROCS: 2 }
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Environment variable carrying the X10 worker thread count
pub const THREADS_ENV: &str = "X10_NTHREADS";

/// One concrete test invocation read from a descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestAttributes {
    /// Test case label this set was selected by
    pub label: String,
    /// Number of nodes; replaced by the run's node count before use
    pub node: u32,
    /// Program arguments passed to the test binary
    pub args: Vec<String>,
    /// MPI processes started on every node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places_per_node: Option<u32>,
    /// Worker threads per place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    /// Extra environment for the launched processes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Keys not interpreted by mpitest
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Attribute mapping as written in YAML
#[derive(Debug, Default, Deserialize)]
struct RawAttributes {
    #[serde(default)]
    node: Option<u32>,
    #[serde(default)]
    args: Option<Value>,
    #[serde(default)]
    places_per_node: Option<u32>,
    #[serde(default)]
    threads: Option<u32>,
    #[serde(default)]
    env: BTreeMap<String, Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl TestAttributes {
    /// Load every attribute set of `label` from a descriptor file
    pub fn load_from_file(path: &Path, label: &str) -> ConfigResult<Vec<Self>> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::parse(&content, path, label)
    }

    /// Parse every attribute set of `label` from descriptor text
    pub fn parse(content: &str, file: &Path, label: &str) -> ConfigResult<Vec<Self>> {
        let yaml_error = |error| ConfigError::YamlParseError {
            file: file.to_path_buf(),
            error,
        };

        let cases: BTreeMap<String, Value> = serde_yaml::from_str(content).map_err(yaml_error)?;

        let entry = cases
            .get(label)
            .ok_or_else(|| ConfigError::MissingTestCase {
                label: label.to_string(),
                file: file.to_path_buf(),
            })?;

        let raw_sets: Vec<RawAttributes> = match entry {
            Value::Null => vec![RawAttributes::default()],
            Value::Sequence(items) => items
                .iter()
                .map(|item| serde_yaml::from_value(item.clone()))
                .collect::<Result<_, _>>()
                .map_err(yaml_error)?,
            other => vec![serde_yaml::from_value(other.clone()).map_err(yaml_error)?],
        };

        raw_sets
            .into_iter()
            .map(|raw| Self::from_raw(raw, file, label))
            .collect()
    }

    fn from_raw(raw: RawAttributes, file: &Path, label: &str) -> ConfigResult<Self> {
        let invalid = |field: &str, reason: String| {
            ConfigError::invalid_value(
                field,
                format!("{} (test case '{}' in {})", reason, label, file.display()),
            )
        };

        let args: Vec<String> = match raw.args {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(line)) => line.split_whitespace().map(str::to_string).collect(),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| {
                    scalar_to_string(item)
                        .ok_or_else(|| invalid("args", "arguments must be scalars".to_string()))
                })
                .collect::<ConfigResult<_>>()?,
            Some(_) => {
                return Err(invalid(
                    "args",
                    "expected a list or a whitespace separated string".to_string(),
                ))
            }
        };

        let env: BTreeMap<String, String> = raw
            .env
            .iter()
            .map(|(key, value)| {
                scalar_to_string(value)
                    .map(|v| (key.clone(), v))
                    .ok_or_else(|| invalid("env", format!("value of '{}' must be a scalar", key)))
            })
            .collect::<ConfigResult<_>>()?;

        if raw.places_per_node == Some(0) {
            return Err(invalid("places_per_node", "must be at least 1".to_string()));
        }

        Ok(Self {
            label: label.to_string(),
            node: raw.node.unwrap_or(1),
            args,
            places_per_node: raw.places_per_node,
            threads: raw.threads,
            env,
            extra: raw.extra,
        })
    }

    /// Replace the node count
    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.node = nodes;
        self
    }

    /// Total number of MPI processes to start
    ///
    /// Computed in `u64` so any `u32` node count times any `u32` places
    /// per node fits.
    pub fn process_count(&self) -> u64 {
        u64::from(self.node) * u64::from(self.places_per_node.unwrap_or(1))
    }

    /// Environment handed to the launched processes
    pub fn launch_env(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        if let Some(threads) = self.threads {
            env.insert(THREADS_ENV.to_string(), threads.to_string());
        }
        env
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
