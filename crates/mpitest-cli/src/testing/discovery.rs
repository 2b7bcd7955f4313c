//! Test discovery - find YAML test descriptors

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of test descriptor files
pub const DESCRIPTOR_EXTENSION: &str = "yaml";

/// A discovered test descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    /// Base name of the file, used as test, binary and sandbox name
    pub name: String,
    /// Descriptor file
    pub file: PathBuf,
}

/// A suite of discovered descriptors
#[derive(Debug, Default)]
pub struct TestSuite {
    /// Descriptors sorted by file name
    pub descriptors: Vec<TestDescriptor>,
}

impl TestSuite {
    /// Discover every `*.yaml` file directly inside `root`
    ///
    /// Subdirectories are not searched and files with any other extension
    /// are ignored. Fails if `root` cannot be read.
    pub fn discover(root: &Path) -> Result<Self, walkdir::Error> {
        let mut suite = TestSuite::default();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if let Some(name) = descriptor_name(path) {
                suite.descriptors.push(TestDescriptor {
                    name,
                    file: path.to_path_buf(),
                });
            }
        }

        Ok(suite)
    }

    /// Keep descriptors whose name contains `pattern`
    pub fn filter(&self, pattern: &str) -> Self {
        let descriptors = self
            .descriptors
            .iter()
            .filter(|d| d.name.contains(pattern))
            .cloned()
            .collect();

        TestSuite { descriptors }
    }

    /// Check if suite has any descriptors
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Get count of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Iterate over descriptors in run order
    pub fn iter(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.descriptors.iter()
    }
}

/// Base name of a descriptor file, or `None` if it is not a descriptor
fn descriptor_name(path: &Path) -> Option<String> {
    if path.extension() != Some(OsStr::new(DESCRIPTOR_EXTENSION)) {
        return None;
    }
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "small:\n").unwrap();
    }

    #[test]
    fn test_discover_only_yaml_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.yaml");
        touch(dir.path(), "a.yaml");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "c.yml");

        let suite = TestSuite::discover(dir.path()).unwrap();
        let names: Vec<_> = suite.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_discover_skips_subdirectories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "top.yaml");
        let nested = dir.path().join("nested.yaml");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "inner.yaml");

        let suite = TestSuite::discover(dir.path()).unwrap();
        assert_eq!(suite.len(), 1);
        assert_eq!(suite.descriptors[0].name, "top");
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempdir().unwrap();
        let suite = TestSuite::discover(dir.path()).unwrap();
        assert!(suite.is_empty());
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(TestSuite::discover(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_descriptor_name() {
        assert_eq!(
            descriptor_name(Path::new("tests/PageRank.yaml")),
            Some("PageRank".to_string())
        );
        assert_eq!(descriptor_name(Path::new("tests/PageRank.YAML")), None);
        assert_eq!(descriptor_name(Path::new("tests/README")), None);
        assert_eq!(descriptor_name(Path::new("tests/.yaml")), None);
    }

    #[test]
    fn test_suite_filter() {
        let suite = TestSuite {
            descriptors: ["PageRank", "BFS", "PageRankStress"]
                .iter()
                .map(|name| TestDescriptor {
                    name: name.to_string(),
                    file: PathBuf::from(format!("{}.yaml", name)),
                })
                .collect(),
        };

        let filtered = suite.filter("PageRank");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.descriptors[1].name, "PageRankStress");
    }
}
