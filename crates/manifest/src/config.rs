//! Manifest configuration.

use std::path::{Path, PathBuf};

/// Directory under the build root that receives generated sources.
pub const GENERATED_DIR: &str = "generated";

/// File name of the JSON index written next to the generated sources.
pub const INDEX_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub build_dir: PathBuf,
    /// Target backend the dispatches are meant for; recorded, not interpreted.
    pub device: String,
}

impl ManifestConfig {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            ..Self::default()
        }
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.build_dir.join(GENERATED_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.generated_dir().join(INDEX_FILE)
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("."),
            device: "cuda".to_string(),
        }
    }
}
