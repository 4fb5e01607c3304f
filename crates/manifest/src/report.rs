//! Summary of an emission run and its JSON index.

use dispatchgen_ir::{EmittedDispatch, MlirDialect};
use dispatchgen_library::{OperationKind, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedFile {
    pub name: String,
    pub kind: OperationKind,
    pub dialect: MlirDialect,
    /// Path relative to the build directory, `/`-separated.
    pub path: String,
}

impl EmittedFile {
    pub fn new(dispatch: &EmittedDispatch, relative_dir: &str) -> Self {
        Self {
            name: dispatch.name.clone(),
            kind: dispatch.kind,
            dialect: dispatch.dialect,
            path: format!("{}/{}", relative_dir, dispatch.file_name),
        }
    }

    pub fn absolute_path(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(&self.path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitReport {
    pub device: String,
    pub dispatches: Vec<EmittedFile>,
}

impl EmitReport {
    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dispatches.len()
    }

    pub fn count_for(&self, dialect: MlirDialect) -> usize {
        self.dispatches
            .iter()
            .filter(|file| file.dialect == dialect)
            .count()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
