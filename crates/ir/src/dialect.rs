//! MLIR front-end dialects a dispatch can be emitted in.

use dispatchgen_library::{DataType, DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MlirDialect {
    /// Named `linalg` structured ops on tensors.
    Linalg,
    /// `flow.dispatch.region` wrapping the linalg op.
    Flow,
}

impl MlirDialect {
    pub const ALL: [MlirDialect; 2] = [MlirDialect::Linalg, MlirDialect::Flow];

    pub fn as_str(&self) -> &'static str {
        match self {
            MlirDialect::Linalg => "linalg",
            MlirDialect::Flow => "flow",
        }
    }
}

impl fmt::Display for MlirDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MlirDialect {
    type Err = DispatchError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "linalg" => Ok(MlirDialect::Linalg),
            "flow" => Ok(MlirDialect::Flow),
            other => Err(DispatchError::UnsupportedDialect(other.to_string())),
        }
    }
}

/// Ranked tensor type such as `tensor<128x32xf16>`.
pub fn tensor_type(shape: &[usize], dtype: DataType) -> String {
    if shape.is_empty() {
        return format!("tensor<{}>", dtype.element_type());
    }
    let dims = shape
        .iter()
        .map(|dim| dim.to_string())
        .collect::<Vec<_>>()
        .join("x");
    format!("tensor<{}x{}>", dims, dtype.element_type())
}
