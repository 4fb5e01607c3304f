//! Element types, layouts and tiling parameters shared by every operation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    F16,
    BF16,
    F32,
    I8,
    I32,
}

impl DataType {
    pub fn element_type(&self) -> &'static str {
        match self {
            DataType::F16 => "f16",
            DataType::BF16 => "bf16",
            DataType::F32 => "f32",
            DataType::I8 => "i8",
            DataType::I32 => "i32",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F16 | DataType::BF16 | DataType::F32)
    }

    /// Literal for the additive identity, as accepted by `arith.constant`.
    pub fn zero_literal(&self) -> &'static str {
        if self.is_float() {
            "0.0"
        } else {
            "0"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    #[default]
    RowMajor,
    ColumnMajor,
}

impl MatrixLayout {
    /// BLAS-style suffix: `t` for row-major, `n` for column-major.
    pub fn short_name(&self) -> &'static str {
        match self {
            MatrixLayout::RowMajor => "t",
            MatrixLayout::ColumnMajor => "n",
        }
    }
}

/// Element type and layout of one matmul operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorDescription {
    pub element: DataType,
    #[serde(default)]
    pub layout: MatrixLayout,
}

impl TensorDescription {
    pub fn new(element: DataType, layout: MatrixLayout) -> Self {
        Self { element, layout }
    }

    pub fn row_major(element: DataType) -> Self {
        Self::new(element, MatrixLayout::RowMajor)
    }

    pub fn column_major(element: DataType) -> Self {
        Self::new(element, MatrixLayout::ColumnMajor)
    }

    /// Name fragment such as `f16t`.
    pub fn name(&self) -> String {
        format!("{}{}", self.element.element_type(), self.layout.short_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Conv2dLayout {
    #[default]
    NhwcHwcf,
    NchwFchw,
}

impl Conv2dLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conv2dLayout::NhwcHwcf => "nhwc_hwcf",
            Conv2dLayout::NchwFchw => "nchw_fchw",
        }
    }
}

/// Code generation pipeline requested through `translation_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationInfo {
    #[serde(rename = "LLVMGPUMatmulSimt")]
    LlvmGpuMatmulSimt,
    #[serde(rename = "LLVMGPUMatmulTensorCore")]
    LlvmGpuMatmulTensorCore,
    #[serde(rename = "LLVMGPUMatmulTensorCoreMmaSync")]
    LlvmGpuMatmulTensorCoreMmaSync,
}

impl TranslationInfo {
    pub fn pipeline_name(&self) -> &'static str {
        match self {
            TranslationInfo::LlvmGpuMatmulSimt => "LLVMGPUMatmulSimt",
            TranslationInfo::LlvmGpuMatmulTensorCore => "LLVMGPUMatmulTensorCore",
            TranslationInfo::LlvmGpuMatmulTensorCoreMmaSync => "LLVMGPUMatmulTensorCoreMmaSync",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            TranslationInfo::LlvmGpuMatmulSimt => "simt",
            TranslationInfo::LlvmGpuMatmulTensorCore => "tensorcore",
            TranslationInfo::LlvmGpuMatmulTensorCoreMmaSync => "tensorcore_mmasync",
        }
    }
}

/// Threadblock tile, pipeline depth and launch shape for one custom
/// lowering configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileDescription {
    pub threadblock: [usize; 3],
    pub stages: usize,
    pub workgroup_size: [usize; 3],
    pub translation: TranslationInfo,
}

impl TileDescription {
    pub fn new(
        threadblock: [usize; 3],
        stages: usize,
        workgroup_size: [usize; 3],
        translation: TranslationInfo,
    ) -> Self {
        Self {
            threadblock,
            stages,
            workgroup_size,
            translation,
        }
    }

    /// `128x128_32x5_wg64x2x1_tensorcore_mmasync`: tile m x n, tile k x
    /// stages, workgroup size, pipeline.
    pub fn name(&self) -> String {
        let [m, n, k] = self.threadblock;
        let [x, y, z] = self.workgroup_size;
        format!(
            "{}x{}_{}x{}_wg{}x{}x{}_{}",
            m,
            n,
            k,
            self.stages,
            x,
            y,
            z,
            self.translation.short_name()
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.threadblock.contains(&0) {
            return Err("threadblock tile dimensions must be > 0".into());
        }
        if self.workgroup_size.contains(&0) {
            return Err("workgroup size dimensions must be > 0".into());
        }
        if self.stages == 0 {
            return Err("pipeline stages must be > 0".into());
        }
        Ok(())
    }
}

/// Either leave tiling to the compiler or pin a specific tile description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TilingConfig {
    #[default]
    Default,
    Custom(TileDescription),
}

impl TilingConfig {
    pub fn custom(&self) -> Option<&TileDescription> {
        match self {
            TilingConfig::Default => None,
            TilingConfig::Custom(tile) => Some(tile),
        }
    }

    /// Name segment appended to the dispatch name; empty for compiler defaults.
    pub fn name_suffix(&self) -> String {
        match self {
            TilingConfig::Default => String::new(),
            TilingConfig::Custom(tile) => format!("_tile_{}", tile.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_description_name_matches_profiler_convention() {
        let tile = TileDescription::new(
            [128, 128, 32],
            5,
            [64, 2, 1],
            TranslationInfo::LlvmGpuMatmulTensorCoreMmaSync,
        );
        assert_eq!(tile.name(), "128x128_32x5_wg64x2x1_tensorcore_mmasync");
        assert_eq!(
            TilingConfig::Custom(tile).name_suffix(),
            "_tile_128x128_32x5_wg64x2x1_tensorcore_mmasync"
        );
        assert_eq!(TilingConfig::Default.name_suffix(), "");
    }

    #[test]
    fn zero_literals_follow_element_kind() {
        assert_eq!(DataType::F16.zero_literal(), "0.0");
        assert_eq!(DataType::I32.zero_literal(), "0");
    }

    #[test]
    fn invalid_tiles_are_rejected() {
        let mut tile = TileDescription::new(
            [64, 64, 32],
            3,
            [64, 2, 1],
            TranslationInfo::LlvmGpuMatmulTensorCore,
        );
        assert!(tile.validate().is_ok());
        tile.stages = 0;
        assert!(tile.validate().is_err());
    }

    #[test]
    fn translation_info_serializes_with_pipeline_name() {
        let json = serde_json::to_string(&TranslationInfo::LlvmGpuMatmulSimt).unwrap();
        assert_eq!(json, "\"LLVMGPUMatmulSimt\"");
    }
}
