//! Operation kinds and the tuning configurations that parameterize them.

use crate::config::{Conv2dLayout, DataType, TensorDescription, TilingConfig};
use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Matmul,
    Conv2d,
}

impl OperationKind {
    /// Every kind, in manifest order.
    pub const ALL: [OperationKind; 2] = [OperationKind::Matmul, OperationKind::Conv2d];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Matmul => "matmul",
            OperationKind::Conv2d => "conv2d",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = DispatchError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "matmul" => Ok(OperationKind::Matmul),
            "conv2d" => Ok(OperationKind::Conv2d),
            other => Err(DispatchError::invalid_argument(format!(
                "unknown operation kind `{other}` (expected matmul or conv2d)"
            ))),
        }
    }
}

/// `C[M, N] = A[M, K] * B[K, N]` with per-operand element type and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatmulConfiguration {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub lhs: TensorDescription,
    pub rhs: TensorDescription,
    pub result: TensorDescription,
    #[serde(default)]
    pub tiling: TilingConfig,
}

impl MatmulConfiguration {
    /// Row-major matmul with the same element type on every operand.
    pub fn new(m: usize, n: usize, k: usize, dtype: DataType) -> Self {
        Self {
            m,
            n,
            k,
            lhs: TensorDescription::row_major(dtype),
            rhs: TensorDescription::row_major(dtype),
            result: TensorDescription::row_major(dtype),
            tiling: TilingConfig::Default,
        }
    }

    pub fn with_operands(
        mut self,
        lhs: TensorDescription,
        rhs: TensorDescription,
        result: TensorDescription,
    ) -> Self {
        self.lhs = lhs;
        self.rhs = rhs;
        self.result = result;
        self
    }

    pub fn with_tiling(mut self, tiling: TilingConfig) -> Self {
        self.tiling = tiling;
        self
    }

    fn has_default_operands(&self) -> bool {
        [self.lhs, self.rhs, self.result]
            .iter()
            .all(|operand| *operand == TensorDescription::row_major(DataType::F32))
    }

    pub fn name(&self) -> String {
        let mut name = format!("matmul_{}x{}x{}", self.m, self.n, self.k);
        if !self.has_default_operands() {
            name.push_str(&format!(
                "_{}_{}_{}",
                self.lhs.name(),
                self.rhs.name(),
                self.result.name()
            ));
        }
        name.push_str(&self.tiling.name_suffix());
        name
    }

    pub fn validate(&self) -> Result<()> {
        if self.m == 0 || self.n == 0 || self.k == 0 {
            return Err(DispatchError::invalid_argument(format!(
                "matmul dimensions must be > 0, got {}x{}x{}",
                self.m, self.n, self.k
            )));
        }
        if let Some(tile) = self.tiling.custom() {
            tile.validate().map_err(DispatchError::InvalidArgument)?;
        }
        Ok(())
    }
}

fn unit_window() -> [usize; 2] {
    [1, 1]
}

/// Unpadded 2-D convolution over a batch of images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conv2dConfiguration {
    pub batch: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub filters: usize,
    pub filter_height: usize,
    pub filter_width: usize,
    #[serde(default = "unit_window")]
    pub strides: [usize; 2],
    #[serde(default = "unit_window")]
    pub dilations: [usize; 2],
    pub input: DataType,
    pub filter: DataType,
    pub result: DataType,
    #[serde(default)]
    pub layout: Conv2dLayout,
    #[serde(default)]
    pub tiling: TilingConfig,
}

impl Conv2dConfiguration {
    /// NHWC x HWCF convolution with unit strides and dilations.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        filters: usize,
        filter_height: usize,
        filter_width: usize,
        dtype: DataType,
    ) -> Self {
        Self {
            batch,
            height,
            width,
            channels,
            filters,
            filter_height,
            filter_width,
            strides: unit_window(),
            dilations: unit_window(),
            input: dtype,
            filter: dtype,
            result: dtype,
            layout: Conv2dLayout::NhwcHwcf,
            tiling: TilingConfig::Default,
        }
    }

    pub fn with_strides(mut self, strides: [usize; 2]) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_dilations(mut self, dilations: [usize; 2]) -> Self {
        self.dilations = dilations;
        self
    }

    pub fn with_element_types(mut self, input: DataType, filter: DataType, result: DataType) -> Self {
        self.input = input;
        self.filter = filter;
        self.result = result;
        self
    }

    pub fn with_layout(mut self, layout: Conv2dLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_tiling(mut self, tiling: TilingConfig) -> Self {
        self.tiling = tiling;
        self
    }

    fn output_extent(input: usize, window: usize, stride: usize, dilation: usize) -> Option<usize> {
        let span = dilation.checked_mul(window.checked_sub(1)?)?.checked_add(1)?;
        let remaining = input.checked_sub(span)?;
        Some(remaining.checked_div(stride)? + 1)
    }

    /// Output `(height, width)`; `None` when the dilated filter does not fit
    /// or a stride is zero.
    pub fn output_size(&self) -> Option<(usize, usize)> {
        let p = Self::output_extent(
            self.height,
            self.filter_height,
            self.strides[0],
            self.dilations[0],
        )?;
        let q = Self::output_extent(
            self.width,
            self.filter_width,
            self.strides[1],
            self.dilations[1],
        )?;
        Some((p, q))
    }

    pub fn input_shape(&self) -> [usize; 4] {
        match self.layout {
            Conv2dLayout::NhwcHwcf => [self.batch, self.height, self.width, self.channels],
            Conv2dLayout::NchwFchw => [self.batch, self.channels, self.height, self.width],
        }
    }

    pub fn filter_shape(&self) -> [usize; 4] {
        match self.layout {
            Conv2dLayout::NhwcHwcf => [
                self.filter_height,
                self.filter_width,
                self.channels,
                self.filters,
            ],
            Conv2dLayout::NchwFchw => [
                self.filters,
                self.channels,
                self.filter_height,
                self.filter_width,
            ],
        }
    }

    pub fn output_shape(&self) -> Option<[usize; 4]> {
        let (p, q) = self.output_size()?;
        Some(match self.layout {
            Conv2dLayout::NhwcHwcf => [self.batch, p, q, self.filters],
            Conv2dLayout::NchwFchw => [self.batch, self.filters, p, q],
        })
    }

    pub fn name(&self) -> String {
        let mut name = format!(
            "conv2d_{}x{}x{}x{}_{}x{}x{}",
            self.batch,
            self.height,
            self.width,
            self.channels,
            self.filter_height,
            self.filter_width,
            self.filters
        );
        if self.strides != unit_window() {
            name.push_str(&format!("_stride{}x{}", self.strides[0], self.strides[1]));
        }
        if self.dilations != unit_window() {
            name.push_str(&format!(
                "_dilation{}x{}",
                self.dilations[0], self.dilations[1]
            ));
        }
        if [self.input, self.filter, self.result] != [DataType::F32; 3] {
            name.push_str(&format!(
                "_{}_{}_{}",
                self.input.element_type(),
                self.filter.element_type(),
                self.result.element_type()
            ));
        }
        if self.layout != Conv2dLayout::NhwcHwcf {
            name.push('_');
            name.push_str(self.layout.as_str());
        }
        name.push_str(&self.tiling.name_suffix());
        name
    }

    pub fn validate(&self) -> Result<()> {
        let dims = [
            self.batch,
            self.height,
            self.width,
            self.channels,
            self.filters,
            self.filter_height,
            self.filter_width,
        ];
        if dims.contains(&0) {
            return Err(DispatchError::invalid_argument(format!(
                "conv2d dimensions must be > 0 in `{}`",
                self.name()
            )));
        }
        if self.strides.contains(&0) || self.dilations.contains(&0) {
            return Err(DispatchError::invalid_argument(format!(
                "conv2d strides and dilations must be > 0 in `{}`",
                self.name()
            )));
        }
        if self.output_size().is_none() {
            return Err(DispatchError::invalid_argument(format!(
                "conv2d filter does not fit the input in `{}`",
                self.name()
            )));
        }
        if let Some(tile) = self.tiling.custom() {
            tile.validate().map_err(DispatchError::InvalidArgument)?;
        }
        Ok(())
    }
}

/// One point in an operation kind's tuning space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TuningConfiguration {
    Matmul(MatmulConfiguration),
    Conv2d(Conv2dConfiguration),
}

impl TuningConfiguration {
    pub fn kind(&self) -> OperationKind {
        match self {
            TuningConfiguration::Matmul(_) => OperationKind::Matmul,
            TuningConfiguration::Conv2d(_) => OperationKind::Conv2d,
        }
    }

    pub fn name(&self) -> String {
        match self {
            TuningConfiguration::Matmul(config) => config.name(),
            TuningConfiguration::Conv2d(config) => config.name(),
        }
    }

    pub fn tiling(&self) -> &TilingConfig {
        match self {
            TuningConfiguration::Matmul(config) => &config.tiling,
            TuningConfiguration::Conv2d(config) => &config.tiling,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            TuningConfiguration::Matmul(config) => config.validate(),
            TuningConfiguration::Conv2d(config) => config.validate(),
        }
    }
}

impl From<MatmulConfiguration> for TuningConfiguration {
    fn from(config: MatmulConfiguration) -> Self {
        TuningConfiguration::Matmul(config)
    }
}

impl From<Conv2dConfiguration> for TuningConfiguration {
    fn from(config: Conv2dConfiguration) -> Self {
        TuningConfiguration::Conv2d(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TileDescription, TranslationInfo};

    #[test]
    fn default_matmul_name_is_shape_only() {
        let config = MatmulConfiguration::new(128, 128, 32, DataType::F32);
        assert_eq!(config.name(), "matmul_128x128x32");
    }

    #[test]
    fn matmul_name_spells_out_non_default_parameters() {
        let tile = TileDescription::new(
            [128, 256, 32],
            3,
            [128, 2, 1],
            TranslationInfo::LlvmGpuMatmulTensorCoreMmaSync,
        );
        let config = MatmulConfiguration::new(3456, 1024, 2048, DataType::F16)
            .with_tiling(TilingConfig::Custom(tile));
        assert_eq!(
            config.name(),
            "matmul_3456x1024x2048_f16t_f16t_f16t_tile_128x256_32x3_wg128x2x1_tensorcore_mmasync"
        );
    }

    #[test]
    fn transposed_operand_changes_name() {
        let row = MatmulConfiguration::new(64, 64, 64, DataType::F32);
        let col = row.with_operands(
            TensorDescription::row_major(DataType::F32),
            TensorDescription::column_major(DataType::F32),
            TensorDescription::row_major(DataType::F32),
        );
        assert_ne!(row.name(), col.name());
        assert_eq!(col.name(), "matmul_64x64x64_f32t_f32n_f32t");
    }

    #[test]
    fn conv_output_size_accounts_for_stride_and_dilation() {
        let conv = Conv2dConfiguration::new(1, 230, 230, 3, 64, 7, 7, DataType::F32)
            .with_strides([2, 2]);
        assert_eq!(conv.output_size(), Some((112, 112)));
        assert_eq!(conv.output_shape(), Some([1, 112, 112, 64]));

        let dilated = Conv2dConfiguration::new(1, 9, 9, 1, 1, 3, 3, DataType::F32)
            .with_dilations([4, 4]);
        assert_eq!(dilated.output_size(), Some((1, 1)));
        assert!(dilated.with_dilations([5, 5]).output_size().is_none());
        assert!(conv.with_strides([0, 2]).output_shape().is_none());
    }

    #[test]
    fn conv_name_segments() {
        let conv = Conv2dConfiguration::new(1, 230, 230, 3, 64, 7, 7, DataType::F32)
            .with_strides([2, 2]);
        assert_eq!(conv.name(), "conv2d_1x230x230x3_7x7x64_stride2x2");

        let nchw = conv
            .with_element_types(DataType::F16, DataType::F16, DataType::F32)
            .with_layout(Conv2dLayout::NchwFchw);
        assert_eq!(
            nchw.name(),
            "conv2d_1x230x230x3_7x7x64_stride2x2_f16_f16_f32_nchw_fchw"
        );
        assert_eq!(nchw.input_shape(), [1, 3, 230, 230]);
        assert_eq!(nchw.filter_shape(), [64, 3, 7, 7]);
    }

    #[test]
    fn oversized_filter_is_invalid() {
        let conv = Conv2dConfiguration::new(1, 4, 4, 1, 1, 5, 5, DataType::F32);
        assert!(matches!(
            conv.validate(),
            Err(DispatchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn kind_parsing_rejects_unknown_values() {
        assert_eq!("conv2d".parse::<OperationKind>().unwrap(), OperationKind::Conv2d);
        assert!(matches!(
            "softmax".parse::<OperationKind>(),
            Err(DispatchError::InvalidArgument(_))
        ));
    }
}
