//! Catalog of pre-defined tuning configurations per operation kind.

use crate::config::{DataType, TileDescription, TilingConfig, TranslationInfo};
use crate::error::{DispatchError, Result};
use crate::operation::{
    Conv2dConfiguration, MatmulConfiguration, OperationKind, TuningConfiguration,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Immutable, ordered set of configurations for every operation kind.
///
/// Iteration order is insertion order, so repeated walks over the same
/// catalog always yield the same sequence. Deserialized catalogs go through
/// [`CatalogBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct ConfigurationCatalog {
    matmul: Vec<MatmulConfiguration>,
    conv2d: Vec<Conv2dConfiguration>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    matmul: Vec<MatmulConfiguration>,
    #[serde(default)]
    conv2d: Vec<Conv2dConfiguration>,
}

impl TryFrom<RawCatalog> for ConfigurationCatalog {
    type Error = DispatchError;

    fn try_from(raw: RawCatalog) -> Result<Self> {
        CatalogBuilder::new()
            .extend(raw.matmul.into_iter().map(TuningConfiguration::Matmul))
            .extend(raw.conv2d.into_iter().map(TuningConfiguration::Conv2d))
            .build()
    }
}

impl ConfigurationCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The built-in sweep: tensor-core matmuls in f16 and f32 plus a set of
    /// ResNet-style convolutions.
    pub fn predefined() -> Self {
        let mut builder = CatalogBuilder::new();
        for dtype in [DataType::F16, DataType::F32] {
            builder = builder.extend(tensor_core_matmuls(dtype));
        }
        for dtype in [DataType::F32, DataType::F16] {
            builder = builder.extend(resnet_convolutions(dtype));
        }
        // The predefined sweep is generated from valid shapes and tiles only.
        builder.catalog
    }

    pub fn configurations(&self, kind: OperationKind) -> Vec<TuningConfiguration> {
        match kind {
            OperationKind::Matmul => self.matmul.iter().copied().map(Into::into).collect(),
            OperationKind::Conv2d => self.conv2d.iter().copied().map(Into::into).collect(),
        }
    }

    /// All configurations, kinds in [`OperationKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = TuningConfiguration> + '_ {
        self.matmul
            .iter()
            .copied()
            .map(TuningConfiguration::from)
            .chain(self.conv2d.iter().copied().map(TuningConfiguration::from))
    }

    pub fn len_of(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::Matmul => self.matmul.len(),
            OperationKind::Conv2d => self.conv2d.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.matmul.len() + self.conv2d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a JSON catalog; validation failures surface as `InvalidArgument`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let raw: RawCatalog = serde_json::from_slice(&data)?;
        let catalog = ConfigurationCatalog::try_from(raw)?;
        debug!(
            path = %path.display(),
            matmul = catalog.matmul.len(),
            conv2d = catalog.conv2d.len(),
            "loaded configuration catalog"
        );
        Ok(catalog)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: ConfigurationCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_matmul(mut self, config: MatmulConfiguration) -> Self {
        self.catalog.matmul.push(config);
        self
    }

    pub fn add_conv2d(mut self, config: Conv2dConfiguration) -> Self {
        self.catalog.conv2d.push(config);
        self
    }

    pub fn add(self, config: TuningConfiguration) -> Self {
        match config {
            TuningConfiguration::Matmul(config) => self.add_matmul(config),
            TuningConfiguration::Conv2d(config) => self.add_conv2d(config),
        }
    }

    pub fn extend<I>(self, configs: I) -> Self
    where
        I: IntoIterator<Item = TuningConfiguration>,
    {
        configs.into_iter().fold(self, CatalogBuilder::add)
    }

    /// Validates every entry and rejects duplicates, including distinct
    /// configurations that would share a dispatch name.
    pub fn build(self) -> Result<ConfigurationCatalog> {
        let mut seen: HashMap<String, TuningConfiguration> = HashMap::new();
        for config in self.catalog.iter() {
            config.validate()?;
            let name = config.name();
            match seen.get(&name) {
                Some(previous) if *previous == config => {
                    return Err(DispatchError::invalid_argument(format!(
                        "duplicate configuration `{name}` in catalog"
                    )));
                }
                Some(_) => {
                    return Err(DispatchError::invalid_argument(format!(
                        "distinct configurations share the dispatch name `{name}`"
                    )));
                }
                None => {
                    seen.insert(name, config);
                }
            }
        }
        Ok(self.catalog)
    }
}

const MATMUL_SHAPES: [[usize; 3]; 5] = [
    [128, 128, 256],
    [256, 512, 128],
    [1024, 512, 2048],
    [2560, 2560, 2560],
    [3456, 1024, 2048],
];

fn tensor_core_tiles(dtype: DataType) -> Vec<TileDescription> {
    let mma_sync = TranslationInfo::LlvmGpuMatmulTensorCoreMmaSync;
    let tile = |threadblock, stages, workgroup| {
        TileDescription::new(threadblock, stages, workgroup, mma_sync)
    };
    match dtype {
        DataType::F16 => vec![
            tile([256, 128, 32], 3, [64, 4, 1]),
            tile([128, 256, 32], 3, [128, 2, 1]),
            tile([128, 128, 64], 4, [64, 2, 1]),
            tile([128, 128, 32], 5, [64, 2, 1]),
            tile([128, 64, 32], 5, [64, 2, 1]),
            tile([64, 64, 64], 5, [64, 2, 1]),
            tile([64, 64, 32], 10, [64, 2, 1]),
        ],
        DataType::F32 => vec![
            tile([128, 256, 16], 3, [128, 2, 1]),
            tile([256, 128, 16], 3, [64, 4, 1]),
            tile([128, 128, 16], 5, [64, 2, 1]),
            tile([128, 128, 32], 3, [64, 2, 1]),
            tile([128, 128, 32], 4, [64, 2, 1]),
            tile([64, 64, 64], 3, [64, 2, 1]),
        ],
        _ => Vec::new(),
    }
}

fn tile_divides(shape: [usize; 3], tile: &TileDescription) -> bool {
    shape
        .iter()
        .zip(tile.threadblock.iter())
        .all(|(dim, tile_dim)| dim % tile_dim == 0)
}

fn tensor_core_matmuls(dtype: DataType) -> Vec<TuningConfiguration> {
    let tiles = tensor_core_tiles(dtype);
    let mut configs: Vec<TuningConfiguration> = Vec::new();
    for shape in MATMUL_SHAPES {
        let [m, n, k] = shape;
        let base = MatmulConfiguration::new(m, n, k, dtype);
        configs.push(TuningConfiguration::Matmul(base));
        configs.extend(
            tiles
                .iter()
                .filter(|tile| tile_divides(shape, tile))
                .map(|tile| TuningConfiguration::Matmul(base.with_tiling(TilingConfig::Custom(*tile)))),
        );
    }
    configs
}

fn resnet_convolutions(dtype: DataType) -> Vec<TuningConfiguration> {
    [
        Conv2dConfiguration::new(1, 230, 230, 3, 64, 7, 7, dtype).with_strides([2, 2]),
        Conv2dConfiguration::new(1, 56, 56, 64, 256, 1, 1, dtype),
        Conv2dConfiguration::new(1, 58, 58, 64, 64, 3, 3, dtype),
        Conv2dConfiguration::new(1, 30, 30, 128, 128, 3, 3, dtype),
        Conv2dConfiguration::new(1, 16, 16, 256, 256, 3, 3, dtype),
    ]
    .into_iter()
    .map(TuningConfiguration::Conv2d)
    .collect()
}
