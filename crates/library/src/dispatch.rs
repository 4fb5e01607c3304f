//! Dispatch descriptors: one operation kind paired with one configuration.

use crate::operation::{OperationKind, TuningConfiguration};
use serde::Serialize;

/// A concrete (operation, tuning configuration) pair to compile and profile.
///
/// The name is derived once at construction from the configuration alone,
/// so equal configurations always produce equal names and distinct
/// configurations never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DispatchDescriptor {
    name: String,
    configuration: TuningConfiguration,
}

impl DispatchDescriptor {
    pub fn new(configuration: TuningConfiguration) -> Self {
        Self {
            name: configuration.name(),
            configuration,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.configuration.kind()
    }

    pub fn configuration(&self) -> &TuningConfiguration {
        &self.configuration
    }

    /// Output file name for the emitted source, e.g. `matmul_128x128x32.mlir`.
    pub fn file_name(&self) -> String {
        format!("{}.mlir", self.name)
    }
}

impl From<TuningConfiguration> for DispatchDescriptor {
    fn from(configuration: TuningConfiguration) -> Self {
        Self::new(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataType;
    use crate::operation::{Conv2dConfiguration, MatmulConfiguration};

    #[test]
    fn descriptor_exposes_kind_and_file_name() {
        let descriptor =
            DispatchDescriptor::new(MatmulConfiguration::new(128, 128, 32, DataType::F32).into());
        assert_eq!(descriptor.kind(), OperationKind::Matmul);
        assert_eq!(descriptor.name(), "matmul_128x128x32");
        assert_eq!(descriptor.file_name(), "matmul_128x128x32.mlir");
    }

    #[test]
    fn naming_is_a_pure_function_of_configuration() {
        let config: TuningConfiguration =
            Conv2dConfiguration::new(1, 56, 56, 64, 64, 3, 3, DataType::F16).into();
        let first = DispatchDescriptor::new(config);
        let second = DispatchDescriptor::new(config);
        assert_eq!(first, second);
        assert_eq!(first.kind(), OperationKind::Conv2d);
    }
}
