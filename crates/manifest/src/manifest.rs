//! The dispatch manifest: owns every descriptor and drives emission.

use crate::config::{ManifestConfig, GENERATED_DIR};
use crate::filter::DispatchFilter;
use crate::report::{EmitReport, EmittedFile};
use dispatchgen_ir::{emit_dispatch, DynDialectEmitter, EmittedDispatch, EmitterRegistry, MlirDialect};
use dispatchgen_library::{
    ConfigurationCatalog, DispatchDescriptor, DispatchError, OperationKind, Result,
};
use std::collections::HashSet;
use std::fs;
use tracing::{debug, info, warn};

pub struct Manifest {
    config: ManifestConfig,
    registry: EmitterRegistry,
    dispatches: Vec<DispatchDescriptor>,
    loaded: bool,
    filter: DispatchFilter,
}

impl Manifest {
    pub fn new(config: ManifestConfig) -> Self {
        Self::with_registry(config, EmitterRegistry::with_default_emitters())
    }

    pub fn with_registry(config: ManifestConfig, registry: EmitterRegistry) -> Self {
        Self {
            config,
            registry,
            dispatches: Vec::new(),
            loaded: false,
            filter: DispatchFilter::default(),
        }
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Every loaded descriptor, in catalog order.
    pub fn dispatches(&self) -> &[DispatchDescriptor] {
        &self.dispatches
    }

    /// Populates the manifest from `catalog`. A second call fails with
    /// [`DispatchError::Reinitialization`] and leaves the manifest untouched.
    pub fn load(&mut self, catalog: &ConfigurationCatalog) -> Result<usize> {
        if self.loaded {
            return Err(DispatchError::Reinitialization);
        }

        let mut names = HashSet::new();
        let mut dispatches = Vec::with_capacity(catalog.len());
        for kind in OperationKind::ALL {
            for configuration in catalog.configurations(kind) {
                let descriptor = DispatchDescriptor::new(configuration);
                if !names.insert(descriptor.name().to_string()) {
                    return Err(DispatchError::invalid_argument(format!(
                        "dispatch name `{}` is produced by more than one configuration",
                        descriptor.name()
                    )));
                }
                dispatches.push(descriptor);
            }
            debug!(kind = %kind, count = catalog.len_of(kind), "loaded dispatches");
        }

        self.dispatches = dispatches;
        self.loaded = true;
        info!(dispatches = self.dispatches.len(), "manifest loaded");
        Ok(self.dispatches.len())
    }

    /// Restricts emission to `operation_kind` (`matmul`, `conv2d` or `all`)
    /// and the comma-delimited `dispatch_names`. Replaces any earlier filter.
    pub fn filter(&mut self, operation_kind: &str, dispatch_names: &str) -> Result<()> {
        self.filter = DispatchFilter::parse(operation_kind, dispatch_names)?;
        debug!(
            operation_kind,
            names = self.filter.names().map_or(0, |names| names.len()),
            "manifest filter updated"
        );
        Ok(())
    }

    pub fn active_filter(&self) -> &DispatchFilter {
        &self.filter
    }

    /// Descriptors surviving the active filter, in stored order.
    pub fn selected(&self) -> Vec<&DispatchDescriptor> {
        self.dispatches
            .iter()
            .filter(|descriptor| self.filter.matches(descriptor))
            .collect()
    }

    fn resolve_emitters(&self, dialects: &[MlirDialect]) -> Result<Vec<DynDialectEmitter>> {
        let mut seen = HashSet::new();
        dialects
            .iter()
            .filter(|dialect| seen.insert(**dialect))
            .map(|dialect| self.registry.resolve(*dialect))
            .collect()
    }

    /// Renders every selected dispatch without touching the filesystem.
    pub fn render(&self, dialect: MlirDialect) -> Result<Vec<EmittedDispatch>> {
        self.render_all(&[dialect])
    }

    pub fn render_all(&self, dialects: &[MlirDialect]) -> Result<Vec<EmittedDispatch>> {
        let emitters = self.resolve_emitters(dialects)?;
        let selected = self.selected();
        let mut emitted = Vec::with_capacity(emitters.len() * selected.len());
        for emitter in &emitters {
            for descriptor in &selected {
                emitted.push(emit_dispatch(emitter.as_ref(), descriptor)?);
            }
        }
        Ok(emitted)
    }

    pub fn emit(&self, dialect: MlirDialect) -> Result<EmitReport> {
        self.emit_all(&[dialect])
    }

    /// Renders first and writes afterwards, so a setup or rendering error
    /// leaves the build directory untouched.
    pub fn emit_all(&self, dialects: &[MlirDialect]) -> Result<EmitReport> {
        let rendered = self.render_all(dialects)?;
        let mut report = EmitReport {
            device: self.config.device.clone(),
            dispatches: Vec::with_capacity(rendered.len()),
        };

        if rendered.is_empty() {
            warn!(
                loaded = self.dispatches.len(),
                "no dispatches matched the active filter; nothing emitted"
            );
            return Ok(report);
        }

        for dispatch in &rendered {
            let relative_dir = format!(
                "{}/{}/{}",
                GENERATED_DIR,
                dispatch.dialect.as_str(),
                dispatch.kind.as_str()
            );
            let file = EmittedFile::new(dispatch, &relative_dir);
            let path = file.absolute_path(self.config.build_dir());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &dispatch.text)?;
            debug!(dispatch = %dispatch.name, path = %path.display(), "wrote dispatch");
            report.dispatches.push(file);
        }

        report.save(&self.config.index_path())?;
        info!(
            emitted = report.len(),
            build_dir = %self.config.build_dir().display(),
            "emitted dispatches"
        );
        Ok(report)
    }
}
