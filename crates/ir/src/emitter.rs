//! Emitter trait and the registry that maps dialects to emitters.

use crate::dialect::MlirDialect;
use crate::flow::FlowEmitter;
use crate::linalg::LinalgEmitter;
use dispatchgen_library::{DispatchDescriptor, DispatchError, OperationKind, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Renders one dispatch as MLIR text in a single dialect.
///
/// Implementations hold no mutable state; the same descriptor always yields
/// the same bytes.
pub trait DialectEmitter: Send + Sync {
    fn dialect(&self) -> MlirDialect;
    fn supports(&self, kind: OperationKind) -> bool;
    fn render(&self, descriptor: &DispatchDescriptor) -> Result<String>;
}

pub type DynDialectEmitter = Arc<dyn DialectEmitter>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedDispatch {
    pub name: String,
    pub file_name: String,
    pub kind: OperationKind,
    pub dialect: MlirDialect,
    #[serde(skip)]
    pub text: String,
}

/// Checks kind support before rendering so no partial IR escapes.
pub fn emit_dispatch(
    emitter: &dyn DialectEmitter,
    descriptor: &DispatchDescriptor,
) -> Result<EmittedDispatch> {
    let dialect = emitter.dialect();
    if !emitter.supports(descriptor.kind()) {
        return Err(DispatchError::UnsupportedOperation {
            dialect: dialect.to_string(),
            dispatch: descriptor.name().to_string(),
            reason: format!("{} operations are not supported", descriptor.kind()),
        });
    }
    let text = emitter.render(descriptor)?;
    debug!(
        dispatch = descriptor.name(),
        dialect = %dialect,
        bytes = text.len(),
        "rendered dispatch"
    );
    Ok(EmittedDispatch {
        name: descriptor.name().to_string(),
        file_name: descriptor.file_name(),
        kind: descriptor.kind(),
        dialect,
        text,
    })
}

#[derive(Default, Clone)]
pub struct EmitterRegistry {
    emitters: Vec<DynDialectEmitter>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self {
            emitters: Vec::new(),
        }
    }

    pub fn with_default_emitters() -> Self {
        let mut registry = Self::new();
        registry.register(LinalgEmitter::new());
        registry.register(FlowEmitter::new());
        registry
    }

    /// Registers `emitter`, replacing any emitter for the same dialect.
    pub fn register<E>(&mut self, emitter: E)
    where
        E: DialectEmitter + 'static,
    {
        let dialect = emitter.dialect();
        self.emitters.retain(|existing| existing.dialect() != dialect);
        self.emitters.push(Arc::new(emitter));
    }

    pub fn find(&self, dialect: MlirDialect) -> Option<DynDialectEmitter> {
        self.emitters
            .iter()
            .find(|emitter| emitter.dialect() == dialect)
            .map(Arc::clone)
    }

    pub fn resolve(&self, dialect: MlirDialect) -> Result<DynDialectEmitter> {
        self.find(dialect)
            .ok_or_else(|| DispatchError::UnsupportedDialect(dialect.to_string()))
    }

    pub fn dialects(&self) -> Vec<MlirDialect> {
        self.emitters.iter().map(|emitter| emitter.dialect()).collect()
    }
}
