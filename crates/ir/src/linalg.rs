//! Emits dispatches as plain `func.func` + named linalg ops.

use crate::builder::DispatchBody;
use crate::dialect::MlirDialect;
use crate::emitter::DialectEmitter;
use dispatchgen_library::{DispatchDescriptor, OperationKind, Result};
use std::fmt::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct LinalgEmitter;

impl LinalgEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl DialectEmitter for LinalgEmitter {
    fn dialect(&self) -> MlirDialect {
        MlirDialect::Linalg
    }

    fn supports(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Matmul | OperationKind::Conv2d => true,
        }
    }

    fn render(&self, descriptor: &DispatchDescriptor) -> Result<String> {
        let body = DispatchBody::build(descriptor, self.dialect())?;

        let mut text = String::new();
        let _ = writeln!(
            text,
            "// {} dispatch `{}` at the linalg entry point",
            descriptor.kind(),
            descriptor.name()
        );
        body.write_attribute_aliases(&mut text);
        let _ = writeln!(text, "{}", body.function_header());
        body.write_ops(&mut text, "  ", "result");
        let _ = writeln!(text, "  return %result : {}", body.result_type);
        text.push_str("}\n");
        Ok(text)
    }
}
