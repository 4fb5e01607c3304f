//! Emits dispatches with the computation outlined into a
//! `flow.dispatch.region`.

use crate::builder::DispatchBody;
use crate::dialect::MlirDialect;
use crate::emitter::DialectEmitter;
use dispatchgen_library::{DispatchDescriptor, OperationKind, Result};
use std::fmt::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct FlowEmitter;

impl FlowEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl DialectEmitter for FlowEmitter {
    fn dialect(&self) -> MlirDialect {
        MlirDialect::Flow
    }

    fn supports(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Matmul | OperationKind::Conv2d => true,
        }
    }

    fn render(&self, descriptor: &DispatchDescriptor) -> Result<String> {
        let body = DispatchBody::build(descriptor, self.dialect())?;
        let result_ty = &body.result_type;

        let mut text = String::new();
        let _ = writeln!(
            text,
            "// {} dispatch `{}` at the flow entry point",
            descriptor.kind(),
            descriptor.name()
        );
        body.write_attribute_aliases(&mut text);
        let _ = writeln!(text, "{}", body.function_header());
        let _ = writeln!(
            text,
            "  %result = flow.dispatch.region -> ({}) {{",
            result_ty
        );
        body.write_ops(&mut text, "    ", "0");
        let _ = writeln!(text, "    flow.return %0 : {}", result_ty);
        text.push_str("  }\n");
        let _ = writeln!(text, "  return %result : {}", result_ty);
        text.push_str("}\n");
        Ok(text)
    }
}
