//! MLIR emission for dispatchgen dispatches.

pub mod builder;
pub mod dialect;
pub mod emitter;
pub mod flow;
pub mod linalg;

pub use builder::*;
pub use dialect::*;
pub use emitter::*;
pub use flow::*;
pub use linalg::*;
