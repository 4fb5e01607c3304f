//! Dispatch manifest: loads the catalog, filters dispatches and emits MLIR.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod filter;
pub mod manifest;
pub mod report;

#[cfg(feature = "cli")]
pub use cli::*;
pub use config::*;
pub use filter::*;
pub use manifest::*;
pub use report::*;
