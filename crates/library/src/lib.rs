//! Operation catalog, tuning configurations and dispatch descriptors.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod operation;

pub use catalog::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use operation::*;
