//! Live-database introspection: catalog snapshot and resolved entity model.

pub mod loader;
pub mod resolved;
pub mod types;

pub use loader::*;
pub use resolved::*;
pub use types::*;
