pub mod common;
pub mod graphql;

pub use common::*;
pub use graphql::*;
