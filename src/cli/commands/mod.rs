//! CLI command implementations.

pub mod convert;
pub mod locate;
pub mod tools;
